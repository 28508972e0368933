pub mod app;

pub use app::{
    resolve_direction, run_app, run_app_with_metrics, screen_to_world_px, validate_sprite_key,
    world_to_screen_px, AppError, AssetRegistry, Avatar, AvatarId, Camera2D, Direction,
    GameManager, InitError, InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot,
    ManagerState, MetricsHandle, MovementInput, NoopSurface, ReadinessPoll, Renderer, RgbaSprite,
    Scene, SceneCommand, SceneFactory, SceneId, SceneStartError, SceneTransfer, SceneWorld,
    SpriteDataError, SpriteKeyError, SurfaceEvents, TileGrid, TileGridError, TileLayer,
    TileLayerKind, Vec2, Viewport,
};
