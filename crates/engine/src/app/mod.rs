mod assets;
mod input;
mod loop_runner;
mod manager;
mod metrics;
mod rendering;
mod scene;

pub use assets::{
    validate_sprite_key, AssetRegistry, RgbaSprite, SpriteDataError, SpriteKeyError,
};
pub use input::{resolve_direction, InputAction, MovementInput};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use manager::{
    GameManager, InitError, ManagerState, NoopSurface, ReadinessPoll, SceneFactory,
    SceneStartError, SurfaceEvents,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{screen_to_world_px, world_to_screen_px, Renderer, Viewport};
pub use scene::{
    Avatar, AvatarId, Camera2D, Direction, InputSnapshot, Scene, SceneCommand, SceneId,
    SceneTransfer, SceneWorld, TileGrid, TileGridError, TileLayer, TileLayerKind, Vec2,
};
