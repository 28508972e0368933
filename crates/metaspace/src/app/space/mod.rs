use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Instant;

use engine::{
    resolve_direction, AssetRegistry, AvatarId, Direction, GameManager, InputSnapshot,
    MovementInput, RgbaSprite, Scene, SceneCommand, SceneId, SceneTransfer, SceneWorld, TileGrid,
    TileGridError, TileLayer, TileLayerKind, Vec2,
};
use tracing::{debug, info, warn};

use super::map::{
    self, MapId, MapModel, TileId, ZoneKind, TILE_BOOKSHELF, TILE_BOOK_STACK, TILE_CHAIR,
    TILE_COMPUTER, TILE_COUNTER, TILE_DESK, TILE_DOOR, TILE_FLOOR_CARPET, TILE_FLOOR_RUG,
    TILE_FLOOR_STONE, TILE_FLOOR_WOOD, TILE_LAB_BENCH, TILE_LAMP, TILE_PLANT, TILE_SOFA,
    TILE_TABLE, TILE_TELEPORT_PAD, TILE_WALL, TILE_WALL_WINDOW,
};
use super::net::{NetConfig, NetworkClient, RemoteEvent, TransportFactory};
use super::player::{
    AnimationAction, AnimationKey, PlayerEntity, PlayerState, PlayerStatus, AVATAR_VARIANTS,
};
use super::zones;

const LOCAL_AVATAR: AvatarId = AvatarId(0);
const PLAYER_SPEED_PX_PER_SECOND: f32 = 160.0;
const PLAYER_COLLIDER_HALF_PX: f32 = 10.0;
const ANIMATION_RETRY_DELAY_SECONDS: f32 = 0.25;
const AVATAR_SPRITE_WIDTH: u32 = 24;
const AVATAR_SPRITE_HEIGHT: u32 = 30;

include!("types.rs");
include!("sprites.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn register_scenes(
    manager: &mut GameManager,
    identity: &LocalIdentity,
    transport: &Rc<dyn TransportFactory>,
    net_config: &NetConfig,
) {
    for config in scene_configs() {
        let identity = identity.clone();
        let transport = Rc::clone(transport);
        let net_config = net_config.clone();
        manager.register_scene(
            SceneId::new(config.map_id.as_str()),
            Box::new(move || -> Box<dyn Scene> {
                Box::new(SpaceScene::new(
                    config,
                    identity.clone(),
                    Rc::clone(&transport),
                    net_config.clone(),
                ))
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
