use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::assets::AssetRegistry;
use super::input::ActionStates;
use crate::app::InputAction;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Cardinal facing. World coordinates are screen-style: +x right, +y down,
/// so `Up` corresponds to negative y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data handed to the next scene on a switch. A teleport carries its target
/// coordinates here; an empty transfer means "use the map's default spawn".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneTransfer {
    pub spawn_override: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    None,
    SwitchTo {
        scene: SceneId,
        transfer: SceneTransfer,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLayerKind {
    Background,
    Collision,
    Decoration,
}

/// Rectangular grid of tile-type ids. Cell (0,0) is the top-left corner of
/// the world; the world position of a cell's top-left corner is
/// `(x * tile_size_px, y * tile_size_px)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size_px: u32,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be non-zero")]
    ZeroTileSize,
}

impl TileGrid {
    pub fn new(
        width: u32,
        height: u32,
        tile_size_px: u32,
        tiles: Vec<u16>,
    ) -> Result<Self, TileGridError> {
        if tile_size_px == 0 {
            return Err(TileGridError::ZeroTileSize);
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TileGridError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size_px,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size_px(&self) -> u32 {
        self.tile_size_px
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn tile_center_world(&self, x: u32, y: u32) -> Option<Vec2> {
        self.index_of(x, y)?;
        let half = self.tile_size_px as f32 * 0.5;
        Some(Vec2 {
            x: x as f32 * self.tile_size_px as f32 + half,
            y: y as f32 * self.tile_size_px as f32 + half,
        })
    }

    pub fn world_to_tile(&self, world: Vec2) -> Option<(u32, u32)> {
        let tile_x = (world.x / self.tile_size_px as f32).floor() as i64;
        let tile_y = (world.y / self.tile_size_px as f32).floor() as i64;
        if tile_x < 0 || tile_y < 0 || tile_x >= self.width as i64 || tile_y >= self.height as i64 {
            return None;
        }
        Some((tile_x as u32, tile_y as u32))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub kind: TileLayerKind,
    pub grid: TileGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AvatarId(pub u64);

/// Renderable participant visual. The simulation owns authoritative state;
/// avatars only carry what the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub id: AvatarId,
    pub position: Vec2,
    pub sprite_key: String,
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    camera: Camera2D,
    layers: Vec<TileLayer>,
    avatars: Vec<Avatar>,
    assets: AssetRegistry,
}

impl SceneWorld {
    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn set_layers(&mut self, layers: Vec<TileLayer>) {
        self.layers = layers;
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, kind: TileLayerKind) -> Option<&TileGrid> {
        self.layers
            .iter()
            .find(|layer| layer.kind == kind)
            .map(|layer| &layer.grid)
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }

    pub fn upsert_avatar(&mut self, id: AvatarId, position: Vec2, sprite_key: String) {
        match self.avatars.iter_mut().find(|avatar| avatar.id == id) {
            Some(avatar) => {
                avatar.position = position;
                avatar.sprite_key = sprite_key;
            }
            None => self.avatars.push(Avatar {
                id,
                position,
                sprite_key,
            }),
        }
    }

    pub fn remove_avatar(&mut self, id: AvatarId) -> bool {
        let before = self.avatars.len();
        self.avatars.retain(|avatar| avatar.id != id);
        self.avatars.len() != before
    }

    pub fn find_avatar(&self, id: AvatarId) -> Option<&Avatar> {
        self.avatars.iter().find(|avatar| avatar.id == id)
    }

    pub fn avatars(&self) -> &[Avatar] {
        &self.avatars
    }

    pub fn avatar_count(&self) -> usize {
        self.avatars.len()
    }

    pub fn clear(&mut self) {
        self.camera = Camera2D::default();
        self.layers.clear();
        self.avatars.clear();
        self.assets.clear();
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld, transfer: &SceneTransfer);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}
