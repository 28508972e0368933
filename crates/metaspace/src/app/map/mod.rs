mod generator;

pub(crate) use generator::generate;

use std::collections::HashMap;

use engine::Vec2;
use thiserror::Error;

pub(crate) type TileId = u16;

pub(crate) const TILE_SIZE_PX: u32 = 32;

pub(crate) const TILE_EMPTY: TileId = 0;
pub(crate) const TILE_FLOOR_WOOD: TileId = 1;
pub(crate) const TILE_FLOOR_CARPET: TileId = 2;
pub(crate) const TILE_FLOOR_STONE: TileId = 3;
pub(crate) const TILE_FLOOR_RUG: TileId = 4;
pub(crate) const TILE_WALL: TileId = 10;
pub(crate) const TILE_WALL_WINDOW: TileId = 11;
pub(crate) const TILE_BOOKSHELF: TileId = 20;
pub(crate) const TILE_TABLE: TileId = 21;
pub(crate) const TILE_CHAIR: TileId = 22;
pub(crate) const TILE_DESK: TileId = 23;
pub(crate) const TILE_LAB_BENCH: TileId = 24;
pub(crate) const TILE_SOFA: TileId = 25;
pub(crate) const TILE_COUNTER: TileId = 26;
pub(crate) const TILE_PLANT: TileId = 40;
pub(crate) const TILE_LAMP: TileId = 41;
pub(crate) const TILE_BOOK_STACK: TileId = 42;
pub(crate) const TILE_COMPUTER: TileId = 43;
pub(crate) const TILE_DOOR: TileId = 60;
pub(crate) const TILE_TELEPORT_PAD: TileId = 61;

/// The full tile vocabulary. Layers may only reference ids listed here; the
/// properties table is derived from it once, not per map.
pub(crate) const ALL_TILE_IDS: [TileId; 19] = [
    TILE_FLOOR_WOOD,
    TILE_FLOOR_CARPET,
    TILE_FLOOR_STONE,
    TILE_FLOOR_RUG,
    TILE_WALL,
    TILE_WALL_WINDOW,
    TILE_BOOKSHELF,
    TILE_TABLE,
    TILE_CHAIR,
    TILE_DESK,
    TILE_LAB_BENCH,
    TILE_SOFA,
    TILE_COUNTER,
    TILE_PLANT,
    TILE_LAMP,
    TILE_BOOK_STACK,
    TILE_COMPUTER,
    TILE_DOOR,
    TILE_TELEPORT_PAD,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TileCategory {
    Floor,
    Wall,
    Furniture,
    Decoration,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TileProperties {
    pub(crate) has_collision: bool,
    pub(crate) is_interactive: bool,
    pub(crate) category: TileCategory,
}

fn category_of(tile_id: TileId) -> TileCategory {
    match tile_id {
        1..=9 => TileCategory::Floor,
        10..=19 => TileCategory::Wall,
        20..=39 => TileCategory::Furniture,
        40..=59 => TileCategory::Decoration,
        _ => TileCategory::Special,
    }
}

/// Fixed taxonomy: walls and furniture block, floors and decorations do
/// not, special tiles are walkable and interactive.
pub(crate) fn tile_properties() -> HashMap<TileId, TileProperties> {
    let mut table = HashMap::with_capacity(ALL_TILE_IDS.len());
    for tile_id in ALL_TILE_IDS {
        let category = category_of(tile_id);
        table.insert(
            tile_id,
            TileProperties {
                has_collision: matches!(category, TileCategory::Wall | TileCategory::Furniture),
                is_interactive: matches!(category, TileCategory::Special),
                category,
            },
        );
    }
    table
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum MapId {
    Library,
    Office,
    Lounge,
}

impl MapId {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            MapId::Library => "library",
            MapId::Office => "office",
            MapId::Lounge => "lounge",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw {
            "library" => Some(MapId::Library),
            "office" => Some(MapId::Office),
            "lounge" => Some(MapId::Lounge),
            _ => None,
        }
    }

    pub(crate) fn all() -> [MapId; 3] {
        [MapId::Library, MapId::Office, MapId::Lounge]
    }
}

/// Rectangle of whole tiles, used to bound area builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TileRect {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl TileRect {
    pub(crate) fn right(&self) -> u32 {
        self.x + self.width
    }

    pub(crate) fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub(crate) fn to_world(&self, tile_size: u32) -> WorldRect {
        WorldRect {
            x: (self.x * tile_size) as f32,
            y: (self.y * tile_size) as f32,
            width: (self.width * tile_size) as f32,
            height: (self.height * tile_size) as f32,
        }
    }
}

/// Axis-aligned rectangle in continuous world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WorldRect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl WorldRect {
    pub(crate) fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub(crate) fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ZoneKind {
    Door,
    Teleport,
    MeetingRoom,
    StudyArea,
    Trigger,
}

impl ZoneKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Door => "door",
            ZoneKind::Teleport => "teleport",
            ZoneKind::MeetingRoom => "meeting-room",
            ZoneKind::StudyArea => "study-area",
            ZoneKind::Trigger => "trigger",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ZoneTarget {
    pub(crate) map_id: String,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InteractiveZone {
    pub(crate) id: String,
    pub(crate) kind: ZoneKind,
    pub(crate) bounds: WorldRect,
    pub(crate) target: Option<ZoneTarget>,
    pub(crate) metadata: HashMap<String, String>,
}

impl InteractiveZone {
    pub(crate) fn new(id: impl Into<String>, kind: ZoneKind, bounds: WorldRect) -> Self {
        Self {
            id: id.into(),
            kind,
            bounds,
            target: None,
            metadata: HashMap::new(),
        }
    }

    pub(crate) fn with_target(mut self, target: ZoneTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub(crate) fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// One rectangular grid of tile ids; three of these make up a map.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapLayer {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
}

impl MapLayer {
    pub(crate) fn filled(width: u32, height: u32, fill: TileId) -> Self {
        Self {
            width,
            height,
            tiles: vec![fill; width as usize * height as usize],
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Option<TileId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Out-of-bounds writes are dropped.
    pub(crate) fn set(&mut self, x: u32, y: u32, tile_id: TileId) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.tiles[index] = tile_id;
    }

    pub(crate) fn fill_rect(&mut self, rect: TileRect, tile_id: TileId) {
        for y in rect.y..rect.bottom().min(self.height) {
            for x in rect.x..rect.right().min(self.width) {
                self.set(x, y, tile_id);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum MapError {
    #[error("layer '{layer}' is {actual_width}x{actual_height}, expected {width}x{height}")]
    LayerSizeMismatch {
        layer: &'static str,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("layer '{layer}' references unknown tile id {tile_id}")]
    UnknownTileId { layer: &'static str, tile_id: TileId },
    #[error("map has no spawn points")]
    NoSpawnPoints,
    #[error("teleport zone is missing a target")]
    MissingTeleportTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapModel {
    pub(crate) id: MapId,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) tile_size: u32,
    pub(crate) background: MapLayer,
    pub(crate) collision: MapLayer,
    pub(crate) decoration: MapLayer,
    pub(crate) tile_properties: HashMap<TileId, TileProperties>,
    pub(crate) spawn_points: Vec<Vec2>,
    pub(crate) zones: Vec<InteractiveZone>,
}

impl MapModel {
    pub(crate) fn validate(&self) -> Result<(), MapError> {
        for (name, layer) in [
            ("background", &self.background),
            ("collision", &self.collision),
            ("decoration", &self.decoration),
        ] {
            if layer.width() != self.width || layer.height() != self.height {
                return Err(MapError::LayerSizeMismatch {
                    layer: name,
                    width: self.width,
                    height: self.height,
                    actual_width: layer.width(),
                    actual_height: layer.height(),
                });
            }
            for tile_id in layer.tiles() {
                if *tile_id != TILE_EMPTY && !self.tile_properties.contains_key(tile_id) {
                    return Err(MapError::UnknownTileId {
                        layer: name,
                        tile_id: *tile_id,
                    });
                }
            }
        }
        if self.spawn_points.is_empty() {
            return Err(MapError::NoSpawnPoints);
        }
        for zone in &self.zones {
            if zone.kind == ZoneKind::Teleport && zone.target.is_none() {
                return Err(MapError::MissingTeleportTarget);
            }
        }
        Ok(())
    }

    /// Whether the collision layer blocks this cell. Cells outside the map
    /// block as well, so the perimeter is airtight even without walls.
    pub(crate) fn is_blocked(&self, tile_x: u32, tile_y: u32) -> bool {
        match self.collision.get(tile_x, tile_y) {
            Some(TILE_EMPTY) => false,
            Some(tile_id) => self
                .tile_properties
                .get(&tile_id)
                .map(|properties| properties.has_collision)
                .unwrap_or(true),
            None => true,
        }
    }

    pub(crate) fn width_px(&self) -> f32 {
        (self.width * self.tile_size) as f32
    }

    pub(crate) fn height_px(&self) -> f32 {
        (self.height * self.tile_size) as f32
    }
}

/// Center of a tile in world coordinates, for spawn points and teleport
/// targets.
pub(crate) fn tile_center(tile_x: u32, tile_y: u32) -> Vec2 {
    Vec2 {
        x: (tile_x as f32 + 0.5) * TILE_SIZE_PX as f32,
        y: (tile_y as f32 + 0.5) * TILE_SIZE_PX as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_covers_every_declared_tile() {
        let table = tile_properties();
        for tile_id in ALL_TILE_IDS {
            assert!(table.contains_key(&tile_id), "tile {tile_id}");
        }
    }

    #[test]
    fn walls_and_furniture_block_floors_and_decor_do_not() {
        let table = tile_properties();
        assert!(table[&TILE_WALL].has_collision);
        assert!(table[&TILE_BOOKSHELF].has_collision);
        assert!(!table[&TILE_FLOOR_WOOD].has_collision);
        assert!(!table[&TILE_PLANT].has_collision);
        assert!(!table[&TILE_TELEPORT_PAD].has_collision);
        assert!(table[&TILE_TELEPORT_PAD].is_interactive);
    }

    #[test]
    fn map_layer_set_ignores_out_of_bounds() {
        let mut layer = MapLayer::filled(2, 2, TILE_FLOOR_WOOD);
        layer.set(5, 5, TILE_WALL);
        assert_eq!(layer.get(5, 5), None);
        assert!(layer.tiles().iter().all(|tile| *tile == TILE_FLOOR_WOOD));
    }

    #[test]
    fn fill_rect_clamps_to_layer() {
        let mut layer = MapLayer::filled(3, 3, TILE_EMPTY);
        layer.fill_rect(
            TileRect {
                x: 1,
                y: 1,
                width: 10,
                height: 10,
            },
            TILE_WALL,
        );
        assert_eq!(layer.get(0, 0), Some(TILE_EMPTY));
        assert_eq!(layer.get(1, 1), Some(TILE_WALL));
        assert_eq!(layer.get(2, 2), Some(TILE_WALL));
    }

    #[test]
    fn world_rect_containment_is_half_open() {
        let rect = WorldRect {
            x: 10.0,
            y: 10.0,
            width: 20.0,
            height: 20.0,
        };
        assert!(rect.contains(Vec2 { x: 10.0, y: 10.0 }));
        assert!(rect.contains(Vec2 { x: 29.9, y: 29.9 }));
        assert!(!rect.contains(Vec2 { x: 30.0, y: 15.0 }));
        assert!(!rect.contains(Vec2 { x: 9.9, y: 15.0 }));
        assert_eq!(rect.center(), Vec2 { x: 20.0, y: 20.0 });
    }

    #[test]
    fn validate_rejects_layer_size_mismatch() {
        let mut map = generate(MapId::Lounge);
        map.collision = MapLayer::filled(map.width + 1, map.height, TILE_EMPTY);
        assert!(matches!(
            map.validate(),
            Err(MapError::LayerSizeMismatch { layer: "collision", .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_tile_id() {
        let mut map = generate(MapId::Lounge);
        map.decoration.set(2, 2, 999);
        assert!(matches!(
            map.validate(),
            Err(MapError::UnknownTileId {
                layer: "decoration",
                tile_id: 999
            })
        ));
    }

    #[test]
    fn validate_rejects_teleport_without_target() {
        let mut map = generate(MapId::Lounge);
        map.zones.push(InteractiveZone::new(
            "broken",
            ZoneKind::Teleport,
            WorldRect {
                x: 0.0,
                y: 0.0,
                width: 32.0,
                height: 32.0,
            },
        ));
        assert_eq!(map.validate(), Err(MapError::MissingTeleportTarget));
    }

    #[test]
    fn out_of_bounds_cells_block() {
        let map = generate(MapId::Library);
        assert!(map.is_blocked(map.width, 0));
        assert!(map.is_blocked(0, map.height));
    }
}
