use engine::Vec2;
use tracing::debug;

use super::{
    category_of, tile_center, tile_properties, InteractiveZone, MapId, MapLayer, MapModel,
    TileCategory, TileId, TileRect, ZoneKind, ZoneTarget, TILE_BOOKSHELF, TILE_BOOK_STACK, TILE_CHAIR,
    TILE_COMPUTER, TILE_COUNTER, TILE_DESK, TILE_DOOR, TILE_EMPTY, TILE_FLOOR_CARPET,
    TILE_FLOOR_RUG, TILE_FLOOR_STONE, TILE_FLOOR_WOOD, TILE_LAB_BENCH, TILE_LAMP, TILE_PLANT,
    TILE_SIZE_PX, TILE_SOFA, TILE_TABLE, TILE_TELEPORT_PAD, TILE_WALL, TILE_WALL_WINDOW,
};

const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01b3;

/// Deterministic for a given map id: same id, same model, no ambient
/// randomness.
pub(crate) fn generate(map_id: MapId) -> MapModel {
    let model = match map_id {
        MapId::Library => build_library(),
        MapId::Office => build_office(),
        MapId::Lounge => build_lounge(),
    };
    debug_assert!(model.validate().is_ok());
    model
}

struct AreaBuilder {
    name: &'static str,
    region: TileRect,
    build: fn(&mut MapBuilder, TileRect),
}

struct MapBuilder {
    id: MapId,
    width: u32,
    height: u32,
    background: MapLayer,
    collision: MapLayer,
    decoration: MapLayer,
    spawn_points: Vec<Vec2>,
    zones: Vec<InteractiveZone>,
}

impl MapBuilder {
    fn new(id: MapId, width: u32, height: u32, floor: TileId) -> Self {
        Self {
            id,
            width,
            height,
            background: MapLayer::filled(width, height, floor),
            collision: MapLayer::filled(width, height, TILE_EMPTY),
            decoration: MapLayer::filled(width, height, TILE_EMPTY),
            spawn_points: Vec::new(),
            zones: Vec::new(),
        }
    }

    fn stamp_perimeter(&mut self) {
        for x in 0..self.width {
            let top = if x % 4 == 2 { TILE_WALL_WINDOW } else { TILE_WALL };
            self.collision.set(x, 0, top);
            self.collision.set(x, self.height - 1, TILE_WALL);
        }
        for y in 0..self.height {
            self.collision.set(0, y, TILE_WALL);
            self.collision.set(self.width - 1, y, TILE_WALL);
        }
    }

    /// Opens one wall cell and marks it as a door on the floor layer.
    fn carve_door(&mut self, x: u32, y: u32) {
        self.collision.set(x, y, TILE_EMPTY);
        self.background.set(x, y, TILE_DOOR);
    }

    fn apply_areas(&mut self, areas: &[AreaBuilder]) {
        for area in areas {
            debug!(map = self.id.as_str(), area = area.name, "map_area_built");
            (area.build)(self, area.region);
        }
    }

    /// Seeded scatter of small props onto free floor cells. Writes only the
    /// decoration layer.
    fn scatter_decor(&mut self, attempts: u32) {
        let mut rng = Lcg::seeded(self.id.as_str());
        for attempt in 0..attempts {
            let x = 1 + rng.next() % (self.width - 2);
            let y = 1 + rng.next() % (self.height - 2);
            let floor_cell = self
                .background
                .get(x, y)
                .map(|tile| matches!(category_of(tile), TileCategory::Floor))
                .unwrap_or(false);
            let free = self.collision.get(x, y) == Some(TILE_EMPTY)
                && self.decoration.get(x, y) == Some(TILE_EMPTY);
            if floor_cell && free {
                let prop = if attempt % 2 == 0 { TILE_PLANT } else { TILE_LAMP };
                self.decoration.set(x, y, prop);
            }
        }
    }

    fn add_zone(&mut self, zone: InteractiveZone) {
        self.zones.push(zone);
    }

    fn finish(self) -> MapModel {
        MapModel {
            id: self.id,
            width: self.width,
            height: self.height,
            tile_size: TILE_SIZE_PX,
            background: self.background,
            collision: self.collision,
            decoration: self.decoration,
            tile_properties: tile_properties(),
            spawn_points: self.spawn_points,
            zones: self.zones,
        }
    }
}

#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    fn seeded(token: &str) -> Self {
        let mut hash = FNV1A_OFFSET_BASIS_64;
        for byte in token.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV1A_PRIME_64);
        }
        Self(hash)
    }

    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }
}

// ---------------------------------------------------------------------------
// Library: the canonical map.
// ---------------------------------------------------------------------------

fn build_library() -> MapModel {
    let mut builder = MapBuilder::new(MapId::Library, 40, 22, TILE_FLOOR_WOOD);
    builder.stamp_perimeter();
    builder.carve_door(19, 21);
    builder.carve_door(20, 21);

    builder.apply_areas(&[
        AreaBuilder {
            name: "entrance-lobby",
            region: TileRect {
                x: 14,
                y: 15,
                width: 12,
                height: 6,
            },
            build: build_library_lobby,
        },
        AreaBuilder {
            name: "shelving-blocks",
            region: TileRect {
                x: 2,
                y: 2,
                width: 17,
                height: 9,
            },
            build: build_library_shelves,
        },
        AreaBuilder {
            name: "study-carrels",
            region: TileRect {
                x: 20,
                y: 2,
                width: 11,
                height: 7,
            },
            build: build_library_carrels,
        },
        AreaBuilder {
            name: "lab-zone",
            region: TileRect {
                x: 31,
                y: 2,
                width: 8,
                height: 8,
            },
            build: build_library_lab,
        },
        AreaBuilder {
            name: "reading-lounge",
            region: TileRect {
                x: 2,
                y: 12,
                width: 11,
                height: 8,
            },
            build: build_library_lounge,
        },
        AreaBuilder {
            name: "reference-area",
            region: TileRect {
                x: 28,
                y: 12,
                width: 11,
                height: 8,
            },
            build: build_library_reference,
        },
    ]);
    builder.scatter_decor(14);

    builder.spawn_points = vec![tile_center(19, 19), tile_center(20, 18)];

    builder.add_zone(InteractiveZone::new(
        "library-entrance",
        ZoneKind::Door,
        TileRect {
            x: 18,
            y: 19,
            width: 4,
            height: 3,
        }
        .to_world(TILE_SIZE_PX),
    ));
    let office_arrival = tile_center(4, 9);
    builder.add_zone(
        InteractiveZone::new(
            "library-teleport-office",
            ZoneKind::Teleport,
            TileRect {
                x: 34,
                y: 16,
                width: 2,
                height: 1,
            }
            .to_world(TILE_SIZE_PX),
        )
        .with_target(ZoneTarget {
            map_id: MapId::Office.as_str().to_string(),
            x: office_arrival.x,
            y: office_arrival.y,
        }),
    );
    builder.add_zone(InteractiveZone::new(
        "library-study-area",
        ZoneKind::StudyArea,
        TileRect {
            x: 20,
            y: 2,
            width: 11,
            height: 7,
        }
        .to_world(TILE_SIZE_PX),
    ));
    builder.add_zone(InteractiveZone::new(
        "library-lab",
        ZoneKind::MeetingRoom,
        TileRect {
            x: 31,
            y: 2,
            width: 8,
            height: 8,
        }
        .to_world(TILE_SIZE_PX),
    ));
    builder.add_zone(
        InteractiveZone::new(
            "library-reading-lounge",
            ZoneKind::Trigger,
            TileRect {
                x: 2,
                y: 12,
                width: 11,
                height: 8,
            }
            .to_world(TILE_SIZE_PX),
        )
        .with_metadata("info", "reading lounge"),
    );

    builder.finish()
}

fn build_library_lobby(builder: &mut MapBuilder, region: TileRect) {
    builder.background.fill_rect(
        TileRect {
            x: region.x + 1,
            y: region.y + 2,
            width: 10,
            height: 3,
        },
        TILE_FLOOR_RUG,
    );
    for x in region.x + 2..=region.x + 9 {
        if x == 19 || x == 20 {
            continue;
        }
        builder.collision.set(x, region.y + 1, TILE_COUNTER);
    }
    builder.decoration.set(region.x + 1, region.y + 1, TILE_PLANT);
    builder
        .decoration
        .set(region.right() - 2, region.y + 1, TILE_PLANT);
}

fn build_library_shelves(builder: &mut MapBuilder, region: TileRect) {
    let mut y = region.y + 1;
    while y < region.bottom() {
        for x in region.x + 1..region.right() - 2 {
            if x == 9 {
                continue;
            }
            builder.collision.set(x, y, TILE_BOOKSHELF);
        }
        y += 2;
    }
}

fn build_library_carrels(builder: &mut MapBuilder, region: TileRect) {
    for row in 0..2 {
        let y = region.y + 1 + row * 3;
        let mut x = region.x + 1;
        while x < region.right() - 1 {
            builder.collision.set(x, y, TILE_DESK);
            builder.collision.set(x, y + 1, TILE_CHAIR);
            builder.decoration.set(x, y, TILE_BOOK_STACK);
            x += 3;
        }
    }
}

fn build_library_lab(builder: &mut MapBuilder, region: TileRect) {
    for row in 0..2 {
        let y = region.y + 1 + row * 3;
        for x in region.x + 1..region.right() - 1 {
            builder.collision.set(x, y, TILE_LAB_BENCH);
            if x % 2 == 0 {
                builder.decoration.set(x, y, TILE_COMPUTER);
            }
        }
    }
}

fn build_library_lounge(builder: &mut MapBuilder, region: TileRect) {
    builder.background.fill_rect(
        TileRect {
            x: region.x + 1,
            y: region.y + 1,
            width: 8,
            height: 6,
        },
        TILE_FLOOR_CARPET,
    );
    for (x, y) in [(4, 14), (7, 14), (4, 17), (7, 17)] {
        builder.collision.set(x, y, TILE_SOFA);
    }
    builder.decoration.set(region.x + 1, region.y + 1, TILE_PLANT);
    builder
        .decoration
        .set(region.right() - 3, region.bottom() - 2, TILE_PLANT);
}

fn build_library_reference(builder: &mut MapBuilder, region: TileRect) {
    for x in region.x + 1..region.right() - 2 {
        if x == 32 {
            continue;
        }
        builder.collision.set(x, region.y + 1, TILE_BOOKSHELF);
    }
    builder.background.set(34, 16, TILE_TELEPORT_PAD);
    builder.background.set(35, 16, TILE_TELEPORT_PAD);
    builder.decoration.set(region.x + 1, region.bottom() - 2, TILE_LAMP);
}

// ---------------------------------------------------------------------------
// Office
// ---------------------------------------------------------------------------

fn build_office() -> MapModel {
    let mut builder = MapBuilder::new(MapId::Office, 30, 18, TILE_FLOOR_CARPET);
    builder.stamp_perimeter();
    builder.carve_door(0, 8);
    builder.carve_door(0, 9);

    builder.apply_areas(&[
        AreaBuilder {
            name: "entry-lobby",
            region: TileRect {
                x: 1,
                y: 6,
                width: 6,
                height: 6,
            },
            build: build_office_lobby,
        },
        AreaBuilder {
            name: "desk-rows",
            region: TileRect {
                x: 8,
                y: 2,
                width: 15,
                height: 13,
            },
            build: build_office_desks,
        },
        AreaBuilder {
            name: "meeting-room",
            region: TileRect {
                x: 23,
                y: 2,
                width: 6,
                height: 7,
            },
            build: build_office_meeting_room,
        },
        AreaBuilder {
            name: "teleport-corner",
            region: TileRect {
                x: 24,
                y: 12,
                width: 5,
                height: 5,
            },
            build: build_office_teleports,
        },
    ]);
    builder.scatter_decor(10);

    builder.spawn_points = vec![tile_center(4, 8), tile_center(4, 9)];

    builder.add_zone(InteractiveZone::new(
        "office-entrance",
        ZoneKind::Door,
        TileRect {
            x: 0,
            y: 7,
            width: 3,
            height: 4,
        }
        .to_world(TILE_SIZE_PX),
    ));
    builder.add_zone(InteractiveZone::new(
        "office-meeting-room",
        ZoneKind::MeetingRoom,
        TileRect {
            x: 23,
            y: 2,
            width: 6,
            height: 7,
        }
        .to_world(TILE_SIZE_PX),
    ));
    let library_arrival = tile_center(19, 18);
    builder.add_zone(
        InteractiveZone::new(
            "office-teleport-library",
            ZoneKind::Teleport,
            TileRect {
                x: 25,
                y: 14,
                width: 1,
                height: 1,
            }
            .to_world(TILE_SIZE_PX),
        )
        .with_target(ZoneTarget {
            map_id: MapId::Library.as_str().to_string(),
            x: library_arrival.x,
            y: library_arrival.y,
        }),
    );
    let lounge_arrival = tile_center(12, 4);
    builder.add_zone(
        InteractiveZone::new(
            "office-teleport-lounge",
            ZoneKind::Teleport,
            TileRect {
                x: 27,
                y: 14,
                width: 1,
                height: 1,
            }
            .to_world(TILE_SIZE_PX),
        )
        .with_target(ZoneTarget {
            map_id: MapId::Lounge.as_str().to_string(),
            x: lounge_arrival.x,
            y: lounge_arrival.y,
        }),
    );

    builder.finish()
}

fn build_office_lobby(builder: &mut MapBuilder, region: TileRect) {
    builder.background.fill_rect(
        TileRect {
            x: region.x + 1,
            y: region.y + 1,
            width: 4,
            height: 4,
        },
        TILE_FLOOR_RUG,
    );
    builder.decoration.set(region.x + 1, region.bottom() - 1, TILE_PLANT);
    builder.decoration.set(region.right() - 2, region.y + 1, TILE_PLANT);
}

fn build_office_desks(builder: &mut MapBuilder, region: TileRect) {
    let mut y = region.y + 1;
    while y + 1 < region.bottom() {
        let mut x = region.x + 1;
        while x < region.right() - 1 {
            builder.collision.set(x, y, TILE_DESK);
            builder.collision.set(x, y + 1, TILE_CHAIR);
            builder.decoration.set(x, y, TILE_COMPUTER);
            x += 3;
        }
        y += 3;
    }
}

fn build_office_meeting_room(builder: &mut MapBuilder, region: TileRect) {
    for y in region.y..region.bottom() {
        if y == region.y + 3 {
            continue;
        }
        builder.collision.set(region.x, y, TILE_WALL);
    }
    builder.collision.fill_rect(
        TileRect {
            x: region.x + 2,
            y: region.y + 1,
            width: 3,
            height: 2,
        },
        TILE_TABLE,
    );
    builder.collision.set(region.x + 2, region.y + 4, TILE_CHAIR);
    builder.collision.set(region.x + 4, region.y + 4, TILE_CHAIR);
}

fn build_office_teleports(builder: &mut MapBuilder, _region: TileRect) {
    builder.background.set(25, 14, TILE_TELEPORT_PAD);
    builder.background.set(27, 14, TILE_TELEPORT_PAD);
    builder.decoration.set(26, 13, TILE_LAMP);
}

// ---------------------------------------------------------------------------
// Lounge
// ---------------------------------------------------------------------------

fn build_lounge() -> MapModel {
    let mut builder = MapBuilder::new(MapId::Lounge, 24, 16, TILE_FLOOR_STONE);
    builder.stamp_perimeter();
    builder.carve_door(11, 0);
    builder.carve_door(12, 0);

    builder.apply_areas(&[
        AreaBuilder {
            name: "central-rug",
            region: TileRect {
                x: 7,
                y: 5,
                width: 10,
                height: 7,
            },
            build: build_lounge_rug,
        },
        AreaBuilder {
            name: "sofa-ring",
            region: TileRect {
                x: 6,
                y: 4,
                width: 12,
                height: 9,
            },
            build: build_lounge_sofas,
        },
        AreaBuilder {
            name: "quiet-corner",
            region: TileRect {
                x: 1,
                y: 10,
                width: 5,
                height: 5,
            },
            build: build_lounge_quiet_corner,
        },
        AreaBuilder {
            name: "teleport-nook",
            region: TileRect {
                x: 19,
                y: 11,
                width: 4,
                height: 4,
            },
            build: build_lounge_teleport,
        },
    ]);
    builder.scatter_decor(8);

    builder.spawn_points = vec![tile_center(12, 3), tile_center(11, 3)];

    builder.add_zone(InteractiveZone::new(
        "lounge-entrance",
        ZoneKind::Door,
        TileRect {
            x: 10,
            y: 0,
            width: 4,
            height: 3,
        }
        .to_world(TILE_SIZE_PX),
    ));
    builder.add_zone(
        InteractiveZone::new(
            "lounge-rug",
            ZoneKind::Trigger,
            TileRect {
                x: 7,
                y: 5,
                width: 10,
                height: 7,
            }
            .to_world(TILE_SIZE_PX),
        )
        .with_metadata("info", "social lounge"),
    );
    let library_arrival = tile_center(19, 18);
    builder.add_zone(
        InteractiveZone::new(
            "lounge-teleport-library",
            ZoneKind::Teleport,
            TileRect {
                x: 21,
                y: 13,
                width: 1,
                height: 1,
            }
            .to_world(TILE_SIZE_PX),
        )
        .with_target(ZoneTarget {
            map_id: MapId::Library.as_str().to_string(),
            x: library_arrival.x,
            y: library_arrival.y,
        }),
    );

    builder.finish()
}

fn build_lounge_rug(builder: &mut MapBuilder, region: TileRect) {
    builder.background.fill_rect(
        TileRect {
            x: region.x + 1,
            y: region.y + 1,
            width: 8,
            height: 5,
        },
        TILE_FLOOR_RUG,
    );
}

fn build_lounge_sofas(builder: &mut MapBuilder, region: TileRect) {
    for (x, y) in [(8, 5), (11, 5), (14, 5), (8, 10), (11, 10), (14, 10)] {
        builder.collision.set(x, y, TILE_SOFA);
    }
    builder.decoration.set(region.x + 1, region.y, TILE_LAMP);
    builder
        .decoration
        .set(region.right() - 2, region.bottom() - 1, TILE_LAMP);
}

fn build_lounge_quiet_corner(builder: &mut MapBuilder, region: TileRect) {
    builder.collision.set(region.x + 1, region.y + 2, TILE_BOOKSHELF);
    builder.collision.set(region.x + 2, region.y + 2, TILE_BOOKSHELF);
    builder.decoration.set(region.x + 1, region.y + 3, TILE_BOOK_STACK);
    builder.decoration.set(region.x + 3, region.y + 1, TILE_PLANT);
}

fn build_lounge_teleport(builder: &mut MapBuilder, _region: TileRect) {
    builder.background.set(21, 13, TILE_TELEPORT_PAD);
    builder.decoration.set(20, 12, TILE_PLANT);
}
