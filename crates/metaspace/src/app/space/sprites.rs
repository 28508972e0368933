const SKIN_COLOR: [u8; 4] = [232, 200, 170, 255];
const LEG_COLOR: [u8; 4] = [52, 48, 60, 255];
const EYE_COLOR: [u8; 4] = [28, 26, 32, 255];

const VARIANT_BODY_COLORS: [[u8; 3]; AVATAR_VARIANTS as usize] = [
    [86, 130, 196],
    [196, 100, 90],
    [96, 170, 110],
    [182, 152, 82],
];

/// Builds every texture a scene needs: one sprite per tile id in the map's
/// taxonomy plus the full avatar clip set, then runs the map's decoration
/// hook. Runs once while the scene loads.
fn generate_assets(map: &MapModel, config: &SceneConfig, assets: &mut AssetRegistry) {
    let mut tile_ids: Vec<TileId> = map.tile_properties.keys().copied().collect();
    tile_ids.sort_unstable();
    for tile_id in tile_ids {
        assets.set_tile_sprite(tile_id, tile_sprite(tile_id, map.tile_size, config.tint));
    }

    for variant in 0..AVATAR_VARIANTS {
        for action in [AnimationAction::Idle, AnimationAction::Walk] {
            for direction in [
                Direction::Up,
                Direction::Down,
                Direction::Left,
                Direction::Right,
            ] {
                let key = AnimationKey {
                    variant,
                    action,
                    direction,
                };
                for frame in 0..key.frame_count() {
                    let sprite = avatar_sprite(variant, action, direction, frame);
                    if let Err(error) = assets.insert_sprite(&key.frame_sprite_key(frame), sprite)
                    {
                        warn!(error = %error, "sprite_key_rejected");
                    }
                }
            }
        }
    }

    if let Some(decorate) = config.decorate {
        decorate(map, assets);
    }
}

fn base_tile_color(tile_id: TileId) -> [u8; 3] {
    match tile_id {
        TILE_FLOOR_WOOD => [150, 112, 70],
        TILE_FLOOR_CARPET => [86, 104, 122],
        TILE_FLOOR_STONE => [120, 118, 112],
        TILE_FLOOR_RUG => [140, 64, 60],
        TILE_WALL => [84, 76, 72],
        TILE_WALL_WINDOW => [128, 158, 180],
        TILE_BOOKSHELF => [96, 60, 36],
        TILE_TABLE => [130, 96, 56],
        TILE_CHAIR => [92, 72, 50],
        TILE_DESK => [110, 82, 52],
        TILE_LAB_BENCH => [100, 104, 112],
        TILE_SOFA => [70, 90, 130],
        TILE_COUNTER => [120, 90, 60],
        TILE_PLANT => [60, 122, 64],
        TILE_LAMP => [210, 190, 120],
        TILE_BOOK_STACK => [160, 120, 90],
        TILE_COMPUTER => [70, 80, 96],
        TILE_DOOR => [170, 140, 90],
        TILE_TELEPORT_PAD => [80, 200, 210],
        _ => [68, 74, 62],
    }
}

fn mix_channel(base: u8, tint: u8) -> u8 {
    ((u16::from(base) * 13 + u16::from(tint) * 3) / 16) as u8
}

fn shade(color: [u8; 4], delta: i16) -> [u8; 4] {
    let apply = |channel: u8| (i16::from(channel) + delta).clamp(0, 255) as u8;
    [apply(color[0]), apply(color[1]), apply(color[2]), color[3]]
}

fn speckle(tile_id: TileId, x: u32, y: u32) -> i16 {
    let mut hash = u32::from(tile_id)
        .wrapping_mul(0x9e37_79b9)
        .wrapping_add(x.wrapping_mul(73))
        .wrapping_add(y.wrapping_mul(151));
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    ((hash >> 28) as i16) - 8
}

fn tile_sprite(tile_id: TileId, tile_size: u32, tint: [u8; 3]) -> RgbaSprite {
    let base = base_tile_color(tile_id);
    let color = [
        mix_channel(base[0], tint[0]),
        mix_channel(base[1], tint[1]),
        mix_channel(base[2], tint[2]),
        255,
    ];
    let mut sprite =
        RgbaSprite::filled(tile_size, tile_size, color).expect("tile size is non-zero");

    for y in 0..tile_size {
        for x in 0..tile_size {
            let edge = x == 0 || y == 0 || x == tile_size - 1 || y == tile_size - 1;
            let mut pixel = shade(color, speckle(tile_id, x, y));
            if edge {
                pixel = shade(pixel, -18);
            }
            sprite.put_pixel(x, y, pixel);
        }
    }

    match tile_id {
        TILE_DOOR => {
            for x in (3..tile_size).step_by(6) {
                for y in 1..tile_size - 1 {
                    sprite.put_pixel(x, y, shade(color, -30));
                }
            }
        }
        TILE_TELEPORT_PAD => {
            let center = tile_size as f32 * 0.5;
            for y in 0..tile_size {
                for x in 0..tile_size {
                    let dx = x as f32 + 0.5 - center;
                    let dy = y as f32 + 0.5 - center;
                    let distance = (dx * dx + dy * dy).sqrt();
                    if distance > center * 0.5 && distance < center * 0.8 {
                        sprite.put_pixel(x, y, [210, 245, 250, 255]);
                    }
                }
            }
        }
        TILE_WALL_WINDOW => {
            for y in tile_size / 4..tile_size * 3 / 4 {
                for x in 2..tile_size - 2 {
                    sprite.put_pixel(x, y, shade([200, 226, 240, 255], speckle(tile_id, x, y)));
                }
            }
        }
        _ => {}
    }

    sprite
}

fn sprite_fill(sprite: &mut RgbaSprite, x0: u32, y0: u32, width: u32, height: u32, color: [u8; 4]) {
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            sprite.put_pixel(x, y, color);
        }
    }
}

fn avatar_sprite(
    variant: u8,
    action: AnimationAction,
    direction: Direction,
    frame: u32,
) -> RgbaSprite {
    let body = VARIANT_BODY_COLORS[usize::from(variant) % VARIANT_BODY_COLORS.len()];
    let body_color = [body[0], body[1], body[2], 255];
    let mut sprite = RgbaSprite::new(
        AVATAR_SPRITE_WIDTH,
        AVATAR_SPRITE_HEIGHT,
        vec![0; (AVATAR_SPRITE_WIDTH * AVATAR_SPRITE_HEIGHT * 4) as usize],
    )
    .expect("avatar sprite dimensions are fixed");

    // Head and hair.
    sprite_fill(&mut sprite, 7, 2, 10, 8, SKIN_COLOR);
    sprite_fill(&mut sprite, 7, 2, 10, 3, shade(body_color, -50));

    // Torso, shaded a touch on side profiles.
    let torso = match direction {
        Direction::Left => shade(body_color, -14),
        Direction::Right => shade(body_color, 10),
        _ => body_color,
    };
    sprite_fill(&mut sprite, 5, 10, 14, 12, torso);

    // Face marks by facing; the back of the head shows hair only.
    match direction {
        Direction::Down => {
            sprite.put_pixel(9, 7, EYE_COLOR);
            sprite.put_pixel(14, 7, EYE_COLOR);
        }
        Direction::Left => {
            sprite.put_pixel(8, 7, EYE_COLOR);
        }
        Direction::Right => {
            sprite.put_pixel(15, 7, EYE_COLOR);
        }
        Direction::Up => {
            sprite_fill(&mut sprite, 7, 5, 10, 3, shade(body_color, -50));
        }
    }

    // Legs; the walk cycle alternates which leg is lifted.
    let (left_lift, right_lift) = match (action, frame) {
        (AnimationAction::Walk, 0) => (2, 0),
        (AnimationAction::Walk, _) => (0, 2),
        (AnimationAction::Idle, _) => (0, 0),
    };
    sprite_fill(&mut sprite, 7, 22 - left_lift, 4, 7, LEG_COLOR);
    sprite_fill(&mut sprite, 13, 22 - right_lift, 4, 7, LEG_COLOR);

    sprite
}

/// Library gets striped spines on its book stacks.
fn decorate_library(map: &MapModel, assets: &mut AssetRegistry) {
    let size = map.tile_size;
    let mut sprite = tile_sprite(TILE_BOOK_STACK, size, [96, 80, 58]);
    let spines: [[u8; 4]; 3] = [
        [170, 60, 60, 255],
        [60, 110, 170, 255],
        [190, 160, 70, 255],
    ];
    for (index, color) in spines.iter().enumerate() {
        let x0 = 4 + index as u32 * 8;
        for y in size / 2..size - 4 {
            for x in x0..(x0 + 5).min(size) {
                sprite.put_pixel(x, y, *color);
            }
        }
    }
    assets.set_tile_sprite(TILE_BOOK_STACK, sprite);
}

/// Lounge sofas read warmer than the default blue.
fn decorate_lounge(map: &MapModel, assets: &mut AssetRegistry) {
    let mut sprite = tile_sprite(TILE_SOFA, map.tile_size, [92, 70, 96]);
    for y in 0..map.tile_size {
        for x in 0..map.tile_size {
            if let Some(pixel) = sprite.pixel(x, y) {
                sprite.put_pixel(x, y, [pixel[0].saturating_add(40), pixel[1], pixel[2], 255]);
            }
        }
    }
    assets.set_tile_sprite(TILE_SOFA, sprite);
}
