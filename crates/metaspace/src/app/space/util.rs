fn build_tile_layers(map: &MapModel) -> Result<Vec<TileLayer>, TileGridError> {
    let mut layers = Vec::with_capacity(3);
    for (kind, layer) in [
        (TileLayerKind::Background, &map.background),
        (TileLayerKind::Collision, &map.collision),
        (TileLayerKind::Decoration, &map.decoration),
    ] {
        layers.push(TileLayer {
            kind,
            grid: TileGrid::new(
                layer.width(),
                layer.height(),
                map.tile_size,
                layer.tiles().to_vec(),
            )?,
        });
    }
    Ok(layers)
}

fn clamp_to_map(map: &MapModel, position: Vec2, half_extent: f32) -> Vec2 {
    Vec2 {
        x: position.x.clamp(half_extent, map.width_px() - half_extent),
        y: position.y.clamp(half_extent, map.height_px() - half_extent),
    }
}

/// Whether a player box centered here overlaps any blocking cell. The box
/// is inset a hair so sliding along a wall face does not register.
fn aabb_blocked(map: &MapModel, center: Vec2, half_extent: f32) -> bool {
    let inset = (half_extent - 0.001).max(0.0);
    let tile_size = map.tile_size as f32;
    for (dx, dy) in [
        (-inset, -inset),
        (inset, -inset),
        (-inset, inset),
        (inset, inset),
    ] {
        let px = center.x + dx;
        let py = center.y + dy;
        if px < 0.0 || py < 0.0 {
            return true;
        }
        let tile_x = (px / tile_size) as u32;
        let tile_y = (py / tile_size) as u32;
        if map.is_blocked(tile_x, tile_y) {
            return true;
        }
    }
    false
}

/// Per-axis resolution: a blocked diagonal still slides along the free
/// axis, so walls feel solid without sticky corners.
fn move_with_collision(map: &MapModel, from: Vec2, delta: Vec2, half_extent: f32) -> Vec2 {
    let mut position = from;

    let candidate_x = clamp_to_map(
        map,
        Vec2 {
            x: position.x + delta.x,
            y: position.y,
        },
        half_extent,
    );
    if !aabb_blocked(map, candidate_x, half_extent) {
        position.x = candidate_x.x;
    }

    let candidate_y = clamp_to_map(
        map,
        Vec2 {
            x: position.x,
            y: position.y + delta.y,
        },
        half_extent,
    );
    if !aabb_blocked(map, candidate_y, half_extent) {
        position.y = candidate_y.y;
    }

    position
}
