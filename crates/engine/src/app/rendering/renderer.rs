use std::collections::HashSet;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::assets::{AssetRegistry, RgbaSprite};
use crate::app::scene::{SceneWorld, TileGrid};
use crate::app::{Camera2D, Vec2};

use super::transform::world_to_screen_px;
use super::Viewport;

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const PLACEHOLDER_HALF_SIZE_PX: i32 = 12;
const TILE_FALLBACK_COLOR: [u8; 4] = [68, 74, 62, 255];

/// Tile id 0 is the empty cell on every layer and is never drawn.
const EMPTY_TILE: u16 = 0;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    warned_missing_sprite_keys: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            warned_missing_sprite_keys: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let warned_missing_sprite_keys = &mut self.warned_missing_sprite_keys;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let camera = world.camera();
        for layer in world.layers() {
            draw_tile_grid(frame, viewport, camera, &layer.grid, world.assets());
        }
        draw_avatars(frame, viewport, camera, world, warned_missing_sprite_keys);

        self.pixels.render()
    }
}

fn draw_tile_grid(
    frame: &mut [u8],
    viewport: Viewport,
    camera: &Camera2D,
    grid: &TileGrid,
    assets: &AssetRegistry,
) {
    let Some((x_min, x_max, y_min, y_max)) = visible_tile_range(camera, viewport, grid) else {
        return;
    };
    let tile_size = grid.tile_size_px() as f32;
    for tile_y in y_min..=y_max {
        for tile_x in x_min..=x_max {
            let Some(tile_id) = grid.tile_at(tile_x, tile_y) else {
                continue;
            };
            if tile_id == EMPTY_TILE {
                continue;
            }
            let corner_world = Vec2 {
                x: tile_x as f32 * tile_size,
                y: tile_y as f32 * tile_size,
            };
            let (screen_x, screen_y) = world_to_screen_px(camera, viewport, corner_world);
            match assets.tile_sprite(tile_id) {
                Some(sprite) => blit_sprite(frame, viewport, screen_x, screen_y, sprite),
                None => fill_rect(
                    frame,
                    viewport,
                    screen_x,
                    screen_y,
                    grid.tile_size_px() as i32,
                    grid.tile_size_px() as i32,
                    TILE_FALLBACK_COLOR,
                ),
            }
        }
    }
}

fn draw_avatars(
    frame: &mut [u8],
    viewport: Viewport,
    camera: &Camera2D,
    world: &SceneWorld,
    warned_missing_sprite_keys: &mut HashSet<String>,
) {
    let mut draw_order: Vec<usize> = (0..world.avatars().len()).collect();
    draw_order.sort_by(|a, b| {
        let ya = world.avatars()[*a].position.y;
        let yb = world.avatars()[*b].position.y;
        ya.partial_cmp(&yb).unwrap_or(std::cmp::Ordering::Equal)
    });

    for index in draw_order {
        let avatar = &world.avatars()[index];
        let (center_x, center_y) = world_to_screen_px(camera, viewport, avatar.position);
        match world.assets().sprite(&avatar.sprite_key) {
            Some(sprite) => {
                let left = center_x - sprite.width() as i32 / 2;
                let top = center_y - sprite.height() as i32 / 2;
                blit_sprite(frame, viewport, left, top, sprite);
            }
            None => {
                if warned_missing_sprite_keys.insert(avatar.sprite_key.clone()) {
                    warn!(sprite_key = %avatar.sprite_key, "missing_avatar_sprite");
                }
                fill_rect(
                    frame,
                    viewport,
                    center_x - PLACEHOLDER_HALF_SIZE_PX,
                    center_y - PLACEHOLDER_HALF_SIZE_PX,
                    PLACEHOLDER_HALF_SIZE_PX * 2,
                    PLACEHOLDER_HALF_SIZE_PX * 2,
                    PLACEHOLDER_COLOR,
                );
            }
        }
    }
}

/// Inclusive tile range intersecting the viewport, or None when the grid is
/// entirely off screen.
fn visible_tile_range(
    camera: &Camera2D,
    viewport: Viewport,
    grid: &TileGrid,
) -> Option<(u32, u32, u32, u32)> {
    if grid.width() == 0 || grid.height() == 0 {
        return None;
    }
    let tile_size = grid.tile_size_px() as f32;
    let half_w = viewport.width as f32 * 0.5;
    let half_h = viewport.height as f32 * 0.5;

    let world_left = camera.position.x - half_w;
    let world_right = camera.position.x + half_w;
    let world_top = camera.position.y - half_h;
    let world_bottom = camera.position.y + half_h;

    let x_min = (world_left / tile_size).floor() as i64;
    let x_max = (world_right / tile_size).floor() as i64;
    let y_min = (world_top / tile_size).floor() as i64;
    let y_max = (world_bottom / tile_size).floor() as i64;

    let last_x = grid.width() as i64 - 1;
    let last_y = grid.height() as i64 - 1;
    if x_max < 0 || y_max < 0 || x_min > last_x || y_min > last_y {
        return None;
    }

    Some((
        x_min.clamp(0, last_x) as u32,
        x_max.clamp(0, last_x) as u32,
        y_min.clamp(0, last_y) as u32,
        y_max.clamp(0, last_y) as u32,
    ))
}

fn fill_rect(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    color: [u8; 4],
) {
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + width).min(viewport.width as i32);
    let y1 = (top + height).min(viewport.height as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            let index = (y as usize * viewport.width as usize + x as usize) * 4;
            if let Some(pixel) = frame.get_mut(index..index + 4) {
                pixel.copy_from_slice(&color);
            }
        }
    }
}

fn blit_sprite(frame: &mut [u8], viewport: Viewport, left: i32, top: i32, sprite: &RgbaSprite) {
    for sprite_y in 0..sprite.height() {
        let dest_y = top + sprite_y as i32;
        if dest_y < 0 || dest_y >= viewport.height as i32 {
            continue;
        }
        for sprite_x in 0..sprite.width() {
            let dest_x = left + sprite_x as i32;
            if dest_x < 0 || dest_x >= viewport.width as i32 {
                continue;
            }
            let Some(color) = sprite.pixel(sprite_x, sprite_y) else {
                continue;
            };
            if color[3] == 0 {
                continue;
            }
            let index = (dest_y as usize * viewport.width as usize + dest_x as usize) * 4;
            if let Some(pixel) = frame.get_mut(index..index + 4) {
                pixel.copy_from_slice(&color);
            }
        }
    }
}
