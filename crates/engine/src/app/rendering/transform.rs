use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World coordinates are pixels with +y down; the camera position sits at
/// the viewport center.
pub fn world_to_screen_px(camera: &Camera2D, viewport: Viewport, world: Vec2) -> (i32, i32) {
    let x = world.x - camera.position.x + viewport.width as f32 * 0.5;
    let y = world.y - camera.position.y + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world_px(camera: &Camera2D, viewport: Viewport, screen: Vec2) -> Vec2 {
    Vec2 {
        x: screen.x - viewport.width as f32 * 0.5 + camera.position.x,
        y: screen.y - viewport.height as f32 * 0.5 + camera.position.y,
    }
}
