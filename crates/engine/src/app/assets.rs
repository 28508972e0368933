use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpriteDataError {
    #[error("sprite byte count mismatch: expected {expected}, got {actual}")]
    ByteCountMismatch { expected: usize, actual: usize },
    #[error("sprite dimensions must be non-zero")]
    ZeroDimension,
}

/// CPU-side RGBA sprite. Alpha zero is treated as fully transparent by the
/// renderer; no other blending is performed.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl RgbaSprite {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, SpriteDataError> {
        if width == 0 || height == 0 {
            return Err(SpriteDataError::ZeroDimension);
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(SpriteDataError::ByteCountMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Solid single-color sprite.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Result<Self, SpriteDataError> {
        if width == 0 || height == 0 {
            return Err(SpriteDataError::ZeroDimension);
        }
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            rgba.extend_from_slice(&color);
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(index..index + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[index..index + 4].copy_from_slice(&color);
    }
}

/// Scene-owned sprite storage. Populated once while a scene loads and
/// queried by the renderer; there is no global texture cache.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    tile_sprites: HashMap<u16, RgbaSprite>,
    sprites: HashMap<String, RgbaSprite>,
}

impl AssetRegistry {
    pub fn set_tile_sprite(&mut self, tile_id: u16, sprite: RgbaSprite) {
        self.tile_sprites.insert(tile_id, sprite);
    }

    pub fn tile_sprite(&self, tile_id: u16) -> Option<&RgbaSprite> {
        self.tile_sprites.get(&tile_id)
    }

    pub fn insert_sprite(&mut self, key: &str, sprite: RgbaSprite) -> Result<(), SpriteKeyError> {
        validate_sprite_key(key)?;
        self.sprites.insert(key.to_string(), sprite);
        Ok(())
    }

    pub fn sprite(&self, key: &str) -> Option<&RgbaSprite> {
        self.sprites.get(key)
    }

    pub fn contains_sprite(&self, key: &str) -> bool {
        self.sprites.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.tile_sprites.is_empty() && self.sprites.is_empty()
    }

    pub fn clear(&mut self) {
        self.tile_sprites.clear();
        self.sprites.clear();
    }
}
