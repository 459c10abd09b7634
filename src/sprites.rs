//! Texture handles, drawable sprite descriptors and image loading.
//!
//! The automaton core only ever sees [`TextureId`]s. Pixel data lives in
//! [`SpriteImage`]s, which the renderer uploads once into a texture array
//! where the id doubles as the array layer.

use crate::constants::{SPRITE_TEXTURE_SIZE, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::{EngineError, EngineResult};
use glam::{Vec2, Vec4};
use image::{RgbaImage, imageops::FilterType};
use std::path::Path;

/// Opaque handle to a texture owned by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// One quad for the renderer to blit, centered on `position`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub size: Vec2,
    pub texture: TextureId,
    pub color: Vec4,
    pub depth: f32,
}

/// Stable sort by depth, lowest first. Lower depth is drawn behind.
pub fn sort_by_depth(sprites: &mut [Sprite]) {
    sprites.sort_by(|a, b| a.depth.total_cmp(&b.depth));
}

#[derive(Debug, Clone)]
pub struct SpriteImage {
    pub id: TextureId,
    pub rgba: RgbaImage,
}

/// Textures shared by every consumer: a plain white pixel for stars and HUD
/// rectangles, and a soft round shadow for foreground cells.
#[derive(Debug, Clone)]
pub struct SharedSprites {
    pub pixel: TextureId,
    pub shadow: TextureId,
    images: Vec<SpriteImage>,
}

impl SharedSprites {
    pub const PIXEL: TextureId = TextureId(0);
    pub const SHADOW: TextureId = TextureId(1);
    /// First id handed out to loaded cell images.
    pub const FIRST_IMAGE: u32 = 2;

    pub fn new() -> Self {
        let size = SPRITE_TEXTURE_SIZE;
        let pixel = RgbaImage::from_pixel(size, size, image::Rgba([255, 255, 255, 255]));
        Self {
            pixel: Self::PIXEL,
            shadow: Self::SHADOW,
            images: vec![
                SpriteImage {
                    id: Self::PIXEL,
                    rgba: pixel,
                },
                SpriteImage {
                    id: Self::SHADOW,
                    rgba: soft_circle(size),
                },
            ],
        }
    }

    pub fn images(&self) -> &[SpriteImage] {
        &self.images
    }
}

impl Default for SharedSprites {
    fn default() -> Self {
        Self::new()
    }
}

/// Black disc whose alpha falls off smoothly toward the rim.
fn soft_circle(size: u32) -> RgbaImage {
    let center = (size as f32 - 1.0) * 0.5;
    let radius = size as f32 * 0.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance = (dx * dx + dy * dy).sqrt() / radius;
        let falloff = (1.0 - distance).clamp(0.0, 1.0);
        // smoothstep
        let alpha = falloff * falloff * (3.0 - 2.0 * falloff);
        image::Rgba([0, 0, 0, (alpha * 255.0).round() as u8])
    })
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Loads every supported image at the top level of `dir`, resized to the
/// sprite texture size. Ids start at [`SharedSprites::FIRST_IMAGE`].
///
/// Files that fail to decode are skipped with a warning, so the result may
/// be empty; engine construction is what rejects an empty pool.
pub fn load_images(dir: &Path) -> EngineResult<Vec<SpriteImage>> {
    let entries = std::fs::read_dir(dir).map_err(|source| EngineError::ImageDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    // Directory order is platform dependent
    paths.sort();
    log::info!("Found {} image files in {}", paths.len(), dir.display());

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        match image::open(&path) {
            Ok(decoded) => {
                let rgba = image::imageops::resize(
                    &decoded.to_rgba8(),
                    SPRITE_TEXTURE_SIZE,
                    SPRITE_TEXTURE_SIZE,
                    FilterType::Triangle,
                );
                let id = TextureId(SharedSprites::FIRST_IMAGE + images.len() as u32);
                log::debug!("Loaded image {} as {:?}", path.display(), id);
                images.push(SpriteImage { id, rgba });
            }
            Err(err) => {
                log::warn!("Failed to load image '{}': {}", path.display(), err);
            }
        }
    }

    log::info!("Successfully loaded {} textures", images.len());
    Ok(images)
}
