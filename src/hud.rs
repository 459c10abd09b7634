// File: hud.rs
use crate::constants::*;
use crate::sprites::{Sprite, TextureId};
use glam::{Vec2, Vec4};
use winit::dpi::PhysicalSize;

/// Sound meter in the top-left corner and the start-up fade from black.
#[derive(Debug, Clone)]
pub struct Hud {
    texture: TextureId,
    viewport: Vec2,
    elapsed: f32,
}

impl Hud {
    pub fn new(texture: TextureId, viewport: PhysicalSize<u32>) -> Self {
        Self {
            texture,
            viewport: Vec2::new(viewport.width as f32, viewport.height as f32),
            elapsed: 0.0,
        }
    }

    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time.max(0.0);
    }

    pub fn resize(&mut self, viewport: PhysicalSize<u32>) {
        self.viewport = Vec2::new(viewport.width as f32, viewport.height as f32);
    }

    /// Restarts the fade-in.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Opacity of the black overlay: 1 at start, 0 after the fade.
    pub fn fade_alpha(&self) -> f32 {
        (1.0 - self.elapsed / FADE_IN_DURATION).clamp(0.0, 1.0)
    }

    fn rect(&self, top_left: Vec2, size: Vec2, color: Vec4, depth: f32) -> Sprite {
        Sprite {
            position: top_left + size * 0.5,
            size,
            texture: self.texture,
            color,
            depth,
        }
    }

    pub fn draw(&self, sound_intensity: f32, out: &mut Vec<Sprite>) {
        let origin = Vec2::splat(SOUND_METER_MARGIN);
        let track = Vec2::new(SOUND_METER_WIDTH, SOUND_METER_HEIGHT);
        out.push(self.rect(origin, track, Vec4::from(SOUND_METER_TRACK_COLOR), HUD_DEPTH));

        let fill = sound_intensity.clamp(0.0, 100.0) / 100.0 * SOUND_METER_WIDTH;
        if fill > 0.0 {
            out.push(self.rect(
                origin,
                Vec2::new(fill, SOUND_METER_HEIGHT),
                Vec4::from(SOUND_METER_FILL_COLOR),
                HUD_DEPTH,
            ));
        }

        let alpha = self.fade_alpha();
        if alpha > 0.0 {
            // Above the meter so everything fades in together
            out.push(self.rect(
                Vec2::ZERO,
                self.viewport,
                Vec4::new(0.0, 0.0, 0.0, alpha),
                HUD_DEPTH + 0.001,
            ));
        }
    }
}
