// File: cell.rs
use crate::config::EngineConfig;
use crate::constants::SHADOW_DEPTH_BIAS;
use crate::sprites::{Sprite, TextureId};
use crate::utils::{inverse_lerp, lerp, random_offset};
use glam::{Vec2, Vec4};
use rand::Rng;

/// 1-based layer number; layer 1 is the foreground.
pub type LayerId = u8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Zooming in. Counts as live.
    Born,
    Alive,
    /// Zooming out. Ignored by the rules, reaped once the animation ends.
    Dying,
}

/// Per-tick tunables shared by every cell, taken from [`EngineConfig`].
#[derive(Debug, Copy, Clone)]
pub struct CellDynamics {
    pub birth_rate: f32, // progress per second
    pub death_rate: f32,
    pub threshold_low: f32,
    pub threshold_high: f32,
    pub vibration_medium: f32,
    pub vibration_max: f32,
    pub settle_rate: f32,
}

impl CellDynamics {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            birth_rate: 1.0 / config.birth_duration.max(f32::EPSILON),
            death_rate: 1.0 / config.death_duration.max(f32::EPSILON),
            threshold_low: config.sound_threshold_low,
            threshold_high: config.sound_threshold_high,
            vibration_medium: config.vibration_medium.max(0.0),
            vibration_max: config.vibration_max.max(0.0),
            settle_rate: config.vibration_settle_rate.max(0.0),
        }
    }

    /// Jitter amplitude in pixels at or above the high threshold.
    pub fn vibration_magnitude(&self, sound_intensity: f32) -> f32 {
        let t = inverse_lerp(self.threshold_high, 100.0, sound_intensity);
        lerp(self.vibration_medium, self.vibration_max, t)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ShadowStyle {
    pub texture: TextureId,
    pub offset: f32,
    pub opacity: f32,
}

/// How a layer's cells look on screen.
#[derive(Debug, Copy, Clone)]
pub struct CellStyle {
    pub size: f32,
    pub tint: Vec4,
    pub opacity: f32,
    pub shadow: Option<ShadowStyle>,
}

#[derive(Debug, Clone)]
pub struct Cell {
    grid_x: u32,
    grid_y: u32,
    position: Vec2,
    layer: LayerId,
    depth: f32,
    phase: Phase,
    progress: f32,
    texture: TextureId,
    vibration: Vec2,
}

impl Cell {
    pub fn new(
        grid_x: u32,
        grid_y: u32,
        cell_size: f32,
        layer: LayerId,
        depth: f32,
        texture: TextureId,
    ) -> Self {
        let cell_size = cell_size.max(0.0);
        // Center of the slot
        let position = Vec2::new(
            (grid_x as f32 + 0.5) * cell_size,
            (grid_y as f32 + 0.5) * cell_size,
        );
        Self {
            grid_x,
            grid_y,
            position,
            layer,
            depth: depth.clamp(0.0, 1.0),
            phase: Phase::Born,
            progress: 0.0,
            texture,
            vibration: Vec2::ZERO,
        }
    }

    pub fn grid_position(&self) -> (u32, u32) {
        (self.grid_x, self.grid_y)
    }
    pub fn position(&self) -> Vec2 {
        self.position
    }
    pub fn draw_position(&self) -> Vec2 {
        self.position + self.vibration
    }
    pub fn layer(&self) -> LayerId {
        self.layer
    }
    pub fn depth(&self) -> f32 {
        self.depth
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn progress(&self) -> f32 {
        self.progress
    }
    pub fn texture(&self) -> TextureId {
        self.texture
    }
    pub fn vibration(&self) -> Vec2 {
        self.vibration
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.phase != Phase::Dying
    }

    /// Death animation finished; the owning grid should clear the slot.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.phase == Phase::Dying && self.progress >= 1.0
    }

    /// Visual scale in [0, 1] derived from the lifecycle.
    pub fn scale(&self) -> f32 {
        match self.phase {
            Phase::Born => self.progress,
            Phase::Alive => 1.0,
            Phase::Dying => 1.0 - self.progress,
        }
    }

    /// Starts the zoom-out. A cell still zooming in shrinks from its current
    /// scale instead of popping to full size.
    pub fn die(&mut self) {
        match self.phase {
            Phase::Dying => {}
            Phase::Born => {
                self.progress = (1.0 - self.progress).clamp(0.0, 1.0);
                self.phase = Phase::Dying;
            }
            Phase::Alive => {
                self.progress = 0.0;
                self.phase = Phase::Dying;
            }
        }
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        delta_time: f32,
        sound_intensity: f32,
        dynamics: &CellDynamics,
        rng: &mut R,
    ) {
        let dt = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        match self.phase {
            Phase::Born => {
                self.progress = (self.progress + dt * dynamics.birth_rate).min(1.0);
                if self.progress >= 1.0 {
                    self.phase = Phase::Alive;
                }
            }
            Phase::Alive => {}
            Phase::Dying => {
                self.progress = (self.progress + dt * dynamics.death_rate).min(1.0);
            }
        }

        let intensity = sound_intensity.clamp(0.0, 100.0);
        if intensity >= dynamics.threshold_high {
            let magnitude = dynamics.vibration_magnitude(intensity);
            self.vibration = random_offset(rng, magnitude);
        } else if intensity < dynamics.threshold_low {
            self.vibration = Vec2::ZERO;
        } else {
            let keep = (1.0 - dynamics.settle_rate * dt).clamp(0.0, 1.0);
            self.vibration *= keep;
        }
    }

    /// Pushes this cell's sprite, preceded by its shadow when the style has one.
    pub fn draw(&self, style: &CellStyle, out: &mut Vec<Sprite>) {
        if self.is_expired() {
            return;
        }
        let extent = style.size.max(0.0) * self.scale();
        if extent <= 0.0 {
            return;
        }
        let size = Vec2::splat(extent);
        let position = self.draw_position();
        let opacity = style.opacity.clamp(0.0, 1.0);

        if let Some(shadow) = style.shadow {
            out.push(Sprite {
                position: position + Vec2::splat(shadow.offset),
                size,
                texture: shadow.texture,
                color: Vec4::new(1.0, 1.0, 1.0, shadow.opacity.clamp(0.0, 1.0) * opacity),
                depth: (self.depth - SHADOW_DEPTH_BIAS).max(0.0),
            });
        }

        let mut color = style.tint;
        color.w *= opacity;
        out.push(Sprite {
            position,
            size,
            texture: self.texture,
            color,
            depth: self.depth,
        });
    }
}
// --- End of File: cell.rs ---
