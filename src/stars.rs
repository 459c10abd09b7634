// File: stars.rs
use crate::constants::*;
use crate::sprites::{Sprite, TextureId};
use crate::utils::lerp;
use glam::{Vec2, Vec4};
use rand::Rng;
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec2,
    pub size: f32,
    /// 0 is far away, 1 is close.
    pub parallax: f32,
}

/// Background dots drifting right, faster when close and when loud.
#[derive(Debug, Clone)]
pub struct Starfield {
    stars: Vec<Star>,
    bounds: Vec2,
    texture: TextureId,
}

impl Starfield {
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        viewport: PhysicalSize<u32>,
        texture: TextureId,
        rng: &mut R,
    ) -> Self {
        let bounds = Vec2::new(viewport.width as f32, viewport.height as f32);
        let stars = (0..count)
            .map(|_| Star {
                position: Vec2::new(
                    rng.gen_range(0.0..=bounds.x.max(1.0)),
                    rng.gen_range(0.0..=bounds.y.max(1.0)),
                ),
                size: rng.gen_range(STAR_MIN_SIZE..=STAR_MAX_SIZE),
                parallax: rng.gen_range(0.0..=1.0),
            })
            .collect();
        Self {
            stars,
            bounds,
            texture,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn speed(parallax: f32, sound_intensity: f32) -> f32 {
        STAR_BASE_SPEED_MULTIPLIER * parallax
            + sound_intensity / 100.0 * STAR_SOUND_INTENSITY_MULTIPLIER
    }

    pub fn update<R: Rng + ?Sized>(&mut self, delta_time: f32, sound_intensity: f32, rng: &mut R) {
        let intensity = sound_intensity.clamp(0.0, 100.0);
        let jitter = intensity > STAR_VIBRATION_THRESHOLD;
        for star in &mut self.stars {
            star.position.x += Self::speed(star.parallax, intensity) * delta_time;
            if star.position.x > self.bounds.x {
                star.position.x -= self.bounds.x + star.size;
            }
            if jitter {
                let amplitude = intensity / 100.0 * STAR_VIBRATION_MULTIPLIER * (1.0 - star.parallax);
                if amplitude > 0.0 {
                    star.position.y += rng.gen_range(-amplitude..=amplitude);
                }
                star.position.y = star.position.y.rem_euclid(self.bounds.y.max(1.0));
            }
        }
    }

    pub fn draw(&self, out: &mut Vec<Sprite>) {
        out.extend(self.stars.iter().map(|star| {
            let opacity = lerp(0.3, 1.0, star.parallax);
            Sprite {
                position: star.position,
                size: Vec2::splat(star.size),
                texture: self.texture,
                color: Vec4::new(1.0, 1.0, 1.0, opacity),
                depth: star.parallax * STARFIELD_DEPTH_SPAN,
            }
        }));
    }

    /// Spreads the existing stars over a new window size.
    pub fn resize(&mut self, viewport: PhysicalSize<u32>) {
        let bounds = Vec2::new(viewport.width as f32, viewport.height as f32);
        if bounds.x <= 0.0 || bounds.y <= 0.0 || bounds == self.bounds {
            return;
        }
        let scale = bounds / self.bounds.max(Vec2::ONE);
        for star in &mut self.stars {
            star.position *= scale;
        }
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field(seed: u64) -> Starfield {
        let mut rng = StdRng::seed_from_u64(seed);
        Starfield::new(50, PhysicalSize::new(200, 100), TextureId(0), &mut rng)
    }

    #[test]
    fn stars_move_right_and_wrap() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut stars = field(1);
        for _ in 0..2_000 {
            stars.update(0.1, 0.0, &mut rng);
            for star in stars.stars() {
                assert!(star.position.x <= 200.0);
                assert!((0.0..=100.0).contains(&star.position.y));
            }
        }
    }

    #[test]
    fn sound_speeds_stars_up() {
        assert!(Starfield::speed(0.5, 100.0) > Starfield::speed(0.5, 0.0));
        assert!(Starfield::speed(1.0, 0.0) > Starfield::speed(0.1, 0.0));
    }

    #[test]
    fn quiet_stars_do_not_jitter() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut stars = field(2);
        let before: Vec<f32> = stars.stars().iter().map(|s| s.position.y).collect();
        stars.update(0.05, STAR_VIBRATION_THRESHOLD, &mut rng);
        let after: Vec<f32> = stars.stars().iter().map(|s| s.position.y).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn stars_sit_behind_every_layer() {
        let stars = field(3);
        let mut sprites = Vec::new();
        stars.draw(&mut sprites);
        assert_eq!(sprites.len(), 50);
        let nearest_layer = LAYER_DEPTHS.iter().copied().fold(f32::MAX, f32::min);
        assert!(sprites.iter().all(|s| s.depth <= STARFIELD_DEPTH_SPAN));
        assert!(STARFIELD_DEPTH_SPAN < nearest_layer - SHADOW_DEPTH_BIAS);
        assert!(sprites.iter().all(|s| (0.3..=1.0).contains(&s.color.w)));
    }
}
