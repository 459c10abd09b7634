use glam::Vec2;
use rand::Rng;

// --- Helper Functions ---

#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Position of `value` between `from` and `to`, clamped to [0, 1].
#[inline]
pub fn inverse_lerp(from: f32, to: f32, value: f32) -> f32 {
    if (to - from).abs() <= f32::EPSILON {
        return if value >= to { 1.0 } else { 0.0 };
    }
    ((value - from) / (to - from)).clamp(0.0, 1.0)
}

// random_offset
pub fn random_offset<R: Rng + ?Sized>(rng: &mut R, max_delta: f32) -> Vec2 {
    if max_delta <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        rng.gen_range(-max_delta..=max_delta),
        rng.gen_range(-max_delta..=max_delta),
    )
}

/// Opacity of the zero-based layer `index`, fading by `difference` per layer.
pub fn layer_opacity(base: f32, difference: f32, index: usize) -> f32 {
    (base * difference.powi(index as i32)).clamp(0.0, 1.0)
}
