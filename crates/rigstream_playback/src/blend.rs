//! # Follow Blend
//!
//! Frame-rate independent exponential smoothing:
//!
//! ```text
//! b = 1 - (1 - sharpness)^(dt · reference_rate)
//! ```
//!
//! At `dt = 1 / reference_rate` the factor equals `sharpness`. The very first
//! frame of playback uses `b = 1` so characters snap instead of gliding in
//! from the origin.

/// Blend factor for one step of `dt` seconds, clamped to `[0, 1]`.
#[must_use]
pub fn blend_factor(sharpness: f32, dt: f32, reference_rate: f32) -> f32 {
    let exponent = (dt * reference_rate).max(0.0);
    (1.0 - (1.0 - sharpness).powf(exponent)).clamp(0.0, 1.0)
}

/// Sharpness plus the rate it is expressed against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowBlend {
    /// Smoothing constant.
    pub sharpness: f32,
    /// Reference rate, per second.
    pub reference_rate: f32,
}

impl FollowBlend {
    /// Creates a blend.
    #[must_use]
    pub const fn new(sharpness: f32, reference_rate: f32) -> Self {
        Self {
            sharpness,
            reference_rate,
        }
    }

    /// Factor for a step of `dt` seconds; `1.0` on the first playback frame.
    #[must_use]
    pub fn factor(&self, dt: f32, first_frame: bool) -> f32 {
        if first_frame {
            1.0
        } else {
            blend_factor(self.sharpness, dt, self.reference_rate)
        }
    }
}
