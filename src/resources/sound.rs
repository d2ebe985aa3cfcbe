//! Sound level and threshold value types.
//!
//! Both are clamped newtypes: any input outside the valid band is pulled back
//! into range instead of being rejected, and `NaN` collapses to the minimum.

use bevy_ecs::prelude::Resource;

fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Instantaneous ambient loudness in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SoundLevel(f32);

impl SoundLevel {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 255.0;
    pub const SILENT: SoundLevel = SoundLevel(0.0);

    /// Build a level, clamping into `[0, 255]`.
    pub fn new(value: f32) -> Self {
        SoundLevel(clamp_or_min(value, Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Boundary between "loud" and "quiet", in `[30, 230]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SoundThreshold(f32);

impl Default for SoundThreshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SoundThreshold {
    pub const MIN: f32 = 30.0;
    pub const MAX: f32 = 230.0;
    pub const DEFAULT: SoundThreshold = SoundThreshold(60.0);

    /// Build a threshold, clamping into `[30, 230]`.
    pub fn new(value: f32) -> Self {
        SoundThreshold(clamp_or_min(value, Self::MIN, Self::MAX))
    }

    /// Map a settings slider position in `[0, 1]` onto the threshold band,
    /// rounded to a whole value.
    pub fn from_slider_fraction(fraction: f32) -> Self {
        let fraction = clamp_or_min(fraction, 0.0, 1.0);
        Self::new((Self::MIN + fraction * (Self::MAX - Self::MIN)).round())
    }

    /// Inverse of [`SoundThreshold::from_slider_fraction`].
    pub fn slider_fraction(self) -> f32 {
        (self.0 - Self::MIN) / (Self::MAX - Self::MIN)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// `true` when `level` is strictly above the threshold.
    pub fn is_exceeded_by(self, level: SoundLevel) -> bool {
        level.value() > self.0
    }
}

/// Latest sound level known to a level's ECS world.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CurrentSoundLevel(pub SoundLevel);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_level_clamps() {
        assert_eq!(SoundLevel::new(-4.0).value(), 0.0);
        assert_eq!(SoundLevel::new(300.0).value(), 255.0);
        assert_eq!(SoundLevel::new(f32::NAN).value(), 0.0);
        assert_eq!(SoundLevel::new(42.5).value(), 42.5);
    }

    #[test]
    fn test_threshold_clamps_to_band() {
        assert_eq!(SoundThreshold::new(0.0).value(), 30.0);
        assert_eq!(SoundThreshold::new(999.0).value(), 230.0);
        assert_eq!(SoundThreshold::default().value(), 60.0);
    }

    #[test]
    fn test_slider_mapping() {
        assert_eq!(SoundThreshold::from_slider_fraction(0.0).value(), 30.0);
        assert_eq!(SoundThreshold::from_slider_fraction(1.0).value(), 230.0);
        assert_eq!(SoundThreshold::from_slider_fraction(0.15).value(), 60.0);
        assert_eq!(SoundThreshold::from_slider_fraction(2.0).value(), 230.0);
        assert!((SoundThreshold::new(130.0).slider_fraction() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict() {
        let t = SoundThreshold::new(60.0);
        assert!(!t.is_exceeded_by(SoundLevel::new(60.0)));
        assert!(t.is_exceeded_by(SoundLevel::new(60.01)));
    }
}
