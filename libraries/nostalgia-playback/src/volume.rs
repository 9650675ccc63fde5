//! Linear volume level
//!
//! Views hand in slider values in [0, 1] (a range input with step 0.01).
//! The level is stored linearly and handed to the backend unchanged; any
//! perceptual curve belongs to the backend's output stage.

/// Volume level in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f32,
}

impl Volume {
    /// Create a volume, clamping into [0, 1]
    ///
    /// NaN falls back to full volume.
    pub fn new(level: f32) -> Self {
        let mut volume = Self { level: 1.0 };
        volume.set_level(level);
        volume
    }

    /// Set the level, clamping into [0, 1]
    ///
    /// Returns the stored level, or `None` if `level` was NaN and the
    /// previous level was kept.
    pub fn set_level(&mut self, level: f32) -> Option<f32> {
        if level.is_nan() {
            return None;
        }
        self.level = level.clamp(0.0, 1.0);
        Some(self.level)
    }

    /// Current level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Apply volume to an interleaved buffer (in-place)
    pub fn apply(&self, buffer: &mut [f32]) {
        if self.level == 0.0 {
            buffer.fill(0.0);
        } else if self.level != 1.0 {
            for sample in buffer.iter_mut() {
                *sample *= self.level;
            }
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range() {
        let mut volume = Volume::default();
        assert_eq!(volume.set_level(1.7), Some(1.0));
        assert_eq!(volume.set_level(-0.2), Some(0.0));
        assert_eq!(volume.set_level(0.35), Some(0.35));
        assert_eq!(volume.level(), 0.35);
    }

    #[test]
    fn nan_keeps_previous_level() {
        let mut volume = Volume::new(0.6);
        assert_eq!(volume.set_level(f32::NAN), None);
        assert_eq!(volume.level(), 0.6);
        assert_eq!(Volume::new(f32::NAN).level(), 1.0);
    }

    #[test]
    fn apply_scales_samples() {
        let mut buffer = [0.5f32, -0.5, 1.0, -1.0];
        Volume::new(0.5).apply(&mut buffer);
        assert_eq!(buffer, [0.25, -0.25, 0.5, -0.5]);

        let mut buffer = [0.5f32, -0.5];
        Volume::new(0.0).apply(&mut buffer);
        assert_eq!(buffer, [0.0, 0.0]);

        let mut buffer = [0.5f32, -0.5];
        Volume::new(1.0).apply(&mut buffer);
        assert_eq!(buffer, [0.5, -0.5]);
    }
}
