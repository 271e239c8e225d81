//! Volume control
//!
//! Volume is a linear level in 0.0-1.0, clamped on every set.

use crate::types::DEFAULT_VOLUME;

/// Volume controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f32,
}

impl Volume {
    /// Create new volume controller, clamping `level`
    pub fn new(level: f32) -> Self {
        let mut volume = Self {
            level: DEFAULT_VOLUME,
        };
        volume.set_level(level);
        volume
    }

    /// Set volume level, clamped to 0.0-1.0
    ///
    /// NaN leaves the level unchanged. Returns whether the level changed.
    pub fn set_level(&mut self, level: f32) -> bool {
        if level.is_nan() {
            return false;
        }
        let level = level.clamp(0.0, 1.0);
        let changed = level != self.level;
        self.level = level;
        changed
    }

    /// Get current volume level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Silence, or restore the default level when already silent
    pub fn toggle_mute(&mut self) {
        self.level = if self.level == 0.0 { DEFAULT_VOLUME } else { 0.0 };
    }

    /// Check if silent
    pub fn is_muted(&self) -> bool {
        self.level == 0.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}
