//! # Playback Configuration
//!
//! ```toml
//! follow_sharpness = 0.4
//! reference_rate = 30.0
//! auto_spin = true
//!
//! [time_source]
//! frames_per_second = 30.0
//! looping = true
//! ```
//!
//! Without a `[time_source]` table playback runs on the fixed-rate ticker.

use rigstream_shared::constants::{
    FOLLOW_SHARPNESS, FRAMES_PER_SECOND, LOOP_DELAY_SECS, REFERENCE_RATE, SPIN_RATE_DEG, SPIN_THRESHOLD,
    TICKER_INITIAL_DELAY_SECS, TICKER_INTERVAL_SECS,
};
use rigstream_shared::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, PlaybackResult};

/// Joints on the standard humanoid capture rig.
pub const HUMANOID_JOINTS: usize = 20;

/// Settings for the decoupled frame time source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSourceConfig {
    /// Playback rate. Negative plays backwards.
    pub frames_per_second: f32,
    /// Wrap at the ends instead of stopping.
    pub looping: bool,
    /// Pause after wrapping, in seconds.
    pub loop_delay_secs: f32,
    /// Jump to a random frame every tick.
    pub random: bool,
    /// Seed for random mode.
    pub seed: u64,
}

impl Default for TimeSourceConfig {
    fn default() -> Self {
        Self {
            frames_per_second: FRAMES_PER_SECOND,
            looping: true,
            loop_delay_secs: LOOP_DELAY_SECS,
            random: false,
            seed: 0,
        }
    }
}

/// Playback settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Exponential smoothing constant in `[0, 1]`.
    pub follow_sharpness: f32,
    /// Rate the sharpness is expressed against, per second.
    pub reference_rate: f32,
    /// Fixed ticker interval, seconds.
    pub ticker_interval_secs: f32,
    /// Delay before the fixed ticker first fires, seconds.
    pub ticker_initial_delay_secs: f32,
    /// Decoupled time source. `None` selects the fixed ticker.
    pub time_source: Option<TimeSourceConfig>,
    /// Enable the airborne spin heuristic for objects.
    pub auto_spin: bool,
    /// Frame-to-frame displacement that counts as airborne.
    pub spin_threshold: f32,
    /// Spin rate while airborne, euler degrees per second.
    pub spin_rate_deg: [f32; 3],
    /// Joints per humanoid rig.
    pub humanoid_joints: usize,
    /// Per-joint rest pose, euler degrees. Missing entries are zero.
    pub rest_offsets_deg: Vec<[f32; 3]>,
    /// Corrective angles applied to every humanoid each tick.
    pub global_corrections: Option<Vec<[f32; 3]>>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            follow_sharpness: FOLLOW_SHARPNESS,
            reference_rate: REFERENCE_RATE,
            ticker_interval_secs: TICKER_INTERVAL_SECS,
            ticker_initial_delay_secs: TICKER_INITIAL_DELAY_SECS,
            time_source: None,
            auto_spin: true,
            spin_threshold: SPIN_THRESHOLD,
            spin_rate_deg: SPIN_RATE_DEG,
            humanoid_joints: HUMANOID_JOINTS,
            rest_offsets_deg: Vec::new(),
            global_corrections: None,
        }
    }
}

impl PlaybackConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidConfig`] for malformed TOML, otherwise
    /// whatever [`PlaybackConfig::validate`] reports.
    pub fn from_toml_str(text: &str) -> PlaybackResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| PlaybackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> PlaybackResult<()> {
        if !(0.0..=1.0).contains(&self.follow_sharpness) {
            return Err(PlaybackError::InvalidSharpness(self.follow_sharpness));
        }
        if !self.reference_rate.is_finite() || self.reference_rate <= 0.0 {
            return Err(PlaybackError::InvalidFrameRate(self.reference_rate));
        }
        if !self.ticker_interval_secs.is_finite() || self.ticker_interval_secs <= 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "ticker_interval_secs must be positive, got {}",
                self.ticker_interval_secs
            )));
        }
        if !self.ticker_initial_delay_secs.is_finite() || self.ticker_initial_delay_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "ticker_initial_delay_secs must be non-negative, got {}",
                self.ticker_initial_delay_secs
            )));
        }
        if !self.spin_threshold.is_finite() || self.spin_threshold < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "spin_threshold must be non-negative, got {}",
                self.spin_threshold
            )));
        }
        if let Some(ts) = &self.time_source {
            if !ts.frames_per_second.is_finite() {
                return Err(PlaybackError::InvalidFrameRate(ts.frames_per_second));
            }
            if !ts.loop_delay_secs.is_finite() || ts.loop_delay_secs < 0.0 {
                return Err(PlaybackError::InvalidConfig(format!(
                    "loop_delay_secs must be non-negative, got {}",
                    ts.loop_delay_secs
                )));
            }
        }
        Ok(())
    }

    /// Rest offsets for a humanoid, padded with zeros to `humanoid_joints`.
    #[must_use]
    pub fn rest_offsets(&self) -> Vec<Vec3> {
        (0..self.humanoid_joints)
            .map(|i| self.rest_offsets_deg.get(i).copied().map_or(Vec3::ZERO, Vec3::from_array))
            .collect()
    }

    /// Global corrections as vectors.
    #[must_use]
    pub fn corrections(&self) -> Option<Vec<Vec3>> {
        self.global_corrections
            .as_ref()
            .map(|c| c.iter().copied().map(Vec3::from_array).collect())
    }
}
