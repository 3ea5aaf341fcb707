//! # Pipeline Constants
//!
//! Defaults shared by ingest and playback. Every one of these can be
//! overridden through configuration.

// =============================================================================
// INGEST
// =============================================================================

/// Fallback category for characters the roster does not recognize.
pub const DEFAULT_CATEGORY: &str = "player";

/// Category that marks a rigid (non-skeletal) object.
pub const SOLID_OBJECT_CATEGORY: &str = "solidObject";

/// Idle time after the last progress before the stream may be declared finished.
pub const COMPLETION_GRACE_SECS: f32 = 0.5;

/// Per-tick error budget in verbose mode.
pub const VERBOSE_ERROR_BUDGET: usize = 15;

/// Per-tick bounds budget in verbose mode.
pub const VERBOSE_BOUNDS_BUDGET: usize = 30;

/// Per-tick frame budget in verbose mode.
pub const VERBOSE_FRAME_BUDGET: usize = 500;

/// Per-tick frame budget outside verbose mode.
pub const DEFAULT_FRAME_BUDGET: usize = 10_000;

/// Character-id suffix that marks a referee.
pub const REFEREE_SUFFIX: &str = "5";

/// Character-info key queried for the declared category.
pub const CATEGORY_INFO_KEY: &str = "type";

// =============================================================================
// PLAYBACK
// =============================================================================

/// Exponential smoothing constant for frame following.
pub const FOLLOW_SHARPNESS: f32 = 0.4;

/// Rate (per second) the smoothing constant is expressed against.
pub const REFERENCE_RATE: f32 = 30.0;

/// Default ticker interval when no time source is supplied (30 Hz).
pub const TICKER_INTERVAL_SECS: f32 = 1.0 / 30.0;

/// Delay before the default ticker first fires.
pub const TICKER_INITIAL_DELAY_SECS: f32 = 1.0;

/// Frame-to-frame distance above which an object is considered airborne.
pub const SPIN_THRESHOLD: f32 = 3.0;

/// Airborne spin rate, euler degrees per second (about 10 rev/s around Z).
pub const SPIN_RATE_DEG: [f32; 3] = [0.0, 0.0, 3600.0];

/// Default frame time source rate.
pub const FRAMES_PER_SECOND: f32 = 30.0;

/// Default pause when a time source wraps, in seconds.
pub const LOOP_DELAY_SECS: f32 = 1.0;
