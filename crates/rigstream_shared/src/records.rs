//! # Stream Records
//!
//! Owned, immutable values produced by the native event bridge and consumed
//! exactly once on the tick thread.
//!
//! ## Event Flow
//! ```text
//! native callback ──> bridge (copy) ──> record ──> queue ──> scheduler
//! ```
//!
//! Records never borrow native memory: every buffer is copied before the
//! bridge returns control to the native caller.

use crate::math::{Quaternion, Vec3};
use crate::ReturnCode;

/// Character identifier as announced by the native source.
pub type CharacterId = String;

/// Per-character stream error delivered through the error callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Character the error concerns (empty for stream-wide errors).
    pub character_id: CharacterId,
    /// Raw native error code.
    pub error_code: i32,
    /// Human-readable description.
    pub description: String,
}

impl ErrorRecord {
    /// Creates a new error record.
    #[must_use]
    pub fn new(character_id: impl Into<CharacterId>, error_code: i32, description: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            error_code,
            description: description.into(),
        }
    }

    /// The native code decoded into a known return code.
    #[must_use]
    pub fn return_code(&self) -> ReturnCode {
        ReturnCode::from_raw(self.error_code)
    }
}

/// Temporal extent announced once per character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundsRecord {
    /// Character the bounds belong to.
    pub character_id: CharacterId,
    /// Category / prefab key declared by the source (may be empty).
    pub category: String,
    /// First timestamp (inclusive).
    pub begin_time: i32,
    /// Last timestamp (inclusive).
    pub end_time: i32,
}

impl BoundsRecord {
    /// Creates a bounds record.
    ///
    /// Reversed intervals are normalized so that `begin_time <= end_time`.
    #[must_use]
    pub fn new(character_id: impl Into<CharacterId>, category: impl Into<String>, begin_time: i32, end_time: i32) -> Self {
        let (begin_time, end_time) = if begin_time <= end_time {
            (begin_time, end_time)
        } else {
            (end_time, begin_time)
        };
        Self {
            character_id: character_id.into(),
            category: category.into(),
            begin_time,
            end_time,
        }
    }

    /// Number of frames in the interval: `end - begin + 1`.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        (i64::from(self.end_time) - i64::from(self.begin_time) + 1) as usize
    }

    /// Whether `timestamp` lies within `[begin_time, end_time]`.
    #[must_use]
    pub fn contains(&self, timestamp: i32) -> bool {
        timestamp >= self.begin_time && timestamp <= self.end_time
    }

    /// Buffer slot for `timestamp`, if it lies within the bounds.
    #[must_use]
    pub fn slot_of(&self, timestamp: i32) -> Option<usize> {
        self.contains(timestamp)
            .then(|| (i64::from(timestamp) - i64::from(self.begin_time)) as usize)
    }
}

/// One timestamped pose sample for one character.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    /// Character this frame belongs to.
    pub character_id: CharacterId,
    /// Native timestamp (frame number).
    pub timestamp: i32,
    /// Root position.
    pub root_position: Vec3,
    /// Per-joint rotations, joint 0 is the pelvis.
    pub bone_rotations: Vec<Quaternion>,
    /// Per-bone lengths.
    pub bone_lengths: Vec<f32>,
    /// Per-bone offsets.
    pub bone_offsets: Vec<Vec3>,
}

impl FrameRecord {
    /// Creates a frame with only a root position (no skeletal data).
    #[must_use]
    pub fn root_only(character_id: impl Into<CharacterId>, timestamp: i32, root_position: Vec3) -> Self {
        Self {
            character_id: character_id.into(),
            timestamp,
            root_position,
            bone_rotations: Vec::new(),
            bone_lengths: Vec::new(),
            bone_offsets: Vec::new(),
        }
    }

    /// Builder-style setter for joint rotations.
    #[must_use]
    pub fn with_rotations(mut self, rotations: Vec<Quaternion>) -> Self {
        self.bone_rotations = rotations;
        self
    }
}
