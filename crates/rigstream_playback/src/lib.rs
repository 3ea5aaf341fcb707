//! # RIGSTREAM Playback
//!
//! Plays assembled frame buffers back against an independent clock,
//! producing one blended pose per character per step.
//!
//! ## Architecture
//!
//! ```text
//! PlaybackClock ──▶ PlaybackCursor ──▶ PlaybackDirector ──▶ PoseSink
//!  (ticker or          (frame in          │
//!   time source)        session)          ├─ FrameSource (assembled buffers)
//!                                         └─ CharacterPlaybackState × N
//!                                              └─ Humanoid / Object rig
//! ```
//!
//! Everything here runs on the tick thread. No locks are taken.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod blend;
pub mod clock;
pub mod config;
pub mod director;
pub mod error;
pub mod pose;
pub mod rig;

pub use blend::{blend_factor, FollowBlend};
pub use clock::{FixedTicker, FrameTimeSource, PlaybackClock, PlaybackCursor, MAX_CATCH_UP_STEPS};
pub use config::{PlaybackConfig, TimeSourceConfig, HUMANOID_JOINTS};
pub use director::{FrameSource, PlaybackDirector};
pub use error::{PlaybackError, PlaybackResult};
pub use pose::{CharacterPose, PoseBuffer, PoseSink};
pub use rig::{Activity, CharacterPlaybackState, CharacterRig, HumanoidRig, ObjectRig};
