//! # RIGSTREAM
//!
//! Streamed motion-capture playback: the ingest and playback crates wired
//! into a single player driven from the host's update loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          StreamPlayer                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  NativeSource ──▶ NativeEventBridge ──▶ IngestQueues            │
//! │  (producer thread)                          │                   │
//! │                                             ▼                   │
//! │                        DrainScheduler ──▶ FrameAssembler        │
//! │                              │                  │               │
//! │                   spawn seam ▼                  ▼ buffers       │
//! │                        PlaybackDirector ──▶ PoseSink            │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: combined TOML configuration and manifest loading
//! - `player`: the per-tick drain + play orchestration

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod player;

pub use rigstream_ingest as ingest;
pub use rigstream_playback as playback;
pub use rigstream_shared as shared;

pub use config::{load_manifest, parse_manifest, RigstreamConfig};
pub use error::{RigstreamError, RigstreamResult};
pub use player::{StreamPlayer, UpdateStats, MAX_RETAINED_ERRORS};
