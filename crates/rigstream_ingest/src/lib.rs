//! # RIGSTREAM Ingest
//!
//! Turns an asynchronous native motion-capture stream into ordered,
//! randomly addressable per-character frame buffers.
//!
//! ## Architecture
//!
//! - **Bridge**: copies native callback buffers into owned records
//! - **Queues**: one lock-protected FIFO per record kind
//! - **Scheduler**: drains each queue up to a budget once per tick
//! - **Assembler**: bounds-gated buffer allocation and slot placement
//! - **Completion**: idle-grace detection of the end of the stream
//!
//! ## Threading Model
//!
//! ```text
//! NATIVE THREAD                      TICK THREAD
//!   |                                   |
//!   |-- on_frame ──▶ [frames queue] ───▶| DrainScheduler::tick
//!   |-- on_bounds ─▶ [bounds queue] ───▶|   ├─ FrameAssembler
//!   |-- on_error ──▶ [errors queue] ───▶|   └─ CompletionDetector
//!   |                                   |
//! ```
//!
//! Nothing but the queues is shared between the two threads.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rigstream_ingest::{DrainScheduler, IngestConfig, StreamSession};
//!
//! let config = IngestConfig::default();
//! let mut session = StreamSession::new(&config, manifest, Instant::now());
//! session.start(Box::new(source), "capture.rig", Instant::now())?;
//!
//! let mut scheduler = DrainScheduler::new(&config);
//! loop {
//!     scheduler.tick(&mut session, &mut consumer, Instant::now());
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod assembler;
pub mod bridge;
pub mod completion;
pub mod config;
pub mod error;
pub mod ffi;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod simulation;

pub use assembler::{
    AnnouncedCharacter, Announcement, CharacterClassifier, CharacterFrameBuffer, CharacterKind,
    CharacterRole, FrameAssembler, Placement,
};
pub use bridge::{InfoQuery, NativeEventBridge, NativeSource};
pub use completion::CompletionDetector;
pub use config::{DrainBudgets, IngestConfig};
pub use error::{StreamError, StreamResult};
pub use ffi::{CallbackRegistration, NativeCallbacks};
pub use queue::{IngestQueue, IngestQueues};
pub use scheduler::{DrainScheduler, IngestStats, StreamConsumer, TickReport};
pub use session::{SessionState, StreamSession};
pub use simulation::{ReplayMode, ScriptedEvent, SimulatedInfo, SimulatedSource, SimulationScript};
