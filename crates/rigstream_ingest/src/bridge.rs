//! # Native Event Bridge
//!
//! Converts native callback invocations into owned records and enqueues them.
//!
//! ```text
//! ┌──────────────┐   borrowed    ┌──────────────┐   owned    ┌──────────────┐
//! │ Native       │ ────────────▶ │ Bridge       │ ─────────▶ │ IngestQueues │
//! │ producer     │   buffers     │ (copy only)  │  records   │ (3 × Mutex)  │
//! └──────────────┘               └──────────────┘            └──────────────┘
//! ```
//!
//! The bridge has no business logic. Every slice handed to it is only valid
//! for the duration of the call, so everything is copied before returning.
//! After [`NativeEventBridge::close`] all further events are counted and
//! dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rigstream_shared::constants::CATEGORY_INFO_KEY;
use rigstream_shared::{BoundsRecord, ErrorRecord, FrameRecord, Quaternion, Vec3};

use crate::error::StreamResult;
use crate::queue::IngestQueues;

/// Read-only metadata queries answered by the native source.
pub trait InfoQuery: Send + Sync {
    /// Stream-wide info for `key`.
    fn query_info(&self, key: &str) -> Option<String>;

    /// Per-character info for `key`.
    fn query_character_info(&self, character_id: &str, key: &str) -> Option<String>;
}

/// The external streaming engine.
///
/// Implementations invoke the bridge from their own thread between `start`
/// and `stop`. `stop` must not return while a callback is still running and
/// must be safe to call more than once.
pub trait NativeSource: Send {
    /// Starts streaming from `locator`, delivering events to `bridge`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InitFailed`](crate::StreamError::InitFailed)
    /// if the source cannot start.
    fn start(&mut self, locator: &str, bridge: Arc<NativeEventBridge>) -> StreamResult<()>;

    /// Stops streaming and releases the native handle.
    fn stop(&mut self);

    /// Metadata query handle, if the source supports one.
    fn info(&self) -> Option<Arc<dyn InfoQuery>>;
}

/// Adapter from native notifications to queued records.
pub struct NativeEventBridge {
    queues: Arc<IngestQueues>,
    info: Option<Arc<dyn InfoQuery>>,
    accepting: AtomicBool,
    discarded: AtomicU64,
}

impl std::fmt::Debug for NativeEventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEventBridge")
            .field("accepting", &self.is_accepting())
            .field("discarded", &self.discarded())
            .finish_non_exhaustive()
    }
}

impl NativeEventBridge {
    /// Creates a bridge feeding `queues`.
    #[must_use]
    pub fn new(queues: Arc<IngestQueues>, info: Option<Arc<dyn InfoQuery>>) -> Self {
        Self {
            queues,
            info,
            accepting: AtomicBool::new(true),
            discarded: AtomicU64::new(0),
        }
    }

    /// Stream-wide metadata from the source, if it answers queries.
    #[must_use]
    pub fn query_info(&self, key: &str) -> Option<String> {
        self.info.as_ref().and_then(|info| info.query_info(key))
    }

    /// Error notification.
    pub fn on_error(&self, character_id: &str, error_code: i32, description: &str) {
        if !self.admit() {
            return;
        }
        self.queues
            .errors
            .enqueue(ErrorRecord::new(character_id, error_code, description));
    }

    /// Bounds announcement. The declared category is looked up through the
    /// info handle; an absent answer leaves it empty.
    pub fn on_bounds(&self, character_id: &str, begin_time: i32, end_time: i32) {
        if !self.admit() {
            return;
        }
        let category = self
            .info
            .as_ref()
            .and_then(|info| info.query_character_info(character_id, CATEGORY_INFO_KEY))
            .unwrap_or_default();
        self.queues
            .bounds
            .enqueue(BoundsRecord::new(character_id, category, begin_time, end_time));
    }

    /// Frame notification.
    ///
    /// `rotations` holds `4·n` components, `offsets` holds `3·n`. Trailing
    /// partial tuples are ignored and a short position is zero-padded.
    pub fn on_frame(
        &self,
        character_id: &str,
        timestamp: i32,
        position: &[f64],
        rotations: &[f64],
        lengths: &[f64],
        offsets: &[f64],
    ) {
        if !self.admit() {
            return;
        }

        let mut xyz = [0.0f64; 3];
        for (dst, src) in xyz.iter_mut().zip(position) {
            *dst = *src;
        }

        let quats: &[[f64; 4]] = bytemuck::cast_slice(&rotations[..rotations.len() - rotations.len() % 4]);
        let offs: &[[f64; 3]] = bytemuck::cast_slice(&offsets[..offsets.len() - offsets.len() % 3]);

        self.queues.frames.enqueue(FrameRecord {
            character_id: character_id.to_owned(),
            timestamp,
            root_position: Vec3::from_f64(xyz),
            bone_rotations: quats.iter().copied().map(Quaternion::from_f64).collect(),
            bone_lengths: lengths.iter().map(|l| *l as f32).collect(),
            bone_offsets: offs.iter().copied().map(Vec3::from_f64).collect(),
        });
    }

    /// Stops accepting events. Later callbacks are dropped.
    pub fn close(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    /// Whether events are still being queued.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Events dropped after close.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Queues this bridge feeds.
    #[must_use]
    pub fn queues(&self) -> &Arc<IngestQueues> {
        &self.queues
    }

    fn admit(&self) -> bool {
        if self.is_accepting() {
            true
        } else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}
