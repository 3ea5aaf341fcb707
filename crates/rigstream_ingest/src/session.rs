//! # Stream Session
//!
//! Owns everything whose lifetime is bounded by one stream: the queues, the
//! bridge feeding them, the assembler maps, the completion clock and the
//! native source handle.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start──▶ Streaming ──finish──▶ Finished
//!   │                 │
//!   │                 └──cancel──▶ Cancelled
//!   └──start fails──▶ Failed
//! ```
//!
//! `finish` and `cancel` are idempotent. Dropping a session tears it down.

use std::sync::Arc;
use std::time::Instant;

use rigstream_shared::StreamManifest;

use crate::assembler::{CharacterClassifier, FrameAssembler};
use crate::bridge::{NativeEventBridge, NativeSource};
use crate::completion::CompletionDetector;
use crate::config::IngestConfig;
use crate::error::{StreamError, StreamResult};
use crate::queue::IngestQueues;

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not started.
    Idle,
    /// Native source running.
    Streaming,
    /// Completion fired; buffers retained.
    Finished,
    /// Cancelled; buffers cleared.
    Cancelled,
    /// Native source refused to start.
    Failed,
}

/// One stream's pipeline state.
pub struct StreamSession {
    queues: Arc<IngestQueues>,
    bridge: Option<Arc<NativeEventBridge>>,
    assembler: FrameAssembler,
    completion: CompletionDetector,
    source: Option<Box<dyn NativeSource>>,
    state: SessionState,
    manifest: StreamManifest,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("state", &self.state)
            .field("characters", &self.assembler.character_count())
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Creates an idle session. `manifest` supplies the roster used for
    /// classification and the optional session frame range.
    #[must_use]
    pub fn new(config: &IngestConfig, manifest: StreamManifest, now: Instant) -> Self {
        let classifier = CharacterClassifier::new(config, manifest.rigs.clone());
        Self {
            queues: Arc::new(IngestQueues::new()),
            bridge: None,
            assembler: FrameAssembler::new(classifier),
            completion: CompletionDetector::new(config.completion_grace(), now),
            source: None,
            state: SessionState::Idle,
            manifest,
        }
    }

    /// Starts `source` streaming from `locator`.
    ///
    /// # Errors
    ///
    /// - [`StreamError::AlreadyStarted`] if the session is not idle.
    /// - Whatever the source returns from `start`, typically
    ///   [`StreamError::InitFailed`]. The session is then `Failed`.
    pub fn start(&mut self, mut source: Box<dyn NativeSource>, locator: &str, now: Instant) -> StreamResult<()> {
        if self.state != SessionState::Idle {
            return Err(StreamError::AlreadyStarted);
        }

        let bridge = Arc::new(NativeEventBridge::new(Arc::clone(&self.queues), source.info()));
        if let Err(err) = source.start(locator, Arc::clone(&bridge)) {
            bridge.close();
            self.state = SessionState::Failed;
            tracing::error!(locator, error = %err, "stream failed to start");
            return Err(err);
        }

        self.completion.mark_progress(now);
        self.bridge = Some(bridge);
        self.source = Some(source);
        self.state = SessionState::Streaming;
        tracing::info!(locator, "stream started");
        Ok(())
    }

    /// Stops the source and closes the bridge, keeping assembled buffers.
    pub fn finish(&mut self) {
        if self.teardown() && self.state == SessionState::Streaming {
            self.state = SessionState::Finished;
            tracing::info!(characters = self.assembler.character_count(), "stream finished");
        }
    }

    /// Stops the source and discards queued records and assembled buffers.
    pub fn cancel(&mut self) {
        self.teardown();
        let dropped = self.queues.clear();
        self.assembler.clear();
        if self.state != SessionState::Cancelled {
            tracing::info!(dropped, "stream cancelled");
        }
        self.state = SessionState::Cancelled;
    }

    fn teardown(&mut self) -> bool {
        let Some(mut source) = self.source.take() else {
            return false;
        };
        if let Some(bridge) = &self.bridge {
            bridge.close();
        }
        source.stop();
        true
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the source is running.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::Streaming
    }

    /// The three queues.
    #[must_use]
    pub fn queues(&self) -> &Arc<IngestQueues> {
        &self.queues
    }

    /// Bridge of the running stream.
    #[must_use]
    pub fn bridge(&self) -> Option<&Arc<NativeEventBridge>> {
        self.bridge.as_ref()
    }

    /// Assembled buffers.
    #[must_use]
    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    /// Manifest supplied at construction.
    #[must_use]
    pub fn manifest(&self) -> &StreamManifest {
        &self.manifest
    }

    /// Completion clock.
    #[must_use]
    pub fn completion(&self) -> &CompletionDetector {
        &self.completion
    }

    /// Stream-wide metadata for `key` from the running source.
    ///
    /// # Errors
    ///
    /// [`StreamError::NotStarted`] unless the session is streaming.
    pub fn stream_info(&self, key: &str) -> StreamResult<Option<String>> {
        match (&self.bridge, self.state) {
            (Some(bridge), SessionState::Streaming) => Ok(bridge.query_info(key)),
            _ => Err(StreamError::NotStarted),
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&IngestQueues, &mut FrameAssembler, &mut CompletionDetector) {
        (&self.queues, &mut self.assembler, &mut self.completion)
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
