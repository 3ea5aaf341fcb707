//! # Simulated Native Source
//!
//! A [`NativeSource`] that replays a scripted event list through the bridge,
//! either inline from `start` or from its own producer thread.
//!
//! ```text
//! SimulationScript ──▶ SimulatedSource ──thread──▶ bridge.on_* ──▶ queues
//!                            ▲
//!          stop() ──shutdown channel──┘
//! ```
//!
//! Frames are scripted as raw `f64` buffers so the bridge's copy path is
//! exercised exactly as with the native library.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use rigstream_shared::constants::CATEGORY_INFO_KEY;
use rigstream_shared::{Quaternion, ReturnCode, SessionHeader, StreamManifest, Vec3};

use crate::bridge::{InfoQuery, NativeEventBridge, NativeSource};
use crate::error::{StreamError, StreamResult};

/// Range used by [`SimulationScript::from_manifest`] when the manifest has no header.
const FALLBACK_RANGE: SessionHeader = SessionHeader::new(0, 29);

/// One scripted native callback.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptedEvent {
    /// `onError`
    Error {
        /// Character id.
        character_id: String,
        /// Native code.
        code: i32,
        /// Description.
        description: String,
    },
    /// `onBounds`
    Bounds {
        /// Character id.
        character_id: String,
        /// First timestamp.
        begin: i32,
        /// Last timestamp.
        end: i32,
    },
    /// `onFrame`, with native-layout buffers.
    Frame {
        /// Character id.
        character_id: String,
        /// Timestamp.
        timestamp: i32,
        /// xyz.
        position: [f64; 3],
        /// `4·n` rotation components.
        rotations: Vec<f64>,
        /// `n` bone lengths.
        lengths: Vec<f64>,
        /// `3·n` offset components.
        offsets: Vec<f64>,
    },
}

impl ScriptedEvent {
    /// A synthetic frame with `joints` joints, slowly turning about Y.
    #[must_use]
    pub fn synthetic_frame(character_id: &str, timestamp: i32, lane: f32, joints: usize) -> Self {
        let t = timestamp as f32;
        let turn = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), t * 0.05);
        let mut rotations = Vec::with_capacity(joints * 4);
        let mut offsets = Vec::with_capacity(joints * 3);
        for j in 0..joints {
            rotations.extend(turn.to_array().map(f64::from));
            offsets.extend([0.0, f64::from(j as f32 * 0.1), 0.0]);
        }
        Self::Frame {
            character_id: character_id.to_string(),
            timestamp,
            position: [f64::from(t * 0.1), 0.0, f64::from(lane)],
            rotations,
            lengths: vec![0.1; joints],
            offsets,
        }
    }

    fn emit(&self, bridge: &NativeEventBridge) {
        match self {
            Self::Error {
                character_id,
                code,
                description,
            } => bridge.on_error(character_id, *code, description),
            Self::Bounds { character_id, begin, end } => bridge.on_bounds(character_id, *begin, *end),
            Self::Frame {
                character_id,
                timestamp,
                position,
                rotations,
                lengths,
                offsets,
            } => bridge.on_frame(character_id, *timestamp, position, rotations, lengths, offsets),
        }
    }
}

/// Static metadata answered by the simulated source.
#[derive(Clone, Debug, Default)]
pub struct SimulatedInfo {
    stream: HashMap<String, String>,
    characters: HashMap<(String, String), String>,
}

impl SimulatedInfo {
    /// Sets a stream-wide key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.stream.insert(key.into(), value.into());
    }

    /// Sets a per-character key.
    pub fn set_character(&mut self, character_id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) {
        self.characters
            .insert((character_id.into(), key.into()), value.into());
    }
}

impl InfoQuery for SimulatedInfo {
    fn query_info(&self, key: &str) -> Option<String> {
        self.stream.get(key).cloned()
    }

    fn query_character_info(&self, character_id: &str, key: &str) -> Option<String> {
        self.characters
            .get(&(character_id.to_string(), key.to_string()))
            .cloned()
    }
}

/// Ordered list of events plus metadata.
#[derive(Clone, Debug, Default)]
pub struct SimulationScript {
    events: Vec<ScriptedEvent>,
    info: SimulatedInfo,
    delay: Duration,
}

impl SimulationScript {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    #[must_use]
    pub fn push(mut self, event: ScriptedEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Bounds followed by every frame in `[begin, end]`.
    #[must_use]
    pub fn character(self, id: &str, begin: i32, end: i32, joints: usize) -> Self {
        self.character_with_early_frames(id, begin, end, joints, 0)
    }

    /// Like [`SimulationScript::character`], but the first `early` frames
    /// are delivered before the bounds.
    #[must_use]
    pub fn character_with_early_frames(mut self, id: &str, begin: i32, end: i32, joints: usize, early: usize) -> Self {
        let lane = self.events.len() as f32 * 0.01;
        let frames: Vec<_> = (begin..=end)
            .map(|ts| ScriptedEvent::synthetic_frame(id, ts, lane, joints))
            .collect();
        let split = early.min(frames.len());
        let (before, after) = frames.split_at(split);
        self.events.extend_from_slice(before);
        self.events.push(ScriptedEvent::Bounds {
            character_id: id.to_string(),
            begin,
            end,
        });
        self.events.extend_from_slice(after);
        self
    }

    /// Appends an error event.
    #[must_use]
    pub fn error(self, id: &str, code: ReturnCode, description: &str) -> Self {
        self.push(ScriptedEvent::Error {
            character_id: id.to_string(),
            code: code.as_raw(),
            description: description.to_string(),
        })
    }

    /// Declares a stream-wide key answered through [`InfoQuery`].
    #[must_use]
    pub fn with_info(mut self, key: &str, value: &str) -> Self {
        self.info.set(key, value);
        self
    }

    /// Declares a per-character category answered through [`InfoQuery`].
    #[must_use]
    pub fn with_category(mut self, id: &str, category: &str) -> Self {
        self.info.set_character(id, CATEGORY_INFO_KEY, category);
        self
    }

    /// Pause between events on the threaded producer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every roster entry over the header range, declaring its category.
    #[must_use]
    pub fn from_manifest(manifest: &StreamManifest, joints: usize) -> Self {
        let range = manifest.header.unwrap_or(FALLBACK_RANGE);
        manifest.rigs.iter().fold(Self::new(), |script, rig| {
            script
                .with_category(&rig.id, &rig.kind)
                .character(&rig.id, range.start_frame, range.end_frame, joints)
        })
    }

    /// Scripted events.
    #[must_use]
    pub fn events(&self) -> &[ScriptedEvent] {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the script is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// How a [`SimulatedSource`] delivers its script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayMode {
    /// All events are emitted from inside `start`, on the caller's thread.
    Blocking,
    /// Events are emitted from a dedicated producer thread.
    Threaded,
}

struct Producer {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Scripted stand-in for the native streaming library.
pub struct SimulatedSource {
    script: Arc<SimulationScript>,
    info: Arc<SimulatedInfo>,
    mode: ReplayMode,
    fail_with: Option<ReturnCode>,
    producer: Option<Producer>,
    emitted: Arc<AtomicUsize>,
    done: Arc<AtomicBool>,
}

impl std::fmt::Debug for SimulatedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedSource")
            .field("events", &self.script.len())
            .field("mode", &self.mode)
            .field("emitted", &self.emitted())
            .finish_non_exhaustive()
    }
}

impl SimulatedSource {
    /// Creates a source replaying `script`.
    #[must_use]
    pub fn new(script: SimulationScript, mode: ReplayMode) -> Self {
        let info = Arc::new(script.info.clone());
        Self {
            script: Arc::new(script),
            info,
            mode,
            fail_with: None,
            producer: None,
            emitted: Arc::new(AtomicUsize::new(0)),
            done: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A source whose `start` fails with `code`. [`ReturnCode::NoError`]
    /// starts normally.
    #[must_use]
    pub fn failing(code: ReturnCode) -> Self {
        let mut source = Self::new(SimulationScript::new(), ReplayMode::Blocking);
        source.fail_with = Some(code);
        source
    }

    /// Events delivered so far.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Shared counter of delivered events, readable after the source is boxed.
    #[must_use]
    pub fn emitted_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.emitted)
    }

    /// Whether the whole script has been delivered.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    fn replay(
        script: &SimulationScript,
        bridge: &NativeEventBridge,
        shutdown: Option<&Receiver<()>>,
        emitted: &AtomicUsize,
    ) -> bool {
        for event in &script.events {
            if let Some(rx) = shutdown {
                let stop = if script.delay.is_zero() {
                    !matches!(rx.try_recv(), Err(TryRecvError::Empty))
                } else {
                    !matches!(rx.recv_timeout(script.delay), Err(RecvTimeoutError::Timeout))
                };
                if stop {
                    return false;
                }
            }
            event.emit(bridge);
            emitted.fetch_add(1, Ordering::SeqCst);
        }
        true
    }
}

impl NativeSource for SimulatedSource {
    fn start(&mut self, locator: &str, bridge: Arc<NativeEventBridge>) -> StreamResult<()> {
        if let Some(code) = self.fail_with.filter(|code| !code.is_ok()) {
            return Err(StreamError::init_failed(code, format!("cannot open {locator}")));
        }
        if self.producer.is_some() {
            return Err(StreamError::AlreadyStarted);
        }

        match self.mode {
            ReplayMode::Blocking => {
                let complete = Self::replay(&self.script, &bridge, None, &self.emitted);
                self.done.store(complete, Ordering::SeqCst);
            }
            ReplayMode::Threaded => {
                let (shutdown, rx) = bounded(1);
                let script = Arc::clone(&self.script);
                let emitted = Arc::clone(&self.emitted);
                let done = Arc::clone(&self.done);
                let handle = std::thread::Builder::new()
                    .name("rigstream-sim".into())
                    .spawn(move || {
                        let complete = Self::replay(&script, &bridge, Some(&rx), &emitted);
                        done.store(complete, Ordering::SeqCst);
                        tracing::debug!(complete, "simulated replay ended");
                    })?;
                self.producer = Some(Producer { shutdown, handle });
            }
        }
        tracing::debug!(locator, events = self.script.len(), mode = ?self.mode, "simulated source started");
        Ok(())
    }

    fn stop(&mut self) {
        let Some(producer) = self.producer.take() else {
            return;
        };
        // The producer may already have exited and dropped its receiver.
        let _ = producer.shutdown.try_send(());
        if producer.handle.join().is_err() {
            tracing::warn!("simulated producer panicked");
        }
    }

    fn info(&self) -> Option<Arc<dyn InfoQuery>> {
        Some(Arc::clone(&self.info) as Arc<dyn InfoQuery>)
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop();
    }
}
