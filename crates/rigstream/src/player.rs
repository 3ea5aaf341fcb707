//! # Stream Player
//!
//! One host tick:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. DRAIN    DrainScheduler::tick                             │
//! │             ├─ errors  ──▶ reported_errors + tracing         │
//! │             ├─ bounds  ──▶ FrameAssembler + director spawn   │
//! │             └─ frames  ──▶ FrameAssembler slots              │
//! │                                                              │
//! │ 2. PLAY     PlaybackDirector::tick                           │
//! │             └─ reads assembled buffers, writes poses         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Playback starts as soon as the first character is announced and keeps
//! running after the stream finishes.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rigstream_ingest::{
    AnnouncedCharacter, DrainScheduler, IngestStats, NativeSource, SessionState, StreamConsumer, StreamSession,
    TickReport,
};
use rigstream_playback::{PlaybackDirector, PoseSink};
use rigstream_shared::{ErrorRecord, StreamManifest};

use crate::config::RigstreamConfig;
use crate::error::RigstreamResult;

/// Keeps at most this many reported errors; older ones are dropped.
pub const MAX_RETAINED_ERRORS: usize = 256;

/// Outcome of one [`StreamPlayer::update_at`] call.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateStats {
    /// What the drain did.
    pub drain: TickReport,
    /// Playback steps played.
    pub steps: u32,
    /// Time spent draining.
    pub drain_time: Duration,
    /// Time spent playing.
    pub playback_time: Duration,
}

/// Spawn and error seam between the scheduler and the director.
struct PlayerSeam<'a> {
    director: &'a mut PlaybackDirector,
    errors: &'a mut VecDeque<ErrorRecord>,
}

impl StreamConsumer for PlayerSeam<'_> {
    fn spawn_character(&mut self, character: &AnnouncedCharacter) {
        self.director.add_character(character.clone());
    }

    fn report_error(&mut self, error: &ErrorRecord) {
        tracing::error!(
            character = %error.character_id,
            code = error.error_code,
            description = %error.description,
            "character stream error"
        );
        if self.errors.len() == MAX_RETAINED_ERRORS {
            self.errors.pop_front();
        }
        self.errors.push_back(error.clone());
    }
}

/// Drives ingestion and playback from the host's update loop.
pub struct StreamPlayer {
    session: StreamSession,
    scheduler: DrainScheduler,
    director: PlaybackDirector,
    errors: VecDeque<ErrorRecord>,
    updates: u64,
}

impl StreamPlayer {
    /// Builds an idle player. The manifest header, when present, fixes the
    /// playback range.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration field.
    pub fn new(config: &RigstreamConfig, manifest: StreamManifest, now: Instant) -> RigstreamResult<Self> {
        config.validate()?;
        let director = PlaybackDirector::new(config.playback.clone(), manifest.header)?;
        Ok(Self {
            session: StreamSession::new(&config.ingest, manifest, now),
            scheduler: DrainScheduler::new(&config.ingest),
            director,
            errors: VecDeque::with_capacity(MAX_RETAINED_ERRORS),
            updates: 0,
        })
    }

    /// Starts streaming from `source`.
    ///
    /// # Errors
    ///
    /// Returns the session's start failure; the player is unusable afterwards.
    pub fn start(&mut self, source: Box<dyn NativeSource>, locator: &str, now: Instant) -> RigstreamResult<()> {
        self.session.start(source, locator, now)?;
        Ok(())
    }

    /// One host tick at wall-clock time.
    pub fn update<S>(&mut self, dt: f32, sink: &mut S) -> UpdateStats
    where
        S: PoseSink + ?Sized,
    {
        self.update_at(Instant::now(), dt, sink)
    }

    /// One host tick: drain the queues at `now`, then advance playback by `dt`.
    pub fn update_at<S>(&mut self, now: Instant, dt: f32, sink: &mut S) -> UpdateStats
    where
        S: PoseSink + ?Sized,
    {
        let drain_start = Instant::now();
        let mut seam = PlayerSeam {
            director: &mut self.director,
            errors: &mut self.errors,
        };
        let drain = self.scheduler.tick(&mut self.session, &mut seam, now);
        let drain_time = drain_start.elapsed();

        let play_start = Instant::now();
        let steps = self.director.tick(dt, self.session.assembler(), sink);
        let playback_time = play_start.elapsed();

        self.updates += 1;
        if drain.finished {
            tracing::info!(
                updates = self.updates,
                characters = self.director.character_count(),
                "stream complete, playback continues from buffers"
            );
        }
        UpdateStats {
            drain,
            steps,
            drain_time,
            playback_time,
        }
    }

    /// Stream-wide metadata for `key` from the running source.
    ///
    /// # Errors
    ///
    /// Fails once the stream is no longer running.
    pub fn stream_info(&self, key: &str) -> RigstreamResult<Option<String>> {
        Ok(self.session.stream_info(key)?)
    }

    /// Jumps playback to `frame`, relative to the session start.
    pub fn seek(&mut self, frame: usize) {
        self.director.seek(frame);
    }

    /// Stops the stream and drops everything assembled so far.
    pub fn cancel(&mut self) {
        self.session.cancel();
        self.director.clear();
    }

    /// Whether the completion detector has fired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.state() == SessionState::Finished
    }

    /// Session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Ingest counters.
    #[must_use]
    pub fn stats(&self) -> &IngestStats {
        self.scheduler.stats()
    }

    /// Most recent per-character errors, oldest first.
    #[must_use]
    pub fn reported_errors(&self) -> &VecDeque<ErrorRecord> {
        &self.errors
    }

    /// Host ticks so far.
    #[must_use]
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// The ingest session.
    #[must_use]
    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    /// The playback director.
    #[must_use]
    pub fn director(&self) -> &PlaybackDirector {
        &self.director
    }

    /// Mutable director, for clock control (pause, rate, corrections).
    pub fn director_mut(&mut self) -> &mut PlaybackDirector {
        &mut self.director
    }
}

impl std::fmt::Debug for StreamPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPlayer")
            .field("state", &self.session.state())
            .field("characters", &self.director.character_count())
            .field("errors", &self.errors.len())
            .field("updates", &self.updates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigstream_ingest::{ReplayMode, SimulatedSource, SimulationScript};
    use rigstream_playback::PoseBuffer;
    use rigstream_shared::ReturnCode;

    fn quick_config() -> RigstreamConfig {
        let mut config = RigstreamConfig::default();
        config.playback.ticker_initial_delay_secs = 0.0;
        config
    }

    fn blocking(script: SimulationScript) -> Box<SimulatedSource> {
        Box::new(SimulatedSource::new(script, ReplayMode::Blocking))
    }

    #[test]
    fn test_announced_characters_reach_the_director() {
        let t0 = Instant::now();
        let mut player = StreamPlayer::new(&quick_config(), StreamManifest::default(), t0).unwrap();
        let script = SimulationScript::new().character("p1", 0, 4, 3).character("p2", 2, 6, 3);
        player.start(blocking(script), "sim", t0).unwrap();

        let mut sink = PoseBuffer::new();
        let stats = player.update_at(t0, 0.0, &mut sink);
        assert_eq!(stats.drain.bounds, 2);
        assert_eq!(player.director().character_count(), 2);
        assert!(player.director().character("p2").is_some());
    }

    #[test]
    fn test_errors_are_retained_and_bounded() {
        let t0 = Instant::now();
        let mut player = StreamPlayer::new(&quick_config(), StreamManifest::default(), t0).unwrap();
        let mut script = SimulationScript::new();
        for i in 0..MAX_RETAINED_ERRORS + 4 {
            script = script.error("p1", ReturnCode::BadFileData, &format!("corrupt block {i}"));
        }
        player.start(blocking(script), "sim", t0).unwrap();

        let mut sink = PoseBuffer::new();
        player.update_at(t0, 0.0, &mut sink);
        let errors = player.reported_errors();
        assert_eq!(errors.len(), MAX_RETAINED_ERRORS);
        assert_eq!(errors.front().unwrap().description, "corrupt block 4");
        assert_eq!(
            errors.back().unwrap().description,
            format!("corrupt block {}", MAX_RETAINED_ERRORS + 3)
        );
        assert_eq!(player.stats().errors_reported, (MAX_RETAINED_ERRORS + 4) as u64);
    }

    #[test]
    fn test_cancel_clears_director() {
        let t0 = Instant::now();
        let mut player = StreamPlayer::new(&quick_config(), StreamManifest::default(), t0).unwrap();
        player
            .start(blocking(SimulationScript::new().character("p1", 0, 9, 2)), "sim", t0)
            .unwrap();
        let mut sink = PoseBuffer::new();
        player.update_at(t0, 0.0, &mut sink);
        assert_eq!(player.director().character_count(), 1);

        player.cancel();
        player.cancel();
        assert_eq!(player.state(), SessionState::Cancelled);
        assert_eq!(player.director().character_count(), 0);
        assert!(player.session().assembler().buffer("p1").is_none());
    }
}
