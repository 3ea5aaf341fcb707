//! # Playback Director
//!
//! Drives every character's playback state from one clock.
//!
//! ## Per Step
//!
//! ```text
//! absolute = session_start + cursor
//! for each character:
//!     absolute in bounds?  ── yes ──▶ frame = buffer[absolute - begin]
//!                          │          state.animate(frame, b)  ──▶ sink
//!                          └─ no ───▶ state.deactivate()       ──▶ sink
//! advance cursor (ticker: +1, time source: follow its frame)
//! ```
//!
//! `b` is forced to 1 while the cursor sits on the first frame.

use std::collections::BTreeMap;

use rigstream_ingest::{AnnouncedCharacter, FrameAssembler};
use rigstream_shared::{CharacterId, FrameRecord, SessionHeader, Vec3};

use crate::blend::FollowBlend;
use crate::clock::{FixedTicker, FrameTimeSource, PlaybackClock, PlaybackCursor};
use crate::config::PlaybackConfig;
use crate::error::PlaybackResult;
use crate::pose::PoseSink;
use crate::rig::CharacterPlaybackState;

/// Random access to assembled frames.
pub trait FrameSource {
    /// Frame buffered for `character_id` at absolute `timestamp`.
    fn frame_at(&self, character_id: &str, timestamp: i32) -> Option<&FrameRecord>;
}

impl FrameSource for FrameAssembler {
    fn frame_at(&self, character_id: &str, timestamp: i32) -> Option<&FrameRecord> {
        self.buffer(character_id).and_then(|b| b.frame_at(timestamp))
    }
}

/// Session-wide frame range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrameRange {
    start: i32,
    end: i32,
}

impl FrameRange {
    fn frame_count(self) -> usize {
        SessionHeader::new(self.start, self.end).frame_count()
    }
}

/// Owns the clock, the cursor and all character playback states.
#[derive(Debug)]
pub struct PlaybackDirector {
    config: PlaybackConfig,
    blend: FollowBlend,
    clock: PlaybackClock,
    cursor: PlaybackCursor,
    header: Option<SessionHeader>,
    range: Option<FrameRange>,
    characters: BTreeMap<CharacterId, CharacterPlaybackState>,
    corrections: Option<Vec<Vec3>>,
    steps: u64,
}

impl PlaybackDirector {
    /// Creates a director. `header` fixes the session range; without one the
    /// range grows to cover every added character.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting in `config`.
    pub fn new(config: PlaybackConfig, header: Option<SessionHeader>) -> PlaybackResult<Self> {
        config.validate()?;
        let range = header.map(|h| FrameRange {
            start: h.start_frame,
            end: h.end_frame,
        });
        let frame_count = range.map_or(0, FrameRange::frame_count);
        let clock = match &config.time_source {
            Some(ts) => PlaybackClock::TimeSource(FrameTimeSource::from_config(ts, 0, last_index(frame_count))),
            None => PlaybackClock::Ticker(FixedTicker::new(
                config.ticker_interval_secs,
                config.ticker_initial_delay_secs,
            )),
        };
        Ok(Self {
            blend: FollowBlend::new(config.follow_sharpness, config.reference_rate),
            corrections: config.corrections(),
            config,
            clock,
            cursor: PlaybackCursor::new(frame_count),
            header,
            range,
            characters: BTreeMap::new(),
            steps: 0,
        })
    }

    /// Registers a newly announced character.
    pub fn add_character(&mut self, character: AnnouncedCharacter) {
        if self.header.is_none() {
            let b = &character.bounds;
            let range = self.range.map_or(
                FrameRange {
                    start: b.begin_time,
                    end: b.end_time,
                },
                |r| FrameRange {
                    start: r.start.min(b.begin_time),
                    end: r.end.max(b.end_time),
                },
            );
            self.set_range(range);
        }
        tracing::debug!(character = character.id(), kind = ?character.kind, "playback character added");
        let mut state = CharacterPlaybackState::new(character, &self.config);
        if let Some(corrections) = &self.corrections {
            state.set_corrections(corrections.clone());
        }
        self.characters.insert(state.id().to_string(), state);
    }

    /// Removes a character. Returns whether it existed.
    pub fn remove_character(&mut self, character_id: &str) -> bool {
        self.characters.remove(character_id).is_some()
    }

    /// Drops every character.
    pub fn clear(&mut self) {
        self.characters.clear();
    }

    /// Jumps to `frame`, relative to the session start.
    pub fn seek(&mut self, frame: usize) {
        self.cursor.seek(frame);
        if let PlaybackClock::TimeSource(ts) = &mut self.clock {
            ts.seek(i32::try_from(self.cursor.current()).unwrap_or(i32::MAX));
        }
    }

    /// Replaces the corrective angles on every humanoid.
    pub fn set_corrections(&mut self, corrections: Vec<Vec3>) {
        for state in self.characters.values_mut() {
            state.set_corrections(corrections.clone());
        }
        self.corrections = Some(corrections);
    }

    /// Advances the clock by `dt` seconds and plays every due step.
    /// Returns the number of steps played.
    pub fn tick<F, S>(&mut self, dt: f32, frames: &F, sink: &mut S) -> u32
    where
        F: FrameSource + ?Sized,
        S: PoseSink + ?Sized,
    {
        let (steps, step_dt) = match &mut self.clock {
            PlaybackClock::Ticker(ticker) => (ticker.advance(dt), ticker.interval()),
            PlaybackClock::TimeSource(ts) => {
                ts.advance(dt);
                (u32::from(dt.is_finite()), dt)
            }
        };
        for _ in 0..steps {
            self.play_step(step_dt, frames, sink);
            match &self.clock {
                PlaybackClock::Ticker(_) => self.cursor.step(),
                PlaybackClock::TimeSource(ts) => self.cursor.follow(ts.frame),
            }
        }
        steps
    }

    fn play_step<F, S>(&mut self, dt: f32, frames: &F, sink: &mut S)
    where
        F: FrameSource + ?Sized,
        S: PoseSink + ?Sized,
    {
        self.steps += 1;
        let blend = self.blend.factor(dt, self.cursor.at_start());
        let absolute = self.absolute_frame();

        for state in self.characters.values_mut() {
            let pose = if state.bounds().contains(absolute) {
                let frame = frames.frame_at(state.id(), absolute);
                state.animate(frame, blend, dt)
            } else {
                state.deactivate()
            };
            sink.write_pose(pose);
        }
    }

    fn set_range(&mut self, range: FrameRange) {
        self.range = Some(range);
        let frame_count = range.frame_count();
        self.cursor.set_frame_count(frame_count);
        if let PlaybackClock::TimeSource(ts) = &mut self.clock {
            ts.set_range(0, last_index(frame_count));
        }
    }

    /// Absolute frame the cursor points at.
    #[must_use]
    pub fn absolute_frame(&self) -> i32 {
        let start = self.range.map_or(0, |r| r.start);
        start.saturating_add(i32::try_from(self.cursor.current()).unwrap_or(i32::MAX))
    }

    /// The cursor.
    #[must_use]
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Mutable clock, for pause / rate controls on a time source.
    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// Playback state of `character_id`.
    #[must_use]
    pub fn character(&self, character_id: &str) -> Option<&CharacterPlaybackState> {
        self.characters.get(character_id)
    }

    /// Number of characters.
    #[must_use]
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Steps played so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
}

fn last_index(frame_count: usize) -> i32 {
    i32::try_from(frame_count).map_or(i32::MAX, |n| (n - 1).max(0))
}
