//! # Playback Clock
//!
//! Two ways to decide which frame plays next:
//!
//! - [`FrameTimeSource`]: a free-running clock with its own rate, pause,
//!   reverse, random access and loop delay. Supplied when playback must be
//!   decoupled from the host tick.
//! - [`FixedTicker`]: the default. Fires at a fixed interval after an
//!   initial delay and advances the cursor one frame per firing.
//!
//! Either way the [`PlaybackCursor`] holds the frame actually played,
//! relative to the session start.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TimeSourceConfig;

/// Rates below this are treated as stopped.
const MIN_RATE: f32 = 1e-6;

/// Most firings a single [`FixedTicker::advance`] reports. Time beyond
/// that is dropped so a stalled host does not replay a burst of frames.
pub const MAX_CATCH_UP_STEPS: u32 = 8;

/// Free-running frame clock over `[start_frame, end_frame]`.
#[derive(Clone, Debug)]
pub struct FrameTimeSource {
    /// Current frame.
    pub frame: i32,
    /// First frame (inclusive).
    pub start_frame: i32,
    /// Last frame (inclusive).
    pub end_frame: i32,
    /// Playback rate; negative plays backwards.
    pub frames_per_second: f32,
    /// Wrap at the ends.
    pub looping: bool,
    /// Pause after wrapping, seconds.
    pub loop_delay: f32,
    /// Remaining pause, seconds.
    pub loop_delay_countdown: f32,
    /// Frozen.
    pub paused: bool,
    /// Random access mode.
    pub random: bool,
    fractional: f32,
    rng: StdRng,
}

impl FrameTimeSource {
    /// A looping 30 fps source positioned at `start_frame`.
    #[must_use]
    pub fn new(start_frame: i32, end_frame: i32) -> Self {
        Self::from_config(&TimeSourceConfig::default(), start_frame, end_frame)
    }

    /// A source configured from `config`.
    #[must_use]
    pub fn from_config(config: &TimeSourceConfig, start_frame: i32, end_frame: i32) -> Self {
        Self {
            frame: start_frame,
            start_frame,
            end_frame,
            frames_per_second: config.frames_per_second,
            looping: config.looping,
            loop_delay: config.loop_delay_secs,
            loop_delay_countdown: config.loop_delay_secs,
            paused: false,
            random: config.random,
            fractional: 0.0,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Advances by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.paused || !dt.is_finite() {
            return;
        }
        if self.random {
            if self.start_frame <= self.end_frame {
                self.frame = self.rng.gen_range(self.start_frame..=self.end_frame);
            }
            return;
        }

        let mut dt = dt;
        if self.loop_delay_countdown > 0.0 {
            self.loop_delay_countdown -= dt;
            if self.loop_delay_countdown > 0.0 {
                return;
            }
            // Carry the overshoot into this step.
            dt = -self.loop_delay_countdown;
            self.loop_delay_countdown = 0.0;
        }

        let fps = self.frames_per_second.abs();
        if fps < MIN_RATE {
            return;
        }
        self.fractional += dt;
        let whole = (self.fractional * fps).floor();
        self.fractional -= whole / fps;
        let delta = whole as i32;

        if self.frames_per_second < 0.0 {
            self.frame -= delta;
        } else {
            self.frame += delta;
        }
        self.wrap();
    }

    fn wrap(&mut self) {
        let out_low = self.frame < self.start_frame;
        let out_high = self.frame > self.end_frame;
        if !(out_low || out_high) {
            return;
        }
        if self.looping {
            self.frame = if out_low { self.end_frame } else { self.start_frame };
            self.loop_delay_countdown = self.loop_delay;
        } else {
            self.frame = if out_low { self.start_frame } else { self.end_frame };
            self.paused = true;
        }
    }

    /// Jumps to `frame`, clamped to the range.
    pub fn seek(&mut self, frame: i32) {
        self.frame = frame.clamp(self.start_frame, self.end_frame.max(self.start_frame));
        self.fractional = 0.0;
    }

    /// One frame forward, wrapping to the start.
    pub fn step_forward(&mut self) {
        self.frame += 1;
        if self.frame > self.end_frame {
            self.frame = self.start_frame;
        }
    }

    /// One frame back, wrapping to the end.
    pub fn step_backward(&mut self) {
        self.frame -= 1;
        if self.frame < self.start_frame {
            self.frame = self.end_frame;
        }
    }

    /// Flips the pause flag.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Changes the rate and resumes playback.
    pub fn set_frames_per_second(&mut self, fps: f32) {
        self.frames_per_second = fps;
        self.paused = false;
    }

    /// Updates the range, pulling the current frame inside it.
    pub fn set_range(&mut self, start_frame: i32, end_frame: i32) {
        self.start_frame = start_frame;
        self.end_frame = end_frame;
        if self.frame < start_frame || self.frame > end_frame {
            self.frame = start_frame;
        }
    }
}

/// Fixed-interval ticker with an initial delay.
#[derive(Clone, Debug)]
pub struct FixedTicker {
    interval: f32,
    delay_remaining: f32,
    accumulator: f32,
    fired: u64,
}

impl FixedTicker {
    /// Fires every `interval` seconds, the first time after `initial_delay`.
    #[must_use]
    pub fn new(interval: f32, initial_delay: f32) -> Self {
        Self {
            interval,
            delay_remaining: initial_delay,
            accumulator: 0.0,
            fired: 0,
        }
    }

    /// Advances by `dt` seconds and returns how many firings are due, at
    /// most [`MAX_CATCH_UP_STEPS`]. Non-finite `dt` is ignored.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || self.interval <= 0.0 || dt <= 0.0 {
            return 0;
        }
        let mut dt = dt;
        if self.delay_remaining > 0.0 {
            self.delay_remaining -= dt;
            if self.delay_remaining > 0.0 {
                return 0;
            }
            // First firing happens the moment the delay expires.
            dt = -self.delay_remaining + self.interval;
            self.delay_remaining = 0.0;
        }
        self.accumulator += dt;
        let due = (self.accumulator / self.interval).floor();
        self.accumulator -= due * self.interval;
        let due = (due as u32).min(MAX_CATCH_UP_STEPS);
        self.fired += u64::from(due);
        due
    }

    /// Interval in seconds.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Total firings so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

/// Frame played, relative to the session start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    current: usize,
    frame_count: usize,
}

impl PlaybackCursor {
    /// Cursor at 0 over `frame_count` frames.
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self {
            current: 0,
            frame_count,
        }
    }

    /// Current relative frame.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Frames in the session.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Whether the cursor is on the first frame.
    #[must_use]
    pub fn at_start(&self) -> bool {
        self.current == 0
    }

    /// Advances one frame, wrapping to 0.
    pub fn step(&mut self) {
        self.set(self.current + 1);
    }

    /// Moves to the frame after the time source's `frame`, wrapping to 0.
    pub fn follow(&mut self, frame: i32) {
        self.set(usize::try_from(frame).map_or(0, |f| f + 1));
    }

    /// Jumps to `frame`.
    pub fn seek(&mut self, frame: usize) {
        self.current = if self.frame_count == 0 { 0 } else { frame % self.frame_count };
    }

    /// Changes the session length, keeping the cursor in range.
    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        if self.current >= frame_count {
            self.current = 0;
        }
    }

    fn set(&mut self, next: usize) {
        self.current = if next >= self.frame_count { 0 } else { next };
    }
}

/// What drives the cursor.
#[derive(Clone, Debug)]
pub enum PlaybackClock {
    /// Default fixed-rate ticker.
    Ticker(FixedTicker),
    /// External time source.
    TimeSource(FrameTimeSource),
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 30.0;

    fn running(start: i32, end: i32) -> FrameTimeSource {
        let mut ts = FrameTimeSource::new(start, end);
        ts.loop_delay_countdown = 0.0;
        ts
    }

    #[test]
    fn test_time_source_advances_whole_frames() {
        let mut ts = running(0, 100);
        ts.advance(DT * 0.5);
        assert_eq!(ts.frame, 0);
        ts.advance(DT * 0.6);
        assert_eq!(ts.frame, 1);
        ts.advance(DT * 3.0);
        assert_eq!(ts.frame, 4);
    }

    #[test]
    fn test_loop_delay_absorbs_time() {
        let mut ts = FrameTimeSource::new(0, 100);
        ts.advance(0.5);
        assert_eq!(ts.frame, 0);
        // 0.5s remains of the delay; the extra 10 frames' worth carries over.
        ts.advance(0.5 + 10.0 * DT + 0.001);
        assert_eq!(ts.frame, 10);
    }

    #[test]
    fn test_wraps_and_rearms_delay() {
        let mut ts = running(0, 3);
        ts.advance(DT * 4.0 + 0.001);
        assert_eq!(ts.frame, 0);
        assert!(ts.loop_delay_countdown > 0.0);
    }

    #[test]
    fn test_backwards_wraps_to_end() {
        let mut ts = running(0, 9);
        ts.frames_per_second = -30.0;
        ts.advance(DT + 0.0001);
        assert_eq!(ts.frame, 9);
    }

    #[test]
    fn test_non_looping_stops_at_end() {
        let mut ts = running(0, 3);
        ts.looping = false;
        ts.advance(1.0);
        assert_eq!(ts.frame, 3);
        assert!(ts.paused);
    }

    #[test]
    fn test_paused_and_zero_rate() {
        let mut ts = running(0, 9);
        ts.toggle_pause();
        ts.advance(1.0);
        assert_eq!(ts.frame, 0);
        ts.toggle_pause();
        ts.frames_per_second = 0.0;
        ts.advance(1.0);
        assert_eq!(ts.frame, 0);
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut ts = running(5, 8);
        ts.random = true;
        for _ in 0..100 {
            ts.advance(DT);
            assert!((5..=8).contains(&ts.frame));
        }
    }

    #[test]
    fn test_steps_wrap() {
        let mut ts = running(0, 2);
        ts.step_backward();
        assert_eq!(ts.frame, 2);
        ts.step_forward();
        assert_eq!(ts.frame, 0);
        ts.seek(99);
        assert_eq!(ts.frame, 2);
    }

    #[test]
    fn test_ticker_initial_delay() {
        let mut t = FixedTicker::new(0.1, 1.0);
        assert_eq!(t.advance(0.5), 0);
        assert_eq!(t.advance(0.49), 0);
        assert_eq!(t.advance(0.02), 1);
        assert_eq!(t.advance(0.1), 1);
        assert_eq!(t.advance(0.35), 3);
        assert_eq!(t.fired(), 5);
    }

    #[test]
    fn test_ticker_caps_catch_up_after_stall() {
        let mut t = FixedTicker::new(0.1, 0.0);
        assert_eq!(t.advance(60.0), MAX_CATCH_UP_STEPS);
        assert_eq!(t.fired(), u64::from(MAX_CATCH_UP_STEPS));
        // The backlog is gone, not deferred.
        assert_eq!(t.advance(0.05), 0);
        assert_eq!(t.advance(0.06), 1);
    }

    #[test]
    fn test_ticker_ignores_non_finite_dt() {
        let mut t = FixedTicker::new(0.1, 0.0);
        assert_eq!(t.advance(f32::NAN), 0);
        assert_eq!(t.advance(f32::INFINITY), 0);
        assert_eq!(t.advance(0.15), 1);
        assert_eq!(t.advance(0.06), 1);
        assert_eq!(t.fired(), 2);
    }

    #[test]
    fn test_time_source_ignores_non_finite_dt() {
        let mut ts = running(0, 100);
        ts.advance(f32::NAN);
        ts.advance(f32::INFINITY);
        assert_eq!(ts.frame, 0);
        ts.advance(DT * 2.0 + 0.001);
        assert_eq!(ts.frame, 2);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut c = PlaybackCursor::new(3);
        c.step();
        c.step();
        assert_eq!(c.current(), 2);
        c.step();
        assert!(c.at_start());
        c.follow(1);
        assert_eq!(c.current(), 2);
        c.follow(2);
        assert_eq!(c.current(), 0);
        c.seek(7);
        assert_eq!(c.current(), 1);
    }

    #[test]
    fn test_empty_cursor_stays_at_zero() {
        let mut c = PlaybackCursor::new(0);
        c.step();
        c.seek(4);
        assert_eq!(c.current(), 0);
    }
}
