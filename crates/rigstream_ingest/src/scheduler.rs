//! # Drain Scheduler
//!
//! Moves queued records into consumer-owned state, once per tick.
//!
//! ## Tick Order
//!
//! ```text
//! 1. errors  ── drain ≤ budget ──▶ consumer.report_error
//! 2. bounds  ── drain ≤ budget ──▶ assembler.announce ──▶ consumer.spawn_character
//! 3. frames  ── drain ≤ budget ──▶ assembler.place
//!                                    └─ unknown bounds: requeue, stop frames for this tick
//! 4. completion check ──▶ session.finish
//! ```
//!
//! Queue locks are only taken inside `drain_up_to` / `requeue`. Assembly and
//! consumer calls happen with no lock held.

use std::time::Instant;

use rigstream_shared::ErrorRecord;

use crate::assembler::{AnnouncedCharacter, Announcement, Placement};
use crate::config::{DrainBudgets, IngestConfig};
use crate::session::StreamSession;

/// Consumer-side hooks invoked by the scheduler.
pub trait StreamConsumer {
    /// A character's bounds were processed for the first time.
    fn spawn_character(&mut self, character: &AnnouncedCharacter);

    /// A per-character stream error was drained. Never fatal.
    fn report_error(&mut self, error: &ErrorRecord) {
        tracing::error!(
            character = %error.character_id,
            code = error.error_code,
            kind = %error.return_code(),
            "{}",
            error.description
        );
    }
}

/// Cumulative scheduler counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Ticks that ran against a streaming session.
    pub ticks: u64,
    /// Error records reported.
    pub errors_reported: u64,
    /// New characters announced.
    pub bounds_processed: u64,
    /// Bounds ignored because the character was already known.
    pub duplicate_bounds: u64,
    /// Frames stored in a buffer.
    pub frames_placed: u64,
    /// Frames requeued because their bounds were not yet known.
    pub ordering_anomalies: u64,
    /// Frames dropped for a timestamp outside their bounds.
    pub out_of_range_frames: u64,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Errors reported.
    pub errors: usize,
    /// New characters.
    pub bounds: usize,
    /// Frames stored.
    pub frames: usize,
    /// Whether the frame drain stopped on an unknown character.
    pub requeued: bool,
    /// Whether the completion detector fired.
    pub finished: bool,
}

/// Budgeted per-tick drain.
#[derive(Debug)]
pub struct DrainScheduler {
    budgets: DrainBudgets,
    verbose: bool,
    stats: IngestStats,
}

impl DrainScheduler {
    /// Creates a scheduler using the budgets from `config`.
    #[must_use]
    pub fn new(config: &IngestConfig) -> Self {
        Self::with_budgets(config.effective_budgets(), config.verbose)
    }

    /// Creates a scheduler with explicit budgets.
    #[must_use]
    pub fn with_budgets(budgets: DrainBudgets, verbose: bool) -> Self {
        Self {
            budgets,
            verbose,
            stats: IngestStats::default(),
        }
    }

    /// Budgets in effect.
    #[must_use]
    pub fn budgets(&self) -> DrainBudgets {
        self.budgets
    }

    /// Cumulative counters.
    #[must_use]
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Runs one tick against `session`. Does nothing unless it is streaming.
    pub fn tick<C>(&mut self, session: &mut StreamSession, consumer: &mut C, now: Instant) -> TickReport
    where
        C: StreamConsumer + ?Sized,
    {
        let mut report = TickReport::default();
        if !session.is_streaming() {
            return report;
        }
        self.stats.ticks += 1;

        let (queues, assembler, completion) = session.parts_mut();

        for error in queues.errors.drain_up_to(self.budgets.errors) {
            consumer.report_error(&error);
            report.errors += 1;
        }

        for bounds in queues.bounds.drain_up_to(self.budgets.bounds) {
            if self.verbose {
                tracing::debug!(
                    character = %bounds.character_id,
                    begin = bounds.begin_time,
                    end = bounds.end_time,
                    "bounds"
                );
            }
            match assembler.announce(bounds) {
                Announcement::New(character) => {
                    consumer.spawn_character(&character);
                    report.bounds += 1;
                }
                Announcement::Duplicate(bounds) => {
                    self.stats.duplicate_bounds += 1;
                    tracing::warn!(
                        character = %bounds.character_id,
                        begin = bounds.begin_time,
                        end = bounds.end_time,
                        "duplicate bounds ignored"
                    );
                }
            }
            completion.mark_progress(now);
        }

        let mut batch = queues.frames.drain_up_to(self.budgets.frames).into_iter();
        while let Some(frame) = batch.next() {
            match assembler.place(frame) {
                Placement::Placed { slot } => {
                    report.frames += 1;
                    completion.mark_progress(now);
                    if self.verbose {
                        tracing::debug!(slot, "frame placed");
                    }
                }
                Placement::UnknownBounds(frame) => {
                    tracing::warn!(
                        character = %frame.character_id,
                        timestamp = frame.timestamp,
                        "frame before bounds, requeued"
                    );
                    queues.frames.restore_front(batch.by_ref());
                    queues.frames.requeue(frame);
                    self.stats.ordering_anomalies += 1;
                    report.requeued = true;
                    break;
                }
                Placement::OutOfRange(frame) => {
                    self.stats.out_of_range_frames += 1;
                    tracing::warn!(
                        character = %frame.character_id,
                        timestamp = frame.timestamp,
                        "frame outside bounds dropped"
                    );
                }
            }
        }

        self.stats.errors_reported += report.errors as u64;
        self.stats.bounds_processed += report.bounds as u64;
        self.stats.frames_placed += report.frames as u64;

        if completion.is_finished(queues.all_empty(), now, assembler) {
            report.finished = true;
            session.finish();
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{InfoQuery, NativeEventBridge, NativeSource};
    use crate::error::StreamResult;
    use rigstream_shared::StreamManifest;
    use std::sync::Arc;
    use std::time::Duration;

    struct Passive;

    impl NativeSource for Passive {
        fn start(&mut self, _locator: &str, _bridge: Arc<NativeEventBridge>) -> StreamResult<()> {
            Ok(())
        }

        fn stop(&mut self) {}

        fn info(&self) -> Option<Arc<dyn InfoQuery>> {
            None
        }
    }

    #[derive(Default)]
    struct Recorder {
        spawned: Vec<String>,
        errors: Vec<i32>,
    }

    impl StreamConsumer for Recorder {
        fn spawn_character(&mut self, character: &AnnouncedCharacter) {
            self.spawned.push(character.id().to_string());
        }

        fn report_error(&mut self, error: &ErrorRecord) {
            self.errors.push(error.error_code);
        }
    }

    fn streaming(t0: Instant) -> StreamSession {
        let mut s = StreamSession::new(&IngestConfig::default(), StreamManifest::default(), t0);
        s.start(Box::new(Passive), "test", t0).unwrap();
        s
    }

    #[test]
    fn test_budget_limits_frames_per_tick() {
        let t0 = Instant::now();
        let mut s = streaming(t0);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.on_bounds("p1", 0, 9);
        for ts in 0..10 {
            bridge.on_frame("p1", ts, &[0.0; 3], &[], &[], &[]);
        }

        let budgets = DrainBudgets {
            frames: 4,
            ..DrainBudgets::UNLIMITED
        };
        let mut sched = DrainScheduler::with_budgets(budgets, false);
        let mut rec = Recorder::default();
        assert_eq!(sched.tick(&mut s, &mut rec, t0).frames, 4);
        assert_eq!(sched.tick(&mut s, &mut rec, t0).frames, 4);
        assert_eq!(sched.tick(&mut s, &mut rec, t0).frames, 2);
        assert_eq!(rec.spawned, vec!["p1"]);
        assert_eq!(s.assembler().received("p1"), 10);
    }

    #[test]
    fn test_unknown_bounds_stops_frame_drain() {
        let t0 = Instant::now();
        let mut s = streaming(t0);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.on_bounds("p1", 0, 4);
        let mut sched = DrainScheduler::new(&IngestConfig::default());
        let mut rec = Recorder::default();
        sched.tick(&mut s, &mut rec, t0);

        bridge.on_frame("p1", 0, &[], &[], &[], &[]);
        bridge.on_frame("p2", 0, &[], &[], &[], &[]);
        bridge.on_frame("p1", 1, &[], &[], &[], &[]);
        bridge.on_frame("p1", 2, &[], &[], &[], &[]);

        let report = sched.tick(&mut s, &mut rec, t0);
        assert_eq!(report.frames, 1);
        assert!(report.requeued);
        assert_eq!(sched.stats().ordering_anomalies, 1);

        // Remaining frames keep their order, the orphan moves to the tail.
        let left: Vec<_> = s
            .queues()
            .frames
            .drain_up_to(usize::MAX)
            .into_iter()
            .map(|f| (f.character_id, f.timestamp))
            .collect();
        assert_eq!(
            left,
            vec![("p1".to_string(), 1), ("p1".to_string(), 2), ("p2".to_string(), 0)]
        );
    }

    #[test]
    fn test_errors_are_reported_not_fatal() {
        let t0 = Instant::now();
        let mut s = streaming(t0);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.on_error("p1", -4, "bad data");
        bridge.on_bounds("p1", 0, 0);
        let mut sched = DrainScheduler::new(&IngestConfig::default());
        let mut rec = Recorder::default();
        let report = sched.tick(&mut s, &mut rec, t0);
        assert_eq!(report.errors, 1);
        assert_eq!(rec.errors, vec![-4]);
        assert!(s.is_streaming());
        assert!(s.assembler().is_known("p1"));
    }

    #[test]
    fn test_duplicate_bounds_keep_first_extent() {
        let t0 = Instant::now();
        let mut s = streaming(t0);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.on_bounds("p1", 0, 4);
        bridge.on_bounds("p1", 10, 99);
        let mut sched = DrainScheduler::new(&IngestConfig::default());
        let mut rec = Recorder::default();
        let report = sched.tick(&mut s, &mut rec, t0);
        assert_eq!(report.bounds, 1);
        assert_eq!(sched.stats().duplicate_bounds, 1);
        assert_eq!(rec.spawned, vec!["p1"]);
        assert_eq!(s.assembler().buffer("p1").unwrap().len(), 5);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let t0 = Instant::now();
        let mut s = streaming(t0);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.on_bounds("p1", 10, 11);
        bridge.on_frame("p1", 12, &[], &[], &[], &[]);
        let mut sched = DrainScheduler::new(&IngestConfig::default());
        sched.tick(&mut s, &mut Recorder::default(), t0);
        assert_eq!(sched.stats().out_of_range_frames, 1);
        assert_eq!(s.assembler().received("p1"), 0);
        assert!(s.queues().frames.is_empty());
    }

    #[test]
    fn test_completion_finishes_session() {
        let t0 = Instant::now();
        let mut s = streaming(t0);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.on_bounds("p1", 0, 1);
        bridge.on_frame("p1", 0, &[], &[], &[], &[]);
        bridge.on_frame("p1", 1, &[], &[], &[], &[]);

        let mut sched = DrainScheduler::new(&IngestConfig::default());
        let mut rec = Recorder::default();
        assert!(!sched.tick(&mut s, &mut rec, t0).finished);
        assert!(!sched.tick(&mut s, &mut rec, t0 + Duration::from_millis(100)).finished);
        assert!(sched.tick(&mut s, &mut rec, t0 + Duration::from_secs(1)).finished);
        assert!(!s.is_streaming());
        assert!(s.assembler().buffer("p1").is_some());

        // Further ticks are no-ops.
        assert_eq!(sched.tick(&mut s, &mut rec, t0 + Duration::from_secs(2)), TickReport::default());
    }

    #[test]
    fn test_not_streaming_is_noop() {
        let t0 = Instant::now();
        let mut s = StreamSession::new(&IngestConfig::default(), StreamManifest::default(), t0);
        let mut sched = DrainScheduler::new(&IngestConfig::default());
        sched.tick(&mut s, &mut Recorder::default(), t0);
        assert_eq!(sched.stats().ticks, 0);
    }
}
