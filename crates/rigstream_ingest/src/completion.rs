//! # Completion Detector
//!
//! The stream is finished when all of these hold:
//! - every queue is empty
//! - nothing was processed for longer than the grace period
//! - every character with known bounds has received its full frame count
//!
//! A character whose bounds never arrive is invisible here, so a stalled
//! source keeps the detector waiting. There is no timeout.

use std::time::{Duration, Instant};

use crate::assembler::FrameAssembler;

/// Idle-grace completion heuristic.
#[derive(Clone, Debug)]
pub struct CompletionDetector {
    grace: Duration,
    last_progress: Instant,
}

impl CompletionDetector {
    /// Creates a detector whose idle clock starts at `now`.
    #[must_use]
    pub fn new(grace: Duration, now: Instant) -> Self {
        Self {
            grace,
            last_progress: now,
        }
    }

    /// Records that a bounds or frame record was processed at `now`.
    pub fn mark_progress(&mut self, now: Instant) {
        self.last_progress = now;
    }

    /// Last recorded progress.
    #[must_use]
    pub fn last_progress(&self) -> Instant {
        self.last_progress
    }

    /// Grace period.
    #[must_use]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Evaluates the completion rule.
    #[must_use]
    pub fn is_finished(&self, queues_empty: bool, now: Instant, assembler: &FrameAssembler) -> bool {
        queues_empty
            && now.saturating_duration_since(self.last_progress) > self.grace
            && assembler.all_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::CharacterClassifier;
    use crate::config::IngestConfig;
    use rigstream_shared::{BoundsRecord, FrameRecord, Vec3};

    fn assembler() -> FrameAssembler {
        FrameAssembler::new(CharacterClassifier::new(&IngestConfig::default(), Vec::new()))
    }

    #[test]
    fn test_requires_grace_elapsed() {
        let t0 = Instant::now();
        let d = CompletionDetector::new(Duration::from_millis(500), t0);
        let a = assembler();
        assert!(!d.is_finished(true, t0 + Duration::from_millis(500), &a));
        assert!(d.is_finished(true, t0 + Duration::from_millis(501), &a));
    }

    #[test]
    fn test_requires_empty_queues() {
        let t0 = Instant::now();
        let d = CompletionDetector::new(Duration::from_millis(500), t0);
        assert!(!d.is_finished(false, t0 + Duration::from_secs(10), &assembler()));
    }

    #[test]
    fn test_waits_for_missing_frames() {
        let t0 = Instant::now();
        let mut d = CompletionDetector::new(Duration::from_millis(500), t0);
        let mut a = assembler();
        a.announce(BoundsRecord::new("p1", "", 0, 1));
        a.place(FrameRecord::root_only("p1", 0, Vec3::ZERO));
        d.mark_progress(t0);

        let later = t0 + Duration::from_secs(60);
        assert!(!d.is_finished(true, later, &a));

        a.place(FrameRecord::root_only("p1", 1, Vec3::ZERO));
        d.mark_progress(later);
        assert!(!d.is_finished(true, later, &a));
        assert!(d.is_finished(true, later + Duration::from_secs(1), &a));
    }
}
