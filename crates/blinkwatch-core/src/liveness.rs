//! Blink-absence liveness heuristic.
//!
//! A live person blinks involuntarily every few seconds. A printed photograph
//! or a still image held in front of the camera never does. A face that is
//! tracked for longer than the grace period without a single blink is
//! therefore flagged as a possible photo spoof.
//!
//! The policy is a continuous condition: it holds on every observation from
//! the moment the grace period runs out until the first blink, after which it
//! is suppressed for the rest of the track's lifetime. Callers that want one
//! notification per face put an [`AlertLatch`] in front of their UI.
//!
//! # Threat Coverage
//!
//! - **Blocks:** Printed photographs, static images on a screen.
//! - **Does not block:** Video replay (the recorded face blinks), masks with
//!   eye cut-outs, or a photo that is briefly covered while the detector
//!   keeps the same track id.

use std::collections::HashSet;

use crate::observation::{TrackId, TrackResult};

/// Default time a new face is given to blink before it is flagged.
pub const DEFAULT_LIVENESS_GRACE_MILLIS: i64 = 4000;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Whether a track with `blink_count` blinks over `elapsed_millis` should be
/// flagged. The grace period is exclusive: exactly `grace_millis` is not yet
/// suspicious.
pub fn liveness_alert(blink_count: u32, elapsed_millis: i64, grace_millis: i64) -> bool {
    blink_count < 1 && elapsed_millis > grace_millis
}

/// Blinks per minute, or `None` when `elapsed_millis` is not positive
/// (first frame, or timestamps that went backwards).
pub fn blink_rate_per_minute(blink_count: u32, elapsed_millis: i64) -> Option<f64> {
    if elapsed_millis <= 0 {
        return None;
    }
    Some(f64::from(blink_count) / (elapsed_millis as f64 / MILLIS_PER_MINUTE))
}

/// Reduces the continuous alert flag to one notification per track.
#[derive(Debug, Default)]
pub struct AlertLatch {
    notified: HashSet<TrackId>,
}

impl AlertLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `result` carries an alert for its track id.
    pub fn should_notify(&mut self, result: &TrackResult) -> bool {
        result.liveness_alert && self.notified.insert(result.track_id)
    }

    /// Rearm the latch for a track, e.g. after the tracker evicted it.
    pub fn forget(&mut self, track_id: TrackId) {
        self.notified.remove(&track_id);
    }

    /// Keep only the track ids for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(TrackId) -> bool) {
        self.notified.retain(|id| keep(*id));
    }

    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eye_state::EyeState;

    fn result(track_id: TrackId, alert: bool) -> TrackResult {
        TrackResult {
            track_id,
            eye_state: EyeState::Open,
            blink_count: 0,
            elapsed_millis: 5000,
            blink_rate_per_minute: Some(0.0),
            liveness_alert: alert,
        }
    }

    #[test]
    fn test_alert_requires_elapsed_beyond_grace() {
        assert!(!liveness_alert(0, 0, 4000));
        assert!(!liveness_alert(0, 4000, 4000));
        assert!(liveness_alert(0, 4001, 4000));
    }

    #[test]
    fn test_alert_suppressed_after_blink() {
        assert!(!liveness_alert(1, 10_000, 4000));
        assert!(!liveness_alert(7, 1_000_000, 4000));
    }

    #[test]
    fn test_rate_undefined_without_elapsed_time() {
        assert_eq!(blink_rate_per_minute(3, 0), None);
        assert_eq!(blink_rate_per_minute(3, -250), None);
    }

    #[test]
    fn test_rate_per_minute() {
        let rate = blink_rate_per_minute(1, 60_000).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);

        // 5 blinks in 20 s = 15/min
        let rate = blink_rate_per_minute(5, 20_000).unwrap();
        assert!((rate - 15.0).abs() < 1e-9);

        assert_eq!(blink_rate_per_minute(0, 1000), Some(0.0));
    }

    #[test]
    fn test_latch_notifies_once_per_track() {
        let mut latch = AlertLatch::new();
        assert!(!latch.should_notify(&result(1, false)));
        assert!(latch.should_notify(&result(1, true)));
        assert!(!latch.should_notify(&result(1, true)));
        // Independent per track
        assert!(latch.should_notify(&result(2, true)));
        assert_eq!(latch.notified_count(), 2);
    }

    #[test]
    fn test_latch_rearms_after_forget() {
        let mut latch = AlertLatch::new();
        assert!(latch.should_notify(&result(1, true)));
        latch.forget(1);
        assert!(latch.should_notify(&result(1, true)));
    }

    #[test]
    fn test_latch_retain() {
        let mut latch = AlertLatch::new();
        latch.should_notify(&result(1, true));
        latch.should_notify(&result(2, true));
        latch.retain(|id| id == 2);
        assert_eq!(latch.notified_count(), 1);
        assert!(latch.should_notify(&result(1, true)));
        assert!(!latch.should_notify(&result(2, true)));
    }
}
