use serde::{Deserialize, Serialize};

use crate::eye_state::EyeState;

/// Tracking identifier assigned by the upstream face detector.
pub type TrackId = i64;

/// One detected face in one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Stable identity across frames. `None` means the detector could not
    /// track this face; such observations are ignored.
    #[serde(default)]
    pub track_id: Option<TrackId>,
    #[serde(default)]
    pub left_eye_open_probability: Option<f32>,
    #[serde(default)]
    pub right_eye_open_probability: Option<f32>,
    pub timestamp_millis: i64,
}

impl FaceObservation {
    pub fn tracked(
        track_id: TrackId,
        left: Option<f32>,
        right: Option<f32>,
        timestamp_millis: i64,
    ) -> Self {
        Self {
            track_id: Some(track_id),
            left_eye_open_probability: left,
            right_eye_open_probability: right,
            timestamp_millis,
        }
    }
}

/// Per-observation output of the tracker, consumed by a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResult {
    pub track_id: TrackId,
    pub eye_state: EyeState,
    /// Cumulative blinks since the track was first seen.
    pub blink_count: u32,
    /// Milliseconds between the first observation of the track and this one.
    pub elapsed_millis: i64,
    /// Blinks per minute over `elapsed_millis`; `None` when no positive time
    /// has elapsed.
    pub blink_rate_per_minute: Option<f64>,
    /// Raw, continuously re-evaluated liveness alert.
    pub liveness_alert: bool,
}
