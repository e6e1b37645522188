//! Blink counting and blink-absence liveness for tracked faces.
//!
//! An upstream face detector delivers, per frame, a list of faces with a
//! tracking id and two eye-open probabilities. [`BlinkLivenessTracker`] keeps
//! one record per tracking id, counts entries into the fully closed eye state
//! as blinks, and flags faces that have not blinked within a grace period as
//! possible photo spoofs.

pub mod config;
pub mod eye_state;
pub mod liveness;
pub mod observation;
pub mod tracker;

pub use config::{ConfigError, TrackerConfig};
pub use eye_state::{classify, classify_with, EyeState, DEFAULT_EYE_OPEN_THRESHOLD};
pub use liveness::{blink_rate_per_minute, liveness_alert, AlertLatch};
pub use observation::{FaceObservation, TrackId, TrackResult};
pub use tracker::{BlinkLivenessTracker, SharedTracker, TrackRecord};
