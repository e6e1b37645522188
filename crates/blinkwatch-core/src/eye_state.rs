//! Per-frame eye-state classification from eye-open probabilities.
//!
//! The upstream face detector reports, for each eye, the probability that the
//! eye is open. A single fixed threshold splits each probability into
//! open/closed; the pair of verdicts maps onto one of five [`EyeState`]s.
//! A probability exactly equal to the threshold counts as closed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default eye-open threshold. Probabilities strictly above it are "open".
pub const DEFAULT_EYE_OPEN_THRESHOLD: f32 = 0.4;

/// Combined state of both eyes for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    Open,
    LeftClosed,
    RightClosed,
    Closed,
    NoInfo,
}

impl EyeState {
    /// Short machine label, also used by `Display`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::LeftClosed => "left_closed",
            Self::RightClosed => "right_closed",
            Self::Closed => "closed",
            Self::NoInfo => "no_info",
        }
    }

    /// Human-readable caption for an overlay.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Eyes open",
            Self::LeftClosed => "Left eye closed",
            Self::RightClosed => "Right eye closed",
            Self::Closed => "Both eyes closed",
            Self::NoInfo => "Not enough information",
        }
    }
}

impl fmt::Display for EyeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an eye-probability pair with [`DEFAULT_EYE_OPEN_THRESHOLD`].
pub fn classify(left: Option<f32>, right: Option<f32>) -> EyeState {
    classify_with(DEFAULT_EYE_OPEN_THRESHOLD, left, right)
}

/// Classify an eye-probability pair against `threshold`.
///
/// Total over every input: a missing (or NaN) probability on either side
/// yields [`EyeState::NoInfo`], and out-of-range values are clamped into
/// `[0, 1]` before comparison.
pub fn classify_with(threshold: f32, left: Option<f32>, right: Option<f32>) -> EyeState {
    let (Some(left), Some(right)) = (sanitize(left), sanitize(right)) else {
        return EyeState::NoInfo;
    };

    match (left > threshold, right > threshold) {
        (true, true) => EyeState::Open,
        (false, true) => EyeState::LeftClosed,
        (true, false) => EyeState::RightClosed,
        (false, false) => EyeState::Closed,
    }
}

fn sanitize(probability: Option<f32>) -> Option<f32> {
    probability
        .filter(|p| !p.is_nan())
        .map(|p| p.clamp(0.0, 1.0))
}
