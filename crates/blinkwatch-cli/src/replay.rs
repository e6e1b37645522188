//! `blinkwatch replay` — drives the tracker from a JSON-lines stream.
//!
//! Each non-blank line is either a single face observation or a whole frame:
//!
//! ```text
//! {"track_id": 1, "left_eye_open_probability": 0.9, "right_eye_open_probability": 0.8, "timestamp_millis": 0}
//! {"faces": [{"track_id": 1, "timestamp_millis": 33}, {"track_id": null, "timestamp_millis": 33}]}
//! ```
//!
//! A lone observation counts as a one-face frame.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use blinkwatch_core::{AlertLatch, BlinkLivenessTracker, FaceObservation};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum InputLine {
    Frame { faces: Vec<FaceObservation> },
    Face(FaceObservation),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Notify once per track instead of on every alerting observation.
    pub alert_once: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub results: usize,
    /// Alert notices written to `notices`.
    pub alerts: usize,
}

/// Feed every line of `input` through `tracker`, writing one JSON result per
/// tracked face to `out` and a human-readable notice per liveness alert to
/// `notices`.
pub fn run<R: BufRead, W: Write, N: Write>(
    input: R,
    out: &mut W,
    notices: &mut N,
    tracker: &mut BlinkLivenessTracker,
    options: ReplayOptions,
) -> Result<ReplaySummary> {
    let mut latch = AlertLatch::new();
    let mut summary = ReplaySummary::default();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let faces = match serde_json::from_str::<InputLine>(&line)
            .with_context(|| format!("invalid observation on line {line_no}"))?
        {
            InputLine::Frame { faces } => faces,
            InputLine::Face(face) => vec![face],
        };

        let results = tracker.observe_frame(&faces);
        summary.frames += 1;

        // Keep the latch in step with evictions so a returning id can alert again
        latch.retain(|id| tracker.contains(id));

        for result in &results {
            serde_json::to_writer(&mut *out, result)?;
            writeln!(out)?;
            summary.results += 1;

            let notify = if options.alert_once {
                latch.should_notify(result)
            } else {
                result.liveness_alert
            };
            if notify {
                writeln!(
                    notices,
                    "track {}: possible photo spoof, no blink in {} ms",
                    result.track_id, result.elapsed_millis
                )?;
                summary.alerts += 1;
            }
        }
    }

    out.flush()?;
    Ok(summary)
}
