use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::TrackerConfig;
use crate::eye_state::{classify_with, EyeState};
use crate::liveness::{blink_rate_per_minute, liveness_alert};
use crate::observation::{FaceObservation, TrackId, TrackResult};

/// State kept for one tracked face.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    first_seen_millis: i64,
    last_seen_millis: i64,
    last_seen_frame: u64,
    blink_count: u32,
    eye_state: EyeState,
    alert_logged: bool,
}

impl TrackRecord {
    fn new(eye_state: EyeState, now: i64, frame: u64) -> Self {
        Self {
            first_seen_millis: now,
            last_seen_millis: now,
            last_seen_frame: frame,
            blink_count: 0,
            eye_state,
            alert_logged: false,
        }
    }

    /// Apply a new classification. Returns true if this observation is a blink.
    fn apply(&mut self, eye_state: EyeState, now: i64, frame: u64) -> bool {
        let blinked = eye_state == EyeState::Closed && self.eye_state != EyeState::Closed;
        if blinked {
            self.blink_count += 1;
        }
        self.eye_state = eye_state;
        self.last_seen_millis = self.last_seen_millis.max(now);
        self.last_seen_frame = frame;
        blinked
    }

    pub fn first_seen_millis(&self) -> i64 {
        self.first_seen_millis
    }

    /// Latest timestamp observed for this track.
    pub fn last_seen_millis(&self) -> i64 {
        self.last_seen_millis
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    pub fn eye_state(&self) -> EyeState {
        self.eye_state
    }
}

/// Per-face blink counter and blink-absence liveness check.
///
/// Feed it every tracked face of every processed frame. Each track id gets
/// one [`TrackRecord`]; a blink is counted whenever a track enters
/// [`EyeState::Closed`] from any other state. Faces without a track id are
/// ignored. Records live until evicted for inactivity, either explicitly via
/// [`evict`](Self::evict) or every `evict_every_frames` calls to
/// [`observe_frame`](Self::observe_frame).
///
/// Not synchronized; wrap in [`SharedTracker`] to feed it from several threads.
#[derive(Debug, Default)]
pub struct BlinkLivenessTracker {
    config: TrackerConfig,
    records: HashMap<TrackId, TrackRecord>,
    frames_processed: u64,
    sweep_due: bool,
}

impl BlinkLivenessTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            frames_processed: 0,
            sweep_due: false,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Update the state of one face and report its current result.
    ///
    /// Returns `None` (and changes nothing) for untracked faces. Timestamps
    /// need not be monotonic; a non-positive elapsed time only makes the
    /// blink rate undefined.
    pub fn observe(&mut self, observation: &FaceObservation) -> Option<TrackResult> {
        let track_id = observation.track_id?;
        let now = observation.timestamp_millis;
        let eye_state = classify_with(
            self.config.eye_open_threshold,
            observation.left_eye_open_probability,
            observation.right_eye_open_probability,
        );

        tracing::trace!(
            track_id,
            left = ?observation.left_eye_open_probability,
            right = ?observation.right_eye_open_probability,
            timestamp_ms = now,
            %eye_state,
            "face observed"
        );

        let frame = self.frames_processed;
        let record = match self.records.entry(track_id) {
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                if record.apply(eye_state, now, frame) {
                    tracing::debug!(
                        track_id,
                        blink_count = record.blink_count,
                        timestamp_ms = now,
                        "blink counted"
                    );
                }
                record
            }
            Entry::Vacant(entry) => {
                tracing::debug!(track_id, timestamp_ms = now, %eye_state, "new track");
                entry.insert(TrackRecord::new(eye_state, now, frame))
            }
        };

        let elapsed_millis = now.saturating_sub(record.first_seen_millis);
        let alert = liveness_alert(
            record.blink_count,
            elapsed_millis,
            self.config.liveness_grace_millis,
        );
        if alert && !record.alert_logged {
            record.alert_logged = true;
            tracing::warn!(
                track_id,
                elapsed_ms = elapsed_millis,
                grace_ms = self.config.liveness_grace_millis,
                "no blink within grace period — possible photo spoof"
            );
        }

        Some(TrackResult {
            track_id,
            eye_state: record.eye_state,
            blink_count: record.blink_count,
            elapsed_millis,
            blink_rate_per_minute: blink_rate_per_minute(record.blink_count, elapsed_millis),
            liveness_alert: alert,
        })
    }

    /// Apply one frame's detections in order and return a result per tracked face.
    ///
    /// Every `evict_every_frames` frames, the tracker sweeps out tracks that
    /// were absent for that many frames and idle for longer than the
    /// configured window. Idleness is measured against the latest tracked
    /// timestamp of the current frame, so an out-of-line timestamp only
    /// affects the sweep of its own frame. A sweep that falls on a frame
    /// without tracked faces is deferred to the next frame that has one.
    pub fn observe_frame(&mut self, faces: &[FaceObservation]) -> Vec<TrackResult> {
        let results = faces.iter().filter_map(|face| self.observe(face)).collect();

        self.frames_processed += 1;
        let every = u64::from(self.config.evict_every_frames);
        if every > 0 && self.frames_processed % every == 0 {
            self.sweep_due = true;
        }

        if self.sweep_due {
            let frame_now = faces
                .iter()
                .filter(|face| face.track_id.is_some())
                .map(|face| face.timestamp_millis)
                .max();
            if let Some(now) = frame_now {
                self.sweep(now, every);
                self.sweep_due = false;
            }
        }

        results
    }

    /// Evict tracks idle by time that were also missing from the last
    /// `absent_frames` frames before the current one.
    fn sweep(&mut self, now: i64, absent_frames: u64) -> usize {
        let current = self.frames_processed;
        let max_idle_millis = self.config.track_idle_eviction_millis;
        let before = self.records.len();
        self.records.retain(|_, record| {
            let frames_absent = current.saturating_sub(record.last_seen_frame + 1);
            frames_absent <= absent_frames
                || now.saturating_sub(record.last_seen_millis) <= max_idle_millis
        });
        let evicted = before - self.records.len();
        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = self.records.len(),
                frame_now_ms = now,
                max_idle_ms = max_idle_millis,
                "swept idle tracks"
            );
        }
        evicted
    }

    /// Remove every track not observed within `max_idle_millis` of `now`.
    /// Returns the number of tracks removed.
    pub fn evict(&mut self, now: i64, max_idle_millis: i64) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| now.saturating_sub(record.last_seen_millis) <= max_idle_millis);
        let evicted = before - self.records.len();
        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = self.records.len(),
                now_ms = now,
                max_idle_ms = max_idle_millis,
                "evicted idle tracks"
            );
        }
        evicted
    }

    /// [`evict`](Self::evict) with the configured idle window.
    pub fn evict_idle(&mut self, now: i64) -> usize {
        self.evict(now, self.config.track_idle_eviction_millis)
    }

    pub fn get(&self, track_id: TrackId) -> Option<&TrackRecord> {
        self.records.get(&track_id)
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.records.contains_key(&track_id)
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.records.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Drop all tracks.
    pub fn reset(&mut self) {
        self.records.clear();
        self.frames_processed = 0;
        self.sweep_due = false;
    }
}

/// Clone-safe handle to one tracker behind a single exclusive lock.
#[derive(Debug, Clone, Default)]
pub struct SharedTracker {
    inner: Arc<Mutex<BlinkLivenessTracker>>,
}

impl SharedTracker {
    pub fn new(tracker: BlinkLivenessTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    pub fn observe(&self, observation: &FaceObservation) -> Option<TrackResult> {
        self.lock().observe(observation)
    }

    pub fn observe_frame(&self, faces: &[FaceObservation]) -> Vec<TrackResult> {
        self.lock().observe_frame(faces)
    }

    pub fn evict(&self, now: i64, max_idle_millis: i64) -> usize {
        self.lock().evict(now, max_idle_millis)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `f` with exclusive access to the tracker.
    pub fn with<R>(&self, f: impl FnOnce(&mut BlinkLivenessTracker) -> R) -> R {
        f(&mut self.lock())
    }

    // A panic inside `observe` can at worst leave one record half-updated.
    fn lock(&self) -> MutexGuard<'_, BlinkLivenessTracker> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
