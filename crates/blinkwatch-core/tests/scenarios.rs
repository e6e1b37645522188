use blinkwatch_core::{BlinkLivenessTracker, EyeState, FaceObservation};

fn face(id: i64, left: Option<f32>, right: Option<f32>, t: i64) -> FaceObservation {
    FaceObservation::tracked(id, left, right, t)
}

#[test]
fn blink_is_counted_once_and_never_decremented() {
    let mut tracker = BlinkLivenessTracker::default();

    let r = tracker.observe(&face(1, Some(0.9), Some(0.9), 0)).unwrap();
    assert_eq!(r.eye_state, EyeState::Open);
    assert_eq!(r.blink_count, 0);

    let r = tracker.observe(&face(1, Some(0.1), Some(0.1), 200)).unwrap();
    assert_eq!(r.eye_state, EyeState::Closed);
    assert_eq!(r.blink_count, 1);

    let r = tracker.observe(&face(1, Some(0.9), Some(0.9), 400)).unwrap();
    assert_eq!(r.eye_state, EyeState::Open);
    assert_eq!(r.blink_count, 1);
}

#[test]
fn open_face_without_blink_raises_alert_after_grace() {
    let mut tracker = BlinkLivenessTracker::default();

    let r = tracker.observe(&face(2, Some(0.5), Some(0.5), 0)).unwrap();
    assert_eq!(r.eye_state, EyeState::Open);
    assert!(!r.liveness_alert);

    let r = tracker.observe(&face(2, Some(0.5), Some(0.5), 5000)).unwrap();
    assert_eq!(r.blink_count, 0);
    assert!(r.liveness_alert);
}

#[test]
fn missing_probabilities_stay_no_info_and_alert() {
    let mut tracker = BlinkLivenessTracker::default();

    for t in [0, 1000, 2500, 4000] {
        let r = tracker.observe(&face(3, None, None, t)).unwrap();
        assert_eq!(r.eye_state, EyeState::NoInfo);
        assert_eq!(r.blink_count, 0);
        assert!(!r.liveness_alert);
    }

    let r = tracker.observe(&face(3, None, None, 4001)).unwrap();
    assert_eq!(r.eye_state, EyeState::NoInfo);
    assert_eq!(r.blink_count, 0);
    assert!(r.liveness_alert);
}

#[test]
fn blink_rate_over_one_minute() {
    let mut tracker = BlinkLivenessTracker::default();

    let r = tracker.observe(&face(4, Some(0.1), Some(0.1), 0)).unwrap();
    assert_eq!(r.eye_state, EyeState::Closed);
    assert_eq!(r.blink_count, 0);

    tracker.observe(&face(4, Some(0.9), Some(0.9), 30_000));
    let r = tracker.observe(&face(4, Some(0.1), Some(0.1), 60_000)).unwrap();
    assert_eq!(r.blink_count, 1);
    let rate = r.blink_rate_per_minute.unwrap();
    assert!((rate - 1.0).abs() < 1e-9);
}

#[test]
fn replayed_observation_does_not_double_count() {
    let mut tracker = BlinkLivenessTracker::default();
    tracker.observe(&face(5, Some(0.9), Some(0.9), 0));

    let closing = face(5, Some(0.2), Some(0.2), 100);
    let first = tracker.observe(&closing).unwrap();
    let replay = tracker.observe(&closing).unwrap();
    assert_eq!(first.blink_count, 1);
    assert_eq!(replay.blink_count, 1);
    assert_eq!(replay.eye_state, EyeState::Closed);
}

#[test]
fn blink_count_is_monotonic_over_noisy_stream() {
    let mut tracker = BlinkLivenessTracker::default();
    let probabilities = [
        (Some(0.9), Some(0.9)),
        (None, Some(0.2)),
        (Some(0.1), Some(0.1)),
        (Some(0.4), Some(0.4)),
        (Some(0.3), Some(0.8)),
        (Some(0.05), Some(0.0)),
        (None, None),
        (Some(0.0), Some(0.0)),
        (Some(1.2), Some(-0.1)),
        (Some(0.0), Some(0.0)),
    ];

    let mut previous_count = 0;
    let mut previous_state = None;
    for (i, (left, right)) in probabilities.into_iter().enumerate() {
        let r = tracker.observe(&face(6, left, right, i as i64 * 33)).unwrap();
        let entered_closed = r.eye_state == EyeState::Closed
            && previous_state.is_some_and(|s| s != EyeState::Closed);
        assert_eq!(
            r.blink_count,
            previous_count + u32::from(entered_closed),
            "step {i}"
        );
        previous_count = r.blink_count;
        previous_state = Some(r.eye_state);
    }
    assert_eq!(previous_count, 4);
}
