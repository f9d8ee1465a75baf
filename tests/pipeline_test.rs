mod common;

use common::{HAND_DEPTH, blank_frame, pointing_frame};
use hand_vision::core_modules::gesture::swipe::{SwipeDirection, SwipeState};
use hand_vision::core_modules::hand_tracker::HandTracker;
use hand_vision::pipeline::{
    CanvasConfig, DepthFrame, GestureKind, PipelineConfig, Report, TrackerConfig, TrackingEvent, TrackingPipeline,
};
use std::sync::{Arc, Mutex};

#[test]
fn pointing_hand_has_one_finger_at_the_tip() {
    let tracker = HandTracker::new(TrackerConfig::default()).unwrap();
    let candidate = tracker.detect(&pointing_frame(400, 200, 200, 130)).unwrap();

    assert_eq!(candidate.fingers.len(), 1);
    let tip = candidate.fingers[0];
    assert!((tip.x - 200.0).abs() <= 3.0, "tip x = {}", tip.x);
    assert!((tip.y - 50.0).abs() <= 2.0, "tip y = {}", tip.y);
    assert_eq!(tip.length, 1.0);
}

#[test]
fn detection_does_not_depend_on_call_history() {
    let tracker = HandTracker::new(TrackerConfig::default()).unwrap();
    let frame = pointing_frame(400, 200, 150, 130);
    let first = tracker.detect(&frame);
    tracker.detect(&blank_frame(400, 200));
    tracker.detect(&pointing_frame(400, 200, 250, 130));
    assert_eq!(first, tracker.detect(&frame));
}

#[test]
fn rgba_frames_use_the_first_channel_as_depth() {
    let luma = pointing_frame(400, 200, 200, 130);
    let rgba: Vec<u8> = luma.data().iter().flat_map(|&d| [d, 0, 0, 255]).collect();
    let rgba = DepthFrame::new(400, 200, 4, rgba).unwrap();

    let tracker = HandTracker::new(TrackerConfig::default()).unwrap();
    assert_eq!(tracker.detect(&luma), tracker.detect(&rgba));
}

#[test]
fn threshold_above_hand_depth_hides_the_hand() {
    let mut config = TrackerConfig::default();
    config.masker.depth_threshold = HAND_DEPTH + 1;
    let tracker = HandTracker::new(config).unwrap();
    assert!(tracker.detect(&pointing_frame(400, 200, 200, 130)).is_none());
}

#[test]
fn hand_sweeping_right_fires_one_swipe() {
    let mut pipeline = TrackingPipeline::new(PipelineConfig::default()).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    pipeline.subscribe(move |event| {
        if let TrackingEvent::Gesture(g) = event {
            sink.lock().unwrap().push(*g);
        }
    });

    let mut fired = Vec::new();
    for i in 0..=10 {
        if let Report::Detected(report) = pipeline.process_frame(&pointing_frame(400, 200, 45 + 31 * i, 130)) {
            fired.extend(report.gestures);
        }
    }

    // 310 px of 400 is the first step past the 0.7 trigger.
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].kind, GestureKind::SwipeRight);
    assert_eq!(fired[0].frame, 11);
    assert_eq!(*received.lock().unwrap(), fired);
    assert_eq!(pipeline.recognizer().swipe_state(SwipeDirection::Right), SwipeState::Sleeping);
}

#[test]
fn losing_the_hand_resets_swipe_capture() {
    let mut pipeline = TrackingPipeline::new(PipelineConfig::default()).unwrap();
    pipeline.process_frame(&pointing_frame(400, 200, 60, 130));
    assert_eq!(pipeline.recognizer().swipe_state(SwipeDirection::Right), SwipeState::Capture);

    for _ in 0..10 {
        assert_eq!(pipeline.process_frame(&blank_frame(400, 200)), Report::NoCandidate);
    }
    assert_eq!(pipeline.recognizer().swipe_state(SwipeDirection::Right), SwipeState::Capture);
    pipeline.process_frame(&blank_frame(400, 200));
    assert_eq!(pipeline.recognizer().swipe_state(SwipeDirection::Right), SwipeState::Idle);

    // Starting again far right does not complete the earlier motion.
    let report = pipeline.process_frame(&pointing_frame(400, 200, 340, 130));
    let Report::Detected(report) = report else {
        panic!("expected a hand");
    };
    assert!(report.gestures.is_empty());
}

#[test]
fn hand_move_is_mirrored_onto_the_canvas() {
    let config = PipelineConfig {
        canvas: Some(CanvasConfig {
            width: 800.0,
            height: 400.0,
            mirror_x: true,
        }),
        ..PipelineConfig::default()
    };
    let mut pipeline = TrackingPipeline::new(config).unwrap();
    let Report::Detected(report) = pipeline.process_frame(&pointing_frame(400, 200, 100, 130)) else {
        panic!("expected a hand");
    };
    let hand_move = report.hand_move.unwrap();
    // Tip near (100, 50): mirrored x is 600, y is 100.
    assert!((hand_move.x - 600.0).abs() <= 6.0, "x = {}", hand_move.x);
    assert!((hand_move.y - 100.0).abs() <= 4.0, "y = {}", hand_move.y);
}
