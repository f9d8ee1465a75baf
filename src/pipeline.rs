// THEORY:
// The `pipeline` module is the top-level API of the crate. A `TrackingPipeline` wires
// the spatial layer (`HandTracker`) to the temporal layer (`GestureRecognizer`) and
// hands back one `Report` per frame.
//
// Besides gestures, the pipeline produces the pointer stream: every frame with a
// fingertip yields a `HandMove`, the topmost fingertip of the first candidate mapped
// onto a caller-sized canvas. Depth cameras face the user, so the x axis is mirrored
// by default so that moving the hand right moves the pointer right.
//
// Both kinds of event are dispatched on the pipeline's own `EventBus` in the same
// call that returns the report.

use crate::core_modules::event_bus::EventBus;
use crate::core_modules::gesture::GestureRecognizer;
use crate::core_modules::hand_tracker::HandTracker;
use crate::error::{ConfigError, check_positive};
use serde::{Deserialize, Serialize};
use tracing::debug;

// Re-export key data structures for the public API.
pub use crate::core_modules::depth_frame::DepthFrame;
pub use crate::core_modules::event_bus::SubscriptionId;
pub use crate::core_modules::gesture::{GestureConfig, GestureEvent, GestureKind};
pub use crate::core_modules::hand_tracker::{Candidate, TrackerConfig};
pub use crate::core_modules::silhouette_analyzer::Finger;

/// Target surface for `HandMove` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    /// Flip x so the pointer follows the hand as seen by the user.
    pub mirror_x: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            mirror_x: true,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("canvas.width", self.width)?;
        check_positive("canvas.height", self.height)
    }

    /// Maps an image point of a `width` x `height` frame onto the canvas.
    pub fn map(&self, x: f64, y: f64, width: u32, height: u32) -> HandMove {
        let nx = x / width as f64;
        let nx = if self.mirror_x { 1.0 - nx } else { nx };
        HandMove {
            x: nx * self.width,
            y: y / height as f64 * self.height,
        }
    }
}

/// Configuration for the whole pipeline. `canvas: None` disables `HandMove`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub gestures: GestureConfig,
    pub canvas: Option<CanvasConfig>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.gestures.validate()?;
        if let Some(canvas) = &self.canvas {
            canvas.validate()?;
        }
        Ok(())
    }
}

/// Pointer position on the configured canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandMove {
    pub x: f64,
    pub y: f64,
}

/// Everything a pipeline subscriber can receive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TrackingEvent {
    #[serde(rename = "handmove")]
    HandMove(HandMove),
    Gesture(GestureEvent),
}

/// The detailed data package for a frame with at least one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub candidates: Vec<Candidate>,
    pub hand_move: Option<HandMove>,
    pub gestures: Vec<GestureEvent>,
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    NoCandidate,
    Detected(FrameReport),
}

impl Report {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::NoCandidate => &[],
            Self::Detected(report) => &report.candidates,
        }
    }
}

/// The main, top-level struct for hand tracking.
pub struct TrackingPipeline {
    tracker: HandTracker,
    recognizer: GestureRecognizer,
    canvas: Option<CanvasConfig>,
    bus: EventBus<TrackingEvent>,
    frame: u64,
}

impl TrackingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracker: HandTracker::new(config.tracker)?,
            recognizer: GestureRecognizer::new(config.gestures)?,
            canvas: config.canvas,
            bus: EventBus::new(),
            frame: 0,
        })
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&TrackingEvent) + Send + 'static,
    {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn tracker(&self) -> &HandTracker {
        &self.tracker
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn process_frame(&mut self, frame: &DepthFrame) -> Report {
        self.frame += 1;

        // Stage 1: Spatial analysis
        let candidates = self.tracker.track(frame);

        // Stage 2: Temporal analysis. Several hands at once are not one gesture.
        let gesture_input = match candidates.as_slice() {
            [single] => Some(single),
            _ => None,
        };
        let gestures = self.recognizer.on_frame(gesture_input);

        // Stage 3: Pointer
        let hand_move = self.canvas.and_then(|canvas| {
            let candidate = candidates.first()?;
            let finger = candidate.topmost_finger()?;
            Some(canvas.map(finger.x, finger.y, candidate.width, candidate.height))
        });

        if let Some(hand_move) = hand_move {
            self.bus.dispatch(&TrackingEvent::HandMove(hand_move));
        }
        for gesture in &gestures {
            self.bus.dispatch(&TrackingEvent::Gesture(*gesture));
        }

        if candidates.is_empty() {
            debug!(frame = self.frame, "no hand in frame");
            return Report::NoCandidate;
        }
        Report::Detected(FrameReport {
            frame: self.frame,
            candidates,
            hand_move,
            gestures,
        })
    }
}
