// THEORY:
// The `gesture` module is the temporal layer of the tracker. Where the `HandTracker`
// sees one frame at a time, the `GestureRecognizer` turns the stream of per-frame
// candidates into discrete, named events.
//
// It is a dispatcher over a fixed set of independent detectors: four swipe detectors
// (left, right, up, down) and one nudge detector. Each detector is a private finite
// state machine with its own history and counters; detectors never share state.
// Every frame, with or without a hand, is fed to every detector in a fixed order so
// miss counters keep ticking on empty frames.
//
// Events are returned to the caller and, in the same call, dispatched to the
// recognizer's own `EventBus`.

pub mod nudge;
pub mod swipe;

use crate::core_modules::event_bus::{EventBus, SubscriptionId};
use crate::core_modules::hand_tracker::Candidate;
use crate::error::ConfigError;
use nudge::{NudgeConfig, NudgeDetector, NudgeState};
use serde::{Deserialize, Serialize};
use std::fmt;
use swipe::{SwipeConfig, SwipeDetector, SwipeDirection, SwipeState};
use tracing::info;

/// Name of a recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    Nudge,
    #[serde(rename = "I")]
    I,
}

impl GestureKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::SwipeLeft => "swipeLeft",
            Self::SwipeRight => "swipeRight",
            Self::SwipeUp => "swipeUp",
            Self::SwipeDown => "swipeDown",
            Self::Nudge => "nudge",
            Self::I => "I",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A gesture fired during frame `frame` (1-based count of frames seen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub frame: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub swipe: SwipeConfig,
    pub nudge: NudgeConfig,
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.swipe.validate()?;
        self.nudge.validate()
    }
}

/// Owns the gesture detectors and their subscribers.
#[derive(Debug)]
pub struct GestureRecognizer {
    swipes: [SwipeDetector; 4],
    nudge: NudgeDetector,
    bus: EventBus<GestureEvent>,
    frame: u64,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            swipes: SwipeDirection::ALL.map(|d| SwipeDetector::new(d, config.swipe.clone())),
            nudge: NudgeDetector::new(config.nudge),
            bus: EventBus::new(),
            frame: 0,
        })
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&GestureEvent) + Send + 'static,
    {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Feeds one frame (`None` when no hand was found) to every detector.
    pub fn on_frame(&mut self, candidate: Option<&Candidate>) -> Vec<GestureEvent> {
        self.frame += 1;
        let frame = self.frame;

        let mut kinds: Vec<GestureKind> = self
            .swipes
            .iter_mut()
            .filter_map(|detector| detector.on_frame(candidate))
            .collect();
        kinds.extend(self.nudge.on_frame(candidate));

        let events: Vec<GestureEvent> = kinds.into_iter().map(|kind| GestureEvent { kind, frame }).collect();

        for event in &events {
            info!(gesture = %event.kind, frame, "gesture recognized");
            self.bus.dispatch(event);
        }
        events
    }

    pub fn swipe_state(&self, direction: SwipeDirection) -> SwipeState {
        self.swipes
            .iter()
            .find(|d| d.direction() == direction)
            .map_or(SwipeState::Idle, SwipeDetector::state)
    }

    pub fn nudge_state(&self) -> NudgeState {
        self.nudge.state()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
pub(crate) mod test_candidates {
    use crate::core_modules::geometry::{Contour, Point};
    use crate::core_modules::hand_tracker::Candidate;
    use crate::core_modules::silhouette_analyzer::Finger;

    /// A 200x200 candidate holding exactly the given fingertips.
    pub fn with_fingers(points: &[(f64, f64)]) -> Candidate {
        Candidate {
            contour: Contour::default(),
            hull: Contour::default(),
            defects: Vec::new(),
            centroid: Point::new(100.0, 100.0),
            fingers: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Finger {
                    x,
                    y,
                    length: 1.0 - i as f64 * 0.1,
                    bucket: i,
                })
                .collect(),
            finger_graph: None,
            width: 200,
            height: 200,
        }
    }

    pub fn one_finger(x: f64, y: f64) -> Candidate {
        with_fingers(&[(x, y)])
    }

    pub fn empty_candidate() -> Candidate {
        with_fingers(&[])
    }
}
