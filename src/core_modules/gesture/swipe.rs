// THEORY:
// A `SwipeDetector` watches the primary finger move along one axis direction. It keeps
// a short history of the finger's position projected onto its direction vector, in
// normalized image units, and fires as soon as the newest sample has travelled more
// than `trigger_delta` beyond any sample still in the history.
//
// States:
//   Idle     -> Capture   on the first frame with a candidate (history reset)
//   Capture  -> Idle      after more than `miss_limit` consecutive frames without a finger
//   Capture  -> Sleeping  when the swipe fires
//   Sleeping -> Idle      after `sleep_frames` frames; candidates are ignored meanwhile,
//                         so one hand motion cannot fire twice.

use crate::core_modules::gesture::GestureKind;
use crate::core_modules::hand_tracker::Candidate;
use crate::error::{ConfigError, check_capacity, check_positive, check_unit};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub history_capacity: usize,
    pub miss_limit: u32,
    pub sleep_frames: u32,
    /// Normalized travel (0..1) that counts as a swipe.
    pub trigger_delta: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            history_capacity: 30,
            miss_limit: 10,
            sleep_frames: 20,
            trigger_delta: 0.7,
        }
    }
}

impl SwipeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity("swipe.history_capacity", self.history_capacity)?;
        check_unit("swipe.trigger_delta", self.trigger_delta)?;
        check_positive("swipe.trigger_delta", self.trigger_delta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    pub const ALL: [SwipeDirection; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    /// Unit vector in image coordinates (y grows downwards).
    pub fn vector(self) -> (f64, f64) {
        match self {
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
        }
    }

    pub fn kind(self) -> GestureKind {
        match self {
            Self::Left => GestureKind::SwipeLeft,
            Self::Right => GestureKind::SwipeRight,
            Self::Up => GestureKind::SwipeUp,
            Self::Down => GestureKind::SwipeDown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeState {
    Idle,
    Capture,
    Sleeping,
}

#[derive(Debug, Clone)]
pub struct SwipeDetector {
    direction: SwipeDirection,
    config: SwipeConfig,
    state: SwipeState,
    history: VecDeque<f64>,
    misses: u32,
    slept: u32,
}

impl SwipeDetector {
    pub fn new(direction: SwipeDirection, config: SwipeConfig) -> Self {
        Self {
            direction,
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            state: SwipeState::Idle,
            misses: 0,
            slept: 0,
        }
    }

    pub fn direction(&self) -> SwipeDirection {
        self.direction
    }

    pub fn state(&self) -> SwipeState {
        self.state
    }

    pub fn on_frame(&mut self, candidate: Option<&Candidate>) -> Option<GestureKind> {
        match self.state {
            SwipeState::Sleeping => {
                self.slept += 1;
                if self.slept >= self.config.sleep_frames {
                    self.state = SwipeState::Idle;
                }
                return None;
            }
            SwipeState::Idle => {
                if candidate.is_none() {
                    return None;
                }
                self.state = SwipeState::Capture;
                self.history.clear();
                self.misses = 0;
            }
            SwipeState::Capture => {}
        }

        let sample = candidate.and_then(|c| c.primary_finger().map(|f| self.project(c.normalized(f))));
        let Some(position) = sample else {
            self.misses += 1;
            if self.misses > self.config.miss_limit {
                self.state = SwipeState::Idle;
            }
            return None;
        };
        self.misses = 0;

        self.history.push_back(position);
        if self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }

        let travelled = self
            .history
            .iter()
            .rev()
            .skip(1)
            .any(|older| position - older > self.config.trigger_delta);
        if travelled {
            self.state = SwipeState::Sleeping;
            self.slept = 0;
            return Some(self.direction.kind());
        }
        None
    }

    fn project(&self, (x, y): (f64, f64)) -> f64 {
        let (vx, vy) = self.direction.vector();
        (vx * x + vy * y) / vx.hypot(vy)
    }
}
