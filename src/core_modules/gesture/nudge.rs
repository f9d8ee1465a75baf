// THEORY:
// The `NudgeDetector` recognizes two fingers pinching together into one ("nudge") and
// the follow-up where that finger is withdrawn while the hand stays in view ("I").
//
// While two or more fingers are visible it remembers the midpoint of the closest
// pair. On a later frame, a single finger landing on one of those remembered
// midpoints means the pair merged: that fires `nudge` and arms the detector. Once
// armed, the proximity radius widens, since a finger about to leave tends to drift.
// If no finger is near any remembered midpoint for more than `removal_frames`
// frames, the finger is gone and `I` fires.
//
// States:
//   Idle           -> Capture         on any candidate (history reset)
//   Capture        -> WaitForRemoval  on a nudge
//   WaitForRemoval -> Idle            when `I` fires
//   Capture/Wait   -> Idle            after more than `miss_limit` frames without fingers

use crate::core_modules::geometry::Point;
use crate::core_modules::gesture::GestureKind;
use crate::core_modules::hand_tracker::Candidate;
use crate::core_modules::silhouette_analyzer::Finger;
use crate::error::{ConfigError, check_capacity, check_positive};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub history_capacity: usize,
    pub miss_limit: u32,
    /// Pixel radius around a remembered midpoint while capturing.
    pub capture_proximity: f64,
    /// Pixel radius once a nudge has fired.
    pub armed_proximity: f64,
    pub removal_frames: u32,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            miss_limit: 5,
            capture_proximity: 7.0,
            armed_proximity: 15.0,
            removal_frames: 3,
        }
    }
}

impl NudgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity("nudge.history_capacity", self.history_capacity)?;
        check_positive("nudge.capture_proximity", self.capture_proximity)?;
        check_positive("nudge.armed_proximity", self.armed_proximity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeState {
    Idle,
    Capture,
    WaitForRemoval,
}

#[derive(Debug, Clone)]
pub struct NudgeDetector {
    config: NudgeConfig,
    state: NudgeState,
    /// Midpoints of the closest finger pair, oldest first.
    history: VecDeque<Point>,
    misses: u32,
    removals: u32,
}

impl NudgeDetector {
    pub fn new(config: NudgeConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            state: NudgeState::Idle,
            misses: 0,
            removals: 0,
        }
    }

    pub fn state(&self) -> NudgeState {
        self.state
    }

    pub fn on_frame(&mut self, candidate: Option<&Candidate>) -> Option<GestureKind> {
        if self.state == NudgeState::Idle {
            if candidate.is_none() {
                return None;
            }
            self.state = NudgeState::Capture;
            self.history.clear();
            self.misses = 0;
            self.removals = 0;
        }

        let fingers = candidate.map_or(&[][..], |c| c.fingers.as_slice());
        if fingers.is_empty() {
            self.misses += 1;
            if self.misses > self.config.miss_limit {
                self.state = NudgeState::Idle;
            }
            return None;
        }
        self.misses = 0;

        if !self.history.is_empty() {
            let armed = self.state == NudgeState::WaitForRemoval;
            let proximity = if armed {
                self.config.armed_proximity
            } else {
                self.config.capture_proximity
            };

            for reference in self.history.iter().rev() {
                let near = fingers
                    .iter()
                    .filter(|f| f.position().distance(reference) < proximity)
                    .count();
                if !armed && near == 1 {
                    self.state = NudgeState::WaitForRemoval;
                    self.removals = 0;
                    return Some(GestureKind::Nudge);
                }
                if near > 0 {
                    self.removals = 0;
                    return None;
                }
            }

            if armed {
                self.removals += 1;
                if self.removals > self.config.removal_frames {
                    self.state = NudgeState::Idle;
                    return Some(GestureKind::I);
                }
            }
        }

        if let Some(midpoint) = closest_pair_midpoint(fingers) {
            self.history.push_back(midpoint);
            if self.history.len() > self.config.history_capacity {
                self.history.pop_front();
            }
        }
        None
    }
}

/// Midpoint of the pair of fingers with the smallest squared distance.
///
/// Pairs are scanned in index order and the first minimum wins ties. `None` for
/// fewer than two fingers.
pub fn closest_pair_midpoint(fingers: &[Finger]) -> Option<Point> {
    let mut closest: Option<(f64, Point)> = None;
    for (i, a) in fingers.iter().enumerate() {
        for b in &fingers[i + 1..] {
            let dist = a.position().distance_sq(&b.position());
            if closest.is_none_or(|(best, _)| dist < best) {
                closest = Some((dist, Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)));
            }
        }
    }
    closest.map(|(_, midpoint)| midpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::gesture::test_candidates::{empty_candidate, with_fingers};

    fn finger(x: f64, y: f64) -> Finger {
        Finger {
            x,
            y,
            length: 1.0,
            bucket: 0,
        }
    }

    /// Drives the detector into WaitForRemoval and returns it.
    fn nudged() -> NudgeDetector {
        let mut detector = NudgeDetector::new(NudgeConfig::default());
        assert_eq!(detector.on_frame(Some(&with_fingers(&[(90.0, 100.0), (110.0, 100.0)]))), None);
        assert_eq!(detector.on_frame(Some(&with_fingers(&[(95.0, 100.0), (105.0, 100.0)]))), None);
        assert_eq!(
            detector.on_frame(Some(&with_fingers(&[(101.0, 100.0)]))),
            Some(GestureKind::Nudge)
        );
        detector
    }

    #[test]
    fn converging_pair_fires_one_nudge() {
        let detector = nudged();
        assert_eq!(detector.state(), NudgeState::WaitForRemoval);
    }

    #[test]
    fn withdrawn_finger_fires_i_after_four_frames() {
        let mut detector = nudged();
        let elsewhere = with_fingers(&[(160.0, 100.0)]);
        let fired: Vec<Option<GestureKind>> = (0..4).map(|_| detector.on_frame(Some(&elsewhere))).collect();
        assert_eq!(fired, vec![None, None, None, Some(GestureKind::I)]);
        assert_eq!(detector.state(), NudgeState::Idle);
    }

    #[test]
    fn lingering_finger_keeps_the_detector_armed() {
        let mut detector = nudged();
        // Within the wider armed radius.
        let lingering = with_fingers(&[(110.0, 104.0)]);
        for _ in 0..10 {
            assert_eq!(detector.on_frame(Some(&lingering)), None);
        }
        assert_eq!(detector.state(), NudgeState::WaitForRemoval);
    }

    #[test]
    fn touching_a_midpoint_restarts_the_removal_count() {
        let mut detector = nudged();
        let elsewhere = with_fingers(&[(160.0, 100.0)]);
        let lingering = with_fingers(&[(100.0, 100.0)]);
        for _ in 0..3 {
            assert_eq!(detector.on_frame(Some(&elsewhere)), None);
        }
        assert_eq!(detector.on_frame(Some(&lingering)), None);
        for _ in 0..3 {
            assert_eq!(detector.on_frame(Some(&elsewhere)), None);
        }
        assert_eq!(detector.on_frame(Some(&elsewhere)), Some(GestureKind::I));
    }

    #[test]
    fn hand_leaving_view_does_not_fire_i() {
        let mut detector = nudged();
        for _ in 0..5 {
            assert_eq!(detector.on_frame(Some(&empty_candidate())), None);
        }
        assert_eq!(detector.state(), NudgeState::WaitForRemoval);
        assert_eq!(detector.on_frame(None), None);
        assert_eq!(detector.state(), NudgeState::Idle);
    }

    #[test]
    fn two_fingers_near_a_midpoint_do_not_nudge() {
        let mut detector = NudgeDetector::new(NudgeConfig::default());
        let pair = with_fingers(&[(97.0, 100.0), (103.0, 100.0)]);
        for _ in 0..5 {
            assert_eq!(detector.on_frame(Some(&pair)), None);
        }
        assert_eq!(detector.state(), NudgeState::Capture);
    }

    #[test]
    fn closest_pair_tracks_minimum_distance() {
        let fingers = [finger(0.0, 0.0), finger(100.0, 0.0), finger(10.0, 0.0), finger(200.0, 0.0)];
        assert_eq!(closest_pair_midpoint(&fingers), Some(Point::new(5.0, 0.0)));
    }

    #[test]
    fn closest_pair_ties_keep_first_pair() {
        let fingers = [finger(0.0, 0.0), finger(10.0, 0.0), finger(20.0, 0.0)];
        assert_eq!(closest_pair_midpoint(&fingers), Some(Point::new(5.0, 0.0)));
        assert_eq!(closest_pair_midpoint(&fingers[..1]), None);
    }
}
