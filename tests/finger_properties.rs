mod common;

use common::paint_pointing_hand;
use hand_vision::core_modules::hand_tracker::HandTracker;
use hand_vision::pipeline::{DepthFrame, TrackerConfig};
use proptest::prelude::*;

const WIDTH: u32 = 300;
const HEIGHT: u32 = 200;

fn tracker() -> HandTracker {
    HandTracker::new(TrackerConfig {
        min_area_ratio: 0.01,
        ..TrackerConfig::default()
    })
    .unwrap()
}

proptest! {
    #[test]
    fn fingers_stay_out_of_the_edge_band(
        cx in 0i64..WIDTH as i64,
        cy in 0i64..HEIGHT as i64,
        palm in 15i64..45,
        reach in 20i64..120,
    ) {
        let mut data = vec![0u8; (WIDTH * HEIGHT) as usize];
        paint_pointing_hand(&mut data, WIDTH, cx, cy, palm, reach);
        let frame = DepthFrame::from_luma(WIDTH, HEIGHT, data).unwrap();

        let (mx, my) = (WIDTH as f64 * 0.03, HEIGHT as f64 * 0.03);
        for candidate in tracker().track(&frame) {
            for finger in &candidate.fingers {
                prop_assert!(finger.x >= mx && finger.x <= WIDTH as f64 - mx, "x = {}", finger.x);
                prop_assert!(finger.y >= my && finger.y <= HEIGHT as f64 - my, "y = {}", finger.y);
                prop_assert!((0.0..=1.0).contains(&finger.length));
            }
            for pair in candidate.fingers.windows(2) {
                prop_assert!(pair[0].length >= pair[1].length);
            }
        }
    }
}
