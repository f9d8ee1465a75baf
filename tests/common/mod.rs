#![allow(dead_code)]

use hand_vision::pipeline::DepthFrame;

pub const HAND_DEPTH: u8 = 200;

/// Paints a palm disk with one finger pointing straight up from `(cx, cy)`.
pub fn paint_pointing_hand(data: &mut [u8], width: u32, cx: i64, cy: i64, palm: i64, reach: i64) {
    let height = data.len() as i64 / width as i64;
    for y in 0..height {
        for x in 0..width as i64 {
            let (dx, dy) = (x - cx, y - cy);
            let in_palm = dx * dx + dy * dy <= palm * palm;
            let in_finger = dx.abs() <= 3 && (-reach..=0).contains(&dy);
            if in_palm || in_finger {
                data[(y * width as i64 + x) as usize] = HAND_DEPTH;
            }
        }
    }
}

pub fn pointing_frame(width: u32, height: u32, cx: i64, cy: i64) -> DepthFrame {
    let mut data = vec![0u8; (width * height) as usize];
    paint_pointing_hand(&mut data, width, cx, cy, 40, 80);
    DepthFrame::from_luma(width, height, data).unwrap()
}

pub fn blank_frame(width: u32, height: u32) -> DepthFrame {
    DepthFrame::from_luma(width, height, vec![0; (width * height) as usize]).unwrap()
}
