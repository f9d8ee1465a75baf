// THEORY:
// The `DepthMasker` is the first stage of every frame. It turns a depth frame into a
// binary silhouette by a single threshold on one depth channel: anything at least as
// close as `depth_threshold` is hand, everything else is background.
//
// Three rules shape the mask:
// 1.  **Threshold**: foreground pixels become 255, background pixels 0.
// 2.  **Black border**: the outermost ring of pixels is always 0. A hand cropped by
//     the frame edge would otherwise be traced as a closed loop along the border.
// 3.  **Focus region**: when an external region detector supplies a box, every pixel
//     outside it is 0, restricting tracking to that one region.
//
// While masking it accumulates the coordinates of every foreground pixel of the
// *final* mask, giving the silhouette's centroid ("gravity"). An empty mask has no
// centroid; that is reported as `None` and never turned into a NaN.

use crate::core_modules::depth_frame::DepthFrame;
use crate::core_modules::geometry::{Contour, Point};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Mean position of foreground pixels.
pub type Centroid = Point;

/// Tunables for the masker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskerConfig {
    /// Samples at or above this value are foreground (0..=255 scale).
    pub depth_threshold: u8,
    /// Which interleaved channel of the frame carries depth.
    pub depth_channel: usize,
}

impl Default for MaskerConfig {
    fn default() -> Self {
        Self {
            depth_threshold: 100,
            depth_channel: 0,
        }
    }
}

/// An axis-aligned pixel box produced by an external region detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }
}

/// An external detector proposing hand-shaped regions, best first.
pub trait RegionDetector {
    fn detect(&self, frame: &DepthFrame) -> Vec<Region>;
}

/// Binary silhouette of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub image: GrayImage,
    pub centroid: Option<Centroid>,
    pub foreground_pixels: u64,
}

impl Mask {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Centroid of the foreground pixels inside `contour`'s bounding box.
    ///
    /// The box is half-open (`min..max` on both axes), so a contour's own last row
    /// and column are excluded. Returns `None` when no foreground pixel falls inside.
    pub fn centroid_within(&self, contour: &Contour) -> Option<Centroid> {
        let (min, max) = contour.bounds()?;
        let x0 = min.x.max(0.0) as u32;
        let y0 = min.y.max(0.0) as u32;
        let x1 = (max.x.max(0.0) as u32).min(self.width());
        let y1 = (max.y.max(0.0) as u32).min(self.height());

        let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.image.get_pixel(x, y)[0] > 0 {
                    sum_x += x as u64;
                    sum_y += y as u64;
                    count += 1;
                }
            }
        }
        average(sum_x, sum_y, count)
    }
}

fn average(sum_x: u64, sum_y: u64, count: u64) -> Option<Centroid> {
    if count == 0 {
        return None;
    }
    Some(Point::new(
        sum_x as f64 / count as f64,
        sum_y as f64 / count as f64,
    ))
}

/// Stateless thresholding of depth frames.
#[derive(Debug, Clone, Default)]
pub struct DepthMasker {
    config: MaskerConfig,
}

impl DepthMasker {
    pub fn new(config: MaskerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaskerConfig {
        &self.config
    }

    /// Thresholds `frame`, blacks out the border and everything outside `focus`.
    pub fn mask(&self, frame: &DepthFrame, focus: Option<&Region>) -> Mask {
        let width = frame.width();
        let height = frame.height();
        let mut image = GrayImage::new(width, height);

        if self.config.depth_channel >= frame.channels() {
            warn!(
                depth_channel = self.config.depth_channel,
                channels = frame.channels(),
                "depth channel out of range, frame yields an empty mask"
            );
            return Mask {
                image,
                centroid: None,
                foreground_pixels: 0,
            };
        }

        let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
        for y in 0..height {
            for x in 0..width {
                let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                let in_focus = focus.is_none_or(|r| r.contains(x, y));
                let is_foreground = !on_border
                    && in_focus
                    && frame.sample(x, y, self.config.depth_channel) >= self.config.depth_threshold;

                if is_foreground {
                    image.put_pixel(x, y, Luma([FOREGROUND]));
                    sum_x += x as u64;
                    sum_y += y as u64;
                    count += 1;
                }
            }
        }

        Mask {
            image,
            centroid: average(sum_x, sum_y, count),
            foreground_pixels: count,
        }
    }
}
