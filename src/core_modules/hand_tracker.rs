// THEORY:
// The `HandTracker` is the per-frame orchestrator of the spatial layer. It owns no
// memory between frames; given one depth frame it produces the frame's hand
// candidate(s) and nothing else. All temporal reasoning lives downstream in the
// gesture recognizer.
//
// Per frame:
// 1.  **Mask**: the `DepthMasker` thresholds the frame (optionally cropped to the
//     best region of an attached `RegionDetector`) and yields the centroid.
// 2.  **Contours**: the `PolygonGeometry` backend traces the mask's outer borders.
// 3.  **Selection**: contours under the noise floor (a fraction of the frame area)
//     are ignored. Single mode keeps the largest; multi mode keeps every contour at
//     least half as large as the largest, so two similar hands both survive while
//     small noise blobs do not.
// 4.  **Fingers**: the `silhouette_analyzer` runs on the full-resolution contour.
// 5.  **Hull & defects**: computed on a Douglas-Peucker simplified copy, which is
//     much cheaper and ignores pixel staircase noise.
//
// Capability flags replace what used to be forked tracker variants: `multi_candidate`
// and `finger_extraction` are config switches, and region cropping turns on when a
// region detector is attached.

use crate::core_modules::depth_frame::DepthFrame;
use crate::core_modules::depth_masker::{Centroid, DepthMasker, MaskerConfig, Region, RegionDetector};
use crate::core_modules::geometry::{Contour, Defect, ImageprocGeometry, PolygonGeometry};
use crate::core_modules::silhouette_analyzer::silhouette_analyzer::find_fingers;
use crate::core_modules::silhouette_analyzer::{Finger, FingerConfig, FingerGraph};
use crate::error::{ConfigError, check_unit};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tunables for the tracker, including its masker and finger extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub masker: MaskerConfig,
    pub fingers: FingerConfig,
    /// Noise floor as a fraction of `width * height`.
    pub min_area_ratio: f64,
    /// In multi mode, contours smaller than this fraction of the largest are dropped.
    pub multi_area_ratio: f64,
    /// Simplification tolerance per contour point.
    pub approx_epsilon_ratio: f64,
    pub multi_candidate: bool,
    pub finger_extraction: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            masker: MaskerConfig::default(),
            fingers: FingerConfig::default(),
            min_area_ratio: 0.05,
            multi_area_ratio: 0.5,
            approx_epsilon_ratio: 0.005,
            multi_candidate: false,
            finger_extraction: true,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fingers.validate()?;
        check_unit("min_area_ratio", self.min_area_ratio)?;
        check_unit("multi_area_ratio", self.multi_area_ratio)?;
        check_unit("approx_epsilon_ratio", self.approx_epsilon_ratio)
    }
}

/// One frame's fully processed hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub contour: Contour,
    /// Convex hull of the simplified contour.
    pub hull: Contour,
    pub defects: Vec<Defect>,
    pub centroid: Centroid,
    /// Most extended finger first.
    pub fingers: Vec<Finger>,
    pub finger_graph: Option<FingerGraph>,
    pub width: u32,
    pub height: u32,
}

impl Candidate {
    /// The finger that drives directional gestures.
    pub fn primary_finger(&self) -> Option<&Finger> {
        self.fingers.first()
    }

    /// The finger highest up in the image; drives pointer motion.
    pub fn topmost_finger(&self) -> Option<&Finger> {
        self.fingers.iter().min_by(|a, b| a.y.total_cmp(&b.y))
    }

    /// `finger` position in resolution-independent `[0, 1]` coordinates.
    pub fn normalized(&self, finger: &Finger) -> (f64, f64) {
        (
            finger.x / self.width as f64,
            finger.y / self.height as f64,
        )
    }
}

/// Turns depth frames into hand candidates.
pub struct HandTracker<G: PolygonGeometry = ImageprocGeometry> {
    masker: DepthMasker,
    config: TrackerConfig,
    geometry: G,
    region_detector: Option<Box<dyn RegionDetector + Send>>,
}

impl HandTracker<ImageprocGeometry> {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        Self::with_geometry(config, ImageprocGeometry)
    }
}

impl<G: PolygonGeometry> HandTracker<G> {
    pub fn with_geometry(config: TrackerConfig, geometry: G) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            masker: DepthMasker::new(config.masker.clone()),
            config,
            geometry,
            region_detector: None,
        })
    }

    /// Restricts tracking to the best region reported by `detector`.
    pub fn with_region_detector(mut self, detector: Box<dyn RegionDetector + Send>) -> Self {
        self.region_detector = Some(detector);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Candidates of `frame` according to the `multi_candidate` flag.
    pub fn track(&self, frame: &DepthFrame) -> Vec<Candidate> {
        let focus = self.focus(frame);
        self.track_focused(frame, focus.as_ref())
    }

    /// The single largest hand of `frame`, if any contour clears the noise floor.
    pub fn detect(&self, frame: &DepthFrame) -> Option<Candidate> {
        let focus = self.focus(frame);
        self.detect_focused(frame, focus.as_ref())
    }

    /// Every hand of comparable size in `frame`, each with its own centroid.
    pub fn detect_multiple(&self, frame: &DepthFrame) -> Vec<Candidate> {
        let focus = self.focus(frame);
        self.detect_multiple_focused(frame, focus.as_ref())
    }

    /// Like `track`, cropped to the first of `regions` (best first) instead of the
    /// attached detector's proposal. No regions means no crop.
    pub fn detect_in_region(&self, frame: &DepthFrame, regions: &[Region]) -> Vec<Candidate> {
        self.track_focused(frame, regions.first())
    }

    fn track_focused(&self, frame: &DepthFrame, focus: Option<&Region>) -> Vec<Candidate> {
        if self.config.multi_candidate {
            self.detect_multiple_focused(frame, focus)
        } else {
            self.detect_focused(frame, focus).into_iter().collect()
        }
    }

    fn detect_focused(&self, frame: &DepthFrame, focus: Option<&Region>) -> Option<Candidate> {
        let mask = self.masker.mask(frame, focus);
        let Some(centroid) = mask.centroid else {
            debug!("empty mask, no candidate");
            return None;
        };

        let floor = self.noise_floor(frame);
        let mut best: Option<(Contour, f64)> = None;
        for contour in self.geometry.find_contours(&mask.image) {
            let area = self.geometry.area(&contour);
            if area >= floor && best.as_ref().is_none_or(|(_, max)| area > *max) {
                best = Some((contour, area));
            }
        }

        let Some((contour, area)) = best else {
            debug!(floor, "no contour above noise floor");
            return None;
        };
        debug!(area, points = contour.len(), "selected hand contour");
        Some(self.build_candidate(contour, centroid, frame))
    }

    fn detect_multiple_focused(&self, frame: &DepthFrame, focus: Option<&Region>) -> Vec<Candidate> {
        let mask = self.masker.mask(frame, focus);
        if mask.centroid.is_none() {
            return Vec::new();
        }

        let floor = self.noise_floor(frame);
        let measured: Vec<(Contour, f64)> = self
            .geometry
            .find_contours(&mask.image)
            .into_iter()
            .map(|c| {
                let area = self.geometry.area(&c);
                (c, area)
            })
            .filter(|(_, area)| *area >= floor)
            .collect();

        let Some(max_area) = measured.iter().map(|(_, a)| *a).reduce(f64::max) else {
            debug!(floor, "no contour above noise floor");
            return Vec::new();
        };
        let cutoff = max_area * self.config.multi_area_ratio;

        let candidates: Vec<Candidate> = measured
            .into_iter()
            .filter(|(_, area)| *area >= cutoff)
            .filter_map(|(contour, _)| {
                let centroid = mask.centroid_within(&contour)?;
                Some(self.build_candidate(contour, centroid, frame))
            })
            .collect();
        debug!(count = candidates.len(), max_area, "selected hand contours");
        candidates
    }

    fn focus(&self, frame: &DepthFrame) -> Option<Region> {
        self.region_detector
            .as_ref()
            .and_then(|detector| detector.detect(frame).first().copied())
    }

    fn noise_floor(&self, frame: &DepthFrame) -> f64 {
        self.config.min_area_ratio * frame.width() as f64 * frame.height() as f64
    }

    fn build_candidate(&self, contour: Contour, centroid: Centroid, frame: &DepthFrame) -> Candidate {
        let (width, height) = (frame.width(), frame.height());

        let (finger_graph, fingers) = if self.config.finger_extraction {
            match find_fingers(&contour, &centroid, width, height, &self.config.fingers) {
                Some((graph, fingers)) => (Some(graph), fingers),
                None => (None, Vec::new()),
            }
        } else {
            (None, Vec::new())
        };

        let epsilon = contour.len() as f64 * self.config.approx_epsilon_ratio;
        let simplified = self.geometry.approx_poly_dp(&contour, epsilon);
        let hull = self.geometry.convex_hull(&simplified);
        let defects = self.geometry.convexity_defects(&simplified, &hull);

        Candidate {
            contour,
            hull,
            defects,
            centroid,
            fingers,
            finger_graph,
            width,
            height,
        }
    }
}
