// THEORY:
// The `SilhouetteAnalyzer` finds fingertips on a hand contour without any skeletal
// model. It looks at the silhouette from its centroid, like a radar sweep, and
// records how far the outline reaches in every direction. Extended fingers show up
// as tall, narrow peaks in that radial profile (the "finger graph").
//
// Algorithm steps:
// 1.  **Polar binning**: every contour point is mapped to an angular bucket by its
//     angle around the centroid. Only the farthest point per bucket is kept, which
//     discards the inner side of the outline at that angle.
// 2.  **Normalization**: distances are rescaled to [0, 1] with the min/max distance
//     of the whole contour, making the profile independent of hand size and depth.
// 3.  **Peak runs**: a sweep over the buckets opens a run when the profile rises
//     above the peak threshold and closes it when it drops below. The tallest bucket
//     of each run is one fingertip. Runs straddling the end of the sweep are joined
//     with the run that opened it, so one physical peak yields one finger.
// 4.  **Edge filter**: fingertips hugging the image border are depth noise.
// 5.  **Angular clustering**: fingers of one hand span well under a full turn.
//     The densest window of `cluster_span` of the resolution wins; peaks from a
//     second, disconnected object fall outside it.
// 6.  **Ordering**: most extended finger first.
//
// Like the blob detector of a motion pipeline, this is a stateless utility: the same
// contour and centroid always give the same fingers.

use crate::core_modules::geometry::{Contour, Point};
use crate::error::{ConfigError, check_unit};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Normalization range below which a profile is considered flat.
///
/// Only an outline at a constant distance is flat. A rasterized round blob keeps a
/// pixel-staircase range that normalization stretches to [0, 1], so it still yields
/// spurious fingers.
const FLAT_PROFILE_EPSILON: f64 = 1e-9;

/// Tunables for fingertip extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerConfig {
    /// Number of angular buckets spanning a full turn.
    pub resolution: usize,
    /// Normalized distance a bucket must exceed to belong to a peak.
    pub peak_threshold: f64,
    /// Fraction of width/height near each image edge where fingertips are dropped.
    pub edge_margin: f64,
    /// Largest angular span of one hand, as a fraction of `resolution`.
    pub cluster_span: f64,
}

impl Default for FingerConfig {
    fn default() -> Self {
        Self {
            resolution: 500,
            peak_threshold: 0.55,
            edge_margin: 0.03,
            cluster_span: 0.6,
        }
    }
}

impl FingerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::InvalidResolution);
        }
        check_unit("peak_threshold", self.peak_threshold)?;
        check_unit("edge_margin", self.edge_margin)?;
        check_unit("cluster_span", self.cluster_span)
    }
}

/// The farthest contour point seen in one angular bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerGraphEntry {
    /// Distance from the centroid, normalized to [0, 1].
    pub distance: f64,
    pub point: Point,
}

/// Radial profile of a contour: one optional entry per angular bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerGraph {
    buckets: Vec<Option<FingerGraphEntry>>,
}

impl FingerGraph {
    pub fn resolution(&self) -> usize {
        self.buckets.len()
    }

    pub fn get(&self, bucket: usize) -> Option<&FingerGraphEntry> {
        self.buckets.get(bucket).and_then(Option::as_ref)
    }

    /// Populated buckets in angular order.
    pub fn populated(&self) -> impl Iterator<Item = (usize, &FingerGraphEntry)> {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.as_ref().map(|e| (i, e)))
    }
}

/// A fingertip candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finger {
    pub x: f64,
    pub y: f64,
    /// Normalized distance from the centroid (0..1).
    pub length: f64,
    /// Angular bucket of the fingertip in the finger graph.
    pub bucket: usize,
}

impl Finger {
    fn from_entry(bucket: usize, entry: &FingerGraphEntry) -> Self {
        Self {
            x: entry.point.x,
            y: entry.point.y,
            length: entry.distance,
            bucket,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Sweep state of the peak extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Outside,
    Inside { best: usize },
}

pub mod silhouette_analyzer {
    use super::*;
    use tracing::trace;

    /// Builds the radial profile of `contour` around `centroid`.
    ///
    /// Returns `None` for a degenerate input: zero resolution, an empty contour, or a
    /// contour whose points all coincide with the centroid.
    pub fn finger_graph(contour: &Contour, centroid: &Point, resolution: usize) -> Option<FingerGraph> {
        if resolution == 0 || contour.is_empty() {
            return None;
        }

        let mut buckets: Vec<Option<FingerGraphEntry>> = vec![None; resolution];
        let mut min_distance = f64::INFINITY;
        let mut max_distance = 0.0f64;

        for point in &contour.points {
            let dx = point.x - centroid.x;
            let dy = point.y - centroid.y;
            let distance = dx.hypot(dy);
            min_distance = min_distance.min(distance);
            max_distance = max_distance.max(distance);
            if distance == 0.0 {
                // No angle for a point sitting on the centroid.
                continue;
            }

            let mut angle = (dx / distance).clamp(-1.0, 1.0).acos();
            if dy < 0.0 {
                angle = -angle;
            }
            let bucket = (((angle / TAU) + 0.5) * resolution as f64).floor() as usize % resolution;

            let slot = &mut buckets[bucket];
            if slot.is_none_or(|e| e.distance < distance) {
                *slot = Some(FingerGraphEntry {
                    distance,
                    point: *point,
                });
            }
        }

        if max_distance == 0.0 {
            return None;
        }

        let range = max_distance - min_distance;
        for entry in buckets.iter_mut().flatten() {
            entry.distance = if range < FLAT_PROFILE_EPSILON {
                0.0
            } else {
                (entry.distance - min_distance) / range
            };
        }

        Some(FingerGraph { buckets })
    }

    /// Extracts fingertips from `graph` for an image of `width` x `height`.
    pub fn fingers(graph: &FingerGraph, width: u32, height: u32, config: &FingerConfig) -> Vec<Finger> {
        let peaks = extract_peaks(graph, config.peak_threshold);
        trace!(peaks = peaks.len(), "finger graph peaks");

        let mut candidates = filter_edges(peaks, width, height, config.edge_margin);
        candidates.sort_by_key(|f| f.bucket);

        let mut fingers = densest_cluster(candidates, graph.resolution() as f64 * config.cluster_span);
        fingers.sort_by(|a, b| b.length.total_cmp(&a.length));
        fingers
    }

    /// Finger graph and fingers in one call; `None` when the graph is degenerate.
    pub fn find_fingers(
        contour: &Contour,
        centroid: &Point,
        width: u32,
        height: u32,
        config: &FingerConfig,
    ) -> Option<(FingerGraph, Vec<Finger>)> {
        let graph = finger_graph(contour, centroid, config.resolution)?;
        let fingers = fingers(&graph, width, height, config);
        Some((graph, fingers))
    }

    /// One fingertip per run of buckets above `threshold`, in sweep order.
    fn extract_peaks(graph: &FingerGraph, threshold: f64) -> Vec<Finger> {
        let mut peaks = Vec::new();
        let mut state = RunState::Outside;
        // Only a run opened by the very first bucket can continue past the sweep end.
        let opened_at_start = graph
            .populated()
            .next()
            .is_some_and(|(_, e)| e.distance > threshold);

        for (bucket, entry) in graph.populated() {
            let above = entry.distance > threshold;
            state = match state {
                RunState::Outside if above => RunState::Inside { best: bucket },
                RunState::Outside => RunState::Outside,
                RunState::Inside { best } if above => {
                    let best_distance = graph.get(best).map_or(f64::NEG_INFINITY, |e| e.distance);
                    if entry.distance > best_distance {
                        RunState::Inside { best: bucket }
                    } else {
                        RunState::Inside { best }
                    }
                }
                RunState::Inside { best } => {
                    if let Some(best_entry) = graph.get(best) {
                        peaks.push(Finger::from_entry(best, best_entry));
                    }
                    RunState::Outside
                }
            };
        }

        if let RunState::Inside { best } = state {
            if let Some(best_entry) = graph.get(best) {
                let tail = Finger::from_entry(best, best_entry);
                match peaks.first_mut() {
                    Some(head) if opened_at_start => {
                        if tail.length > head.length {
                            *head = tail;
                        }
                    }
                    _ => peaks.push(tail),
                }
            }
        }

        peaks
    }

    fn filter_edges(peaks: Vec<Finger>, width: u32, height: u32, margin: f64) -> Vec<Finger> {
        let (w, h) = (width as f64, height as f64);
        let (mx, my) = (w * margin, h * margin);
        peaks
            .into_iter()
            .filter(|f| f.x >= mx && f.x <= w - mx && f.y >= my && f.y <= h - my)
            .collect()
    }

    /// Keeps the fingers inside the `span`-wide window holding the most fingers.
    /// `fingers` must be sorted by bucket.
    fn densest_cluster(fingers: Vec<Finger>, span: f64) -> Vec<Finger> {
        let within = |from: &Finger, to: &Finger| ((to.bucket - from.bucket) as f64) < span;

        let mut best_start = 0;
        let mut best_count = 0;
        for (i, start) in fingers.iter().enumerate() {
            let count = fingers[i + 1..].iter().filter(|f| within(start, f)).count();
            if count > best_count {
                best_count = count;
                best_start = i;
            }
        }

        let Some(start) = fingers.get(best_start).copied() else {
            return fingers;
        };
        fingers
            .into_iter()
            .skip(best_start)
            .take_while(|f| within(&start, f))
            .collect()
    }
}
