// THEORY:
// The `geometry` module is the seam between the tracker and the low-level polygon
// primitives it consumes: contour tracing, polygon simplification, convex hulls,
// convexity defects and areas. The tracker only ever talks to the `PolygonGeometry`
// trait, so a different backend (OpenCV, a GPU tracer, a test double) can be swapped
// in without touching the tracking logic.
//
// `ImageprocGeometry` is the default backend. It delegates to the `imageproc` crate
// for everything imageproc offers and computes convexity defects itself, since that
// primitive has no imageproc counterpart.
//
// Conventions shared by every backend:
// - Contours are closed point sequences in image pixel coordinates.
// - `area` is always non-negative, so areas of differently oriented contours can be
//   compared directly.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, contour_area, convex_hull};
use imageproc::point::Point as PixelPoint;

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Point) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

/// An ordered, closed sequence of points bounding one connected region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)` corners, or `None` for an empty contour.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }
}

/// A concavity between two consecutive hull vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defect {
    pub start: Point,
    pub end: Point,
    /// The contour point deepest inside the hull edge `start..end`.
    pub far: Point,
    /// Distance from `far` to the hull edge, in pixels.
    pub depth: f64,
}

/// The polygon primitives the tracker relies on.
pub trait PolygonGeometry {
    /// Outer borders of every connected foreground region of `mask`.
    fn find_contours(&self, mask: &GrayImage) -> Vec<Contour>;
    /// Douglas-Peucker simplification with tolerance `epsilon`.
    fn approx_poly_dp(&self, contour: &Contour, epsilon: f64) -> Contour;
    fn convex_hull(&self, contour: &Contour) -> Contour;
    fn convexity_defects(&self, contour: &Contour, hull: &Contour) -> Vec<Defect>;
    /// Enclosed area, never negative.
    fn area(&self, contour: &Contour) -> f64;
}

/// `PolygonGeometry` backed by `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocGeometry;

fn to_pixels(contour: &Contour) -> Vec<PixelPoint<i32>> {
    contour
        .points
        .iter()
        .map(|p| PixelPoint::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
}

fn from_pixels(points: &[PixelPoint<i32>]) -> Contour {
    Contour::new(
        points
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect(),
    )
}

impl PolygonGeometry for ImageprocGeometry {
    fn find_contours(&self, mask: &GrayImage) -> Vec<Contour> {
        find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer))
            .map(|c| from_pixels(&c.points))
            .collect()
    }

    fn approx_poly_dp(&self, contour: &Contour, epsilon: f64) -> Contour {
        // imageproc rejects a non-positive tolerance; nothing to simplify then.
        if epsilon <= 0.0 || contour.len() < 3 {
            return contour.clone();
        }
        from_pixels(&approximate_polygon_dp(&to_pixels(contour), epsilon, true))
    }

    fn convex_hull(&self, contour: &Contour) -> Contour {
        if contour.len() < 3 {
            return contour.clone();
        }
        let pixels = to_pixels(contour);
        from_pixels(&convex_hull(pixels.as_slice()))
    }

    fn convexity_defects(&self, contour: &Contour, hull: &Contour) -> Vec<Defect> {
        convexity_defects(contour, hull)
    }

    fn area(&self, contour: &Contour) -> f64 {
        if contour.len() < 3 {
            return 0.0;
        }
        contour_area(&to_pixels(contour)).abs()
    }
}

/// Defects of `contour` against `hull`, in contour order.
///
/// Hull vertices are located on the contour by nearest point, so a hull produced
/// from a rounded copy of the contour still anchors correctly.
pub fn convexity_defects(contour: &Contour, hull: &Contour) -> Vec<Defect> {
    let n = contour.len();
    if n < 3 || hull.len() < 3 {
        return Vec::new();
    }

    let mut anchors: Vec<usize> = hull
        .points
        .iter()
        .filter_map(|h| {
            contour
                .points
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.distance_sq(h).total_cmp(&b.distance_sq(h)))
                .map(|(i, _)| i)
        })
        .collect();
    anchors.sort_unstable();
    anchors.dedup();
    if anchors.len() < 3 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for (k, &start_index) in anchors.iter().enumerate() {
        let end_index = anchors[(k + 1) % anchors.len()];
        let start = contour.points[start_index];
        let end = contour.points[end_index];

        let mut deepest: Option<(Point, f64)> = None;
        let mut i = (start_index + 1) % n;
        while i != end_index {
            let p = contour.points[i];
            let depth = distance_to_line(&p, &start, &end);
            if deepest.is_none_or(|(_, d)| depth > d) {
                deepest = Some((p, depth));
            }
            i = (i + 1) % n;
        }

        if let Some((far, depth)) = deepest {
            if depth > 0.0 {
                defects.push(Defect {
                    start,
                    end,
                    far,
                    depth,
                });
            }
        }
    }
    defects
}

fn distance_to_line(p: &Point, a: &Point, b: &Point) -> f64 {
    let length = a.distance(b);
    if length == 0.0 {
        return p.distance(a);
    }
    ((b.x - a.x) * (a.y - p.y) - (a.x - p.x) * (b.y - a.y)).abs() / length
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn filled_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn finds_one_outer_contour_per_region() {
        let mut mask = filled_rect(40, 40, 5, 5, 15, 15);
        for y in 25..35 {
            for x in 25..35 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = ImageprocGeometry.find_contours(&mask);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn area_is_non_negative_for_both_orientations() {
        let square = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]);
        let mut reversed = square.clone();
        reversed.points.reverse();
        assert_relative_eq!(ImageprocGeometry.area(&square), 100.0);
        assert_relative_eq!(ImageprocGeometry.area(&reversed), 100.0);
    }

    #[test]
    fn hull_of_square_keeps_corners() {
        let square = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(5.0, 5.0),
            Point::new(0.0, 10.0),
        ]);
        let hull = ImageprocGeometry.convex_hull(&square);
        assert!(hull.points.contains(&Point::new(10.0, 10.0)));
        assert!(!hull.points.contains(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn notch_produces_a_defect_at_its_tip() {
        // A "V" notch cut into the bottom edge of a square.
        let contour = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(5.0, 4.0),
            Point::new(0.0, 10.0),
        ]);
        let hull = ImageprocGeometry.convex_hull(&contour);
        let defects = ImageprocGeometry.convexity_defects(&contour, &hull);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].far, Point::new(5.0, 4.0));
        assert_relative_eq!(defects[0].depth, 6.0);
    }

    #[test]
    fn simplification_drops_collinear_points() {
        let contour = Contour::new(
            (0..=10)
                .map(|x| Point::new(x as f64, 0.0))
                .chain([Point::new(10.0, 10.0), Point::new(0.0, 10.0)])
                .collect(),
        );
        let simplified = ImageprocGeometry.approx_poly_dp(&contour, 0.5);
        assert!(simplified.len() < contour.len());
    }

    #[test]
    fn bounds_of_empty_contour_is_none() {
        assert!(Contour::default().bounds().is_none());
    }
}
