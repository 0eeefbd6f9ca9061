//! Stateless 3-D primitives: lines, planes, closest-approach solves and the
//! geometric median.

use nalgebra::{Matrix2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default number of Weiszfeld iterations used by [`geometric_median`] callers.
pub const DEFAULT_MEDIAN_ITERATIONS: usize = 5;

/// Distances below this are clamped when weighting median candidates (metres).
const MEDIAN_MIN_DISTANCE: f32 = 1e-6;

/// Parametric line `origin + t * direction`.
///
/// `direction` does not need to be unit length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Line {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    /// Line from `from` through `to`, direction normalized.
    ///
    /// Returns `None` when both points coincide.
    pub fn through(from: Point3<f32>, to: Point3<f32>) -> Option<Self> {
        let direction = (to - from).try_normalize(f32::EPSILON)?;
        Some(Self::new(from, direction))
    }

    #[inline]
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Plane through `point` with normal `normal`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Plane {
    pub fn new(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { point, normal }
    }

    /// Signed distance of `p` along the normal, in units of `|normal|`.
    #[inline]
    pub fn signed_offset(&self, p: &Point3<f32>) -> f32 {
        self.normal.dot(&(p - self.point))
    }
}

/// Intersect a line with a plane.
///
/// Returns `None` iff the direction is orthogonal to the plane normal (the line
/// is parallel to the plane, or the direction is zero).
pub fn line_plane_intersection(line: &Line, plane: &Plane) -> Option<Point3<f32>> {
    let denom = plane.normal.dot(&line.direction);
    if denom == 0.0 {
        return None;
    }
    let t = plane.normal.dot(&(plane.point - line.origin)) / denom;
    let p = line.at(t);
    if p.coords.iter().all(|c| c.is_finite()) {
        Some(p)
    } else {
        None
    }
}

/// Closest points between two lines.
///
/// Solves the 2×2 normal equations of `min |(o1 + s v1) - (o2 + t v2)|²` and
/// returns `(p1, p2)`, one point on each line. For skew lines these are two
/// distinct estimates of the same target; callers must not assume `p1 == p2`.
///
/// Returns `None` iff the directions are parallel (or one is zero), i.e. the
/// system is singular.
pub fn line_line_intersection(a: &Line, b: &Line) -> Option<(Point3<f32>, Point3<f32>)> {
    let v1 = a.direction;
    let v2 = b.direction;
    let w = a.origin - b.origin;

    let aa = v1.dot(&v1);
    let ab = v1.dot(&v2);
    let bb = v2.dot(&v2);

    // Singular iff sin²(angle) vanishes relative to the direction scales.
    let det = aa * bb - ab * ab;
    if !(det.abs() > f32::EPSILON * aa * bb) {
        return None;
    }

    let m = Matrix2::new(aa, -ab, ab, -bb);
    let rhs = Vector2::new(-w.dot(&v1), -w.dot(&v2));
    let st = m.try_inverse()? * rhs;

    Some((a.at(st.x), b.at(st.y)))
}

/// Arithmetic mean of a point set. Returns `None` for an empty set.
pub fn centroid(points: &[Point3<f32>]) -> Option<Point3<f32>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f32))
}

/// Geometric median via Weiszfeld iterations, starting at the centroid.
///
/// Each iteration replaces the estimate by the mean of the inputs weighted
/// with `1 / distance(estimate, point)`; distances are clamped below so an
/// estimate landing on an input point stays finite. Deterministic for a given
/// input and iteration count. Returns `None` for an empty set.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip(points), fields(n = points.len()))
)]
pub fn geometric_median(points: &[Point3<f32>], iterations: usize) -> Option<Point3<f32>> {
    let mut center = centroid(points)?;
    for _ in 0..iterations {
        let mut num = Vector3::zeros();
        let mut den = 0.0_f32;
        for p in points {
            let d = (p - center).norm().max(MEDIAN_MIN_DISTANCE);
            num += p.coords / d;
            den += 1.0 / d;
        }
        center = Point3::from(num / den);
    }
    Some(center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x, y, z)
    }

    fn assert_close(a: Point3<f32>, b: Point3<f32>, tol: f32) {
        assert!(
            (a - b).norm() < tol,
            "expected ({:.5},{:.5},{:.5}) ~ ({:.5},{:.5},{:.5}) within {}",
            a.x,
            a.y,
            a.z,
            b.x,
            b.y,
            b.z,
            tol
        );
    }

    #[test]
    fn line_hits_plane_at_known_point() {
        let target = p(0.3, -0.2, 1.5);
        let origin = p(1.0, 2.0, -1.0);
        let line = Line::new(origin, (target - origin) * 0.37);
        let plane = Plane::new(p(5.0, 7.0, 1.5), Vector3::new(0.0, 0.0, 2.0));

        let hit = line_plane_intersection(&line, &plane).expect("intersects");
        assert_close(hit, target, 1e-5);
    }

    #[test]
    fn tilted_plane_intersection() {
        let normal = Vector3::new(1.0, 1.0, 1.0);
        let plane = Plane::new(p(1.0, 0.0, 0.0), normal);
        let line = Line::new(p(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let hit = line_plane_intersection(&line, &plane).expect("intersects");
        assert_close(hit, p(1.0, 0.0, 0.0), 1e-6);
        assert_relative_eq!(plane.signed_offset(&hit), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn parallel_line_misses_plane() {
        let plane = Plane::new(p(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let line = Line::new(p(0.0, 0.0, 1.0), Vector3::new(1.0, 2.0, 0.0));
        assert!(line_plane_intersection(&line, &plane).is_none());

        let zero = Line::new(p(0.0, 0.0, 1.0), Vector3::zeros());
        assert!(line_plane_intersection(&zero, &plane).is_none());
    }

    #[test]
    fn intersecting_lines_meet_at_common_point() {
        let target = p(0.5, 1.0, 2.0);
        let a = Line::new(p(0.0, 0.0, 0.0), target - p(0.0, 0.0, 0.0));
        let b = Line::new(p(3.0, -1.0, 0.5), (target - p(3.0, -1.0, 0.5)) * 2.5);

        let (p1, p2) = line_line_intersection(&a, &b).expect("not parallel");
        assert_close(p1, target, 1e-5);
        assert_close(p2, target, 1e-5);
    }

    #[test]
    fn skew_lines_give_closest_approach() {
        // x-axis and a line parallel to y at z = 1.
        let a = Line::new(p(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let b = Line::new(p(2.0, 5.0, 1.0), Vector3::new(0.0, -3.0, 0.0));

        let (p1, p2) = line_line_intersection(&a, &b).expect("not parallel");
        assert_close(p1, p(2.0, 0.0, 0.0), 1e-5);
        assert_close(p2, p(2.0, 0.0, 1.0), 1e-5);
        let gap = p2 - p1;
        assert_relative_eq!(gap.dot(&a.direction), 0.0, epsilon = 1e-5);
        assert_relative_eq!(gap.dot(&b.direction), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let a = Line::new(p(0.0, 0.0, 0.0), Vector3::new(1.0, 2.0, 3.0));
        let b = Line::new(p(1.0, 0.0, 0.0), Vector3::new(2.0, 4.0, 6.0));
        assert!(line_line_intersection(&a, &b).is_none());

        let zero = Line::new(p(1.0, 0.0, 0.0), Vector3::zeros());
        assert!(line_line_intersection(&a, &zero).is_none());
    }

    #[test]
    fn line_through_rejects_coincident_points() {
        assert!(Line::through(p(1.0, 1.0, 1.0), p(1.0, 1.0, 1.0)).is_none());
        let line = Line::through(p(0.0, 0.0, 0.0), p(0.0, 0.0, 4.0)).expect("distinct");
        assert_relative_eq!(line.direction.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn median_of_empty_set_is_none() {
        assert!(geometric_median(&[], DEFAULT_MEDIAN_ITERATIONS).is_none());
    }

    #[test]
    fn median_of_single_point_is_that_point() {
        let m = geometric_median(&[p(1.0, 2.0, 3.0)], 5).expect("non-empty");
        assert_close(m, p(1.0, 2.0, 3.0), 1e-6);
    }

    #[test]
    fn median_resists_outlier() {
        let mut pts = vec![
            p(0.0, 0.0, 0.0),
            p(0.01, 0.0, 0.0),
            p(0.0, 0.01, 0.0),
            p(-0.01, 0.0, 0.01),
            p(0.0, -0.01, -0.01),
        ];
        pts.push(p(10.0, 10.0, 10.0));

        let mean = centroid(&pts).expect("non-empty");
        let median = geometric_median(&pts, 20).expect("non-empty");
        assert!(median.coords.norm() < mean.coords.norm());
        assert!(median.coords.norm() < 0.1);
    }

    #[test]
    fn median_stays_inside_convex_hull_and_ignores_order() {
        // Hull is the simplex spanned by the first four points.
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 2.0, 0.0),
            p(0.0, 0.0, 3.0),
            p(0.2, 0.3, 0.1),
        ];
        let m = geometric_median(&pts, DEFAULT_MEDIAN_ITERATIONS).expect("non-empty");
        let weights = [m.x, m.y / 2.0, m.z / 3.0];
        let origin_weight = 1.0 - weights.iter().sum::<f32>();
        for w in weights.into_iter().chain([origin_weight]) {
            assert!(w >= -1e-6, "barycentric weight {w} for {m:?}");
        }
        // Pulled away from the far vertices, towards the cluster at the origin.
        assert!(origin_weight > 0.25, "median {m:?}");

        let mut reversed = pts.clone();
        reversed.reverse();
        let r = geometric_median(&reversed, DEFAULT_MEDIAN_ITERATIONS).expect("non-empty");
        assert_close(m, r, 1e-5);
    }

    #[test]
    fn median_with_estimate_on_input_point_stays_finite() {
        // The centroid coincides with the middle point.
        let pts = [p(-1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)];
        let m = geometric_median(&pts, 5).expect("non-empty");
        assert!(m.coords.iter().all(|c| c.is_finite()));
        assert_close(m, p(0.0, 0.0, 0.0), 1e-5);
    }
}
