//! Raw pointing captures and their robust per-cell summary.

use handpoint_core::{geometric_median, Line, TrackedPoint};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// One head/fingertip reading taken while the operator points at a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCapture {
    pub head: TrackedPoint,
    pub fingertip: TrackedPoint,
}

impl RawCapture {
    pub fn new(head: TrackedPoint, fingertip: TrackedPoint) -> Self {
        Self { head, fingertip }
    }

    /// Both positions, if both are usable.
    pub fn usable(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        Some((self.head.usable()?, self.fingertip.usable()?))
    }
}

/// Robust head and fingertip position for one (corner, stance) cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub head: Point3<f32>,
    pub fingertip: Point3<f32>,
}

impl CalibrationSample {
    pub fn new(head: Point3<f32>, fingertip: Point3<f32>) -> Self {
        Self { head, fingertip }
    }

    /// Geometric median of heads and of fingertips, taken independently.
    ///
    /// Untracked captures are skipped; `None` if none are left.
    pub fn from_captures(captures: &[RawCapture], median_iterations: usize) -> Option<Self> {
        let (heads, tips): (Vec<_>, Vec<_>) =
            captures.iter().filter_map(RawCapture::usable).unzip();
        Some(Self {
            head: geometric_median(&heads, median_iterations)?,
            fingertip: geometric_median(&tips, median_iterations)?,
        })
    }

    /// Pointing ray from the head through the fingertip.
    #[inline]
    pub fn ray(&self) -> Option<Line> {
        Line::through(self.head, self.fingertip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use handpoint_core::TrackingState;

    #[test]
    fn untracked_captures_do_not_pull_the_sample() {
        let mut captures = vec![
            RawCapture::new(
                TrackedPoint::tracked(Point3::new(0.0, 1.6, 2.0)),
                TrackedPoint::tracked(Point3::new(0.2, 1.4, 1.5)),
            );
            5
        ];
        captures.push(RawCapture::new(
            TrackedPoint::new(TrackingState::NotTracked, Point3::new(9.0, 9.0, 9.0)),
            TrackedPoint::tracked(Point3::new(9.0, 9.0, 9.0)),
        ));
        captures.push(RawCapture::new(
            TrackedPoint::tracked(Point3::new(0.0, 1.6, 2.0)),
            TrackedPoint::not_provided(),
        ));

        let sample = CalibrationSample::from_captures(&captures, 5).expect("tracked captures");
        assert_relative_eq!(sample.head, Point3::new(0.0, 1.6, 2.0), epsilon = 1e-5);
        assert_relative_eq!(sample.fingertip, Point3::new(0.2, 1.4, 1.5), epsilon = 1e-5);
    }

    #[test]
    fn inferred_points_count_as_usable() {
        let capture = RawCapture::new(
            TrackedPoint::new(TrackingState::Inferred, Point3::new(0.0, 1.0, 2.0)),
            TrackedPoint::tracked(Point3::new(0.0, 1.0, 1.0)),
        );
        assert!(capture.usable().is_some());
        assert!(CalibrationSample::from_captures(&[RawCapture::default()], 5).is_none());
    }

    #[test]
    fn ray_needs_distinct_points() {
        let p = Point3::new(0.0, 1.0, 2.0);
        assert!(CalibrationSample::new(p, p).ray().is_none());
        let ray = CalibrationSample::new(p, Point3::new(0.0, 1.0, 1.0))
            .ray()
            .expect("ray");
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-6);
    }
}
