//! Corner triangulation and screen basis construction.

use handpoint_core::{geometric_median, line_line_intersection, Line};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::io::CaptureRecord;
use crate::protocol::{CalibrationCell, CalibrationCorner, Stance};
use crate::sample::{CalibrationSample, RawCapture};
use crate::{CalibrationError, CalibrationModel, CalibrationParams};

/// Collapsed samples indexed by corner and stance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CornerSamples {
    cells: [[Option<CalibrationSample>; 3]; 4],
}

impl CornerSamples {
    /// Store the sample of `cell`, replacing any previous one.
    pub fn insert(&mut self, cell: CalibrationCell, sample: CalibrationSample) {
        self.cells[cell.corner.index()][cell.stance.index()] = Some(sample);
    }

    pub fn get(&self, cell: CalibrationCell) -> Option<&CalibrationSample> {
        self.cells[cell.corner.index()][cell.stance.index()].as_ref()
    }

    /// Number of cells holding a sample.
    pub fn len(&self) -> usize {
        self.cells.iter().flatten().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The three stance samples of `corner`, in [`Stance::ALL`] order.
    pub fn corner(
        &self,
        corner: CalibrationCorner,
    ) -> Result<[CalibrationSample; 3], CalibrationError> {
        let row = &self.cells[corner.index()];
        match row {
            [Some(a), Some(b), Some(c)] => Ok([*a, *b, *c]),
            _ => Err(CalibrationError::IncompleteCorner {
                corner,
                found: row.iter().filter(|s| s.is_some()).count(),
            }),
        }
    }

    /// Collapse a capture log into per-cell samples.
    ///
    /// Records may arrive in any order. A cell whose records are all
    /// untracked is an [`CalibrationError::EmptyCell`].
    pub fn from_records(
        records: &[CaptureRecord],
        median_iterations: usize,
    ) -> Result<Self, CalibrationError> {
        let mut samples = Self::default();
        for cell in CalibrationCell::all() {
            let captures: Vec<RawCapture> = records
                .iter()
                .filter(|r| r.cell() == cell)
                .map(CaptureRecord::capture)
                .collect();
            if captures.is_empty() {
                continue;
            }
            let sample = CalibrationSample::from_captures(&captures, median_iterations).ok_or(
                CalibrationError::EmptyCell {
                    corner: cell.corner,
                    stance: cell.stance,
                },
            )?;
            samples.insert(cell, sample);
        }
        Ok(samples)
    }
}

/// Triangulated screen corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerEstimate {
    pub corner: CalibrationCorner,
    pub position: Point3<f32>,
    /// Closest-approach points of every intersecting ray pair.
    pub candidates: Vec<Point3<f32>>,
    /// Mean distance of the candidates to `position`.
    pub spread: f32,
}

/// Estimate one corner from its three stance rays.
///
/// Each pair of rays contributes both closest-approach points; the corner is
/// the geometric median of those (up to six) candidates. Parallel pairs are
/// skipped.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(samples)))]
pub fn triple_intersect(
    corner: CalibrationCorner,
    samples: &[CalibrationSample; 3],
    median_iterations: usize,
) -> Result<CornerEstimate, CalibrationError> {
    let ray = |i: usize| {
        samples[i].ray().ok_or(CalibrationError::DegenerateRay {
            corner,
            stance: Stance::ALL[i],
        })
    };
    let rays: [Line; 3] = [ray(0)?, ray(1)?, ray(2)?];

    let mut candidates = Vec::with_capacity(6);
    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        match line_line_intersection(&rays[i], &rays[j]) {
            Some((p, q)) => candidates.extend([p, q]),
            None => log::debug!("{:?}: rays {} and {} are parallel", corner, i, j),
        }
    }

    let position = geometric_median(&candidates, median_iterations)
        .ok_or(CalibrationError::NoIntersectingPair { corner })?;
    let spread = candidates.iter().map(|p| (p - position).norm()).sum::<f32>()
        / candidates.len() as f32;

    Ok(CornerEstimate {
        corner,
        position,
        candidates,
        spread,
    })
}

/// Screen basis before and after the orthogonality correction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneBasis {
    pub model: CalibrationModel,
    pub raw_x: Vector3<f32>,
    pub raw_y: Vector3<f32>,
}

/// Build the screen basis from four corner estimates.
///
/// The raw edge vectors are nudged symmetrically towards orthogonality while
/// keeping their lengths. `None` if the corners are collinear.
pub fn plane_basis(
    tl: Point3<f32>,
    tr: Point3<f32>,
    bl: Point3<f32>,
    br: Point3<f32>,
) -> Option<PlaneBasis> {
    let center = Point3::from((tl.coords + tr.coords + bl.coords + br.coords) / 4.0);
    let x = nalgebra::center(&tr, &br) - nalgebra::center(&tl, &bl);
    let y = nalgebra::center(&bl, &br) - nalgebra::center(&tl, &tr);

    let normal = y.cross(&x).try_normalize(f32::EPSILON)?;
    let x_axis = (x + normal.cross(&y)).try_normalize(f32::EPSILON)? * x.norm();
    let y_axis = (y + x.cross(&normal)).try_normalize(f32::EPSILON)? * y.norm();
    let origin = center - (x_axis + y_axis) / 2.0;

    Some(PlaneBasis {
        model: CalibrationModel::new(origin, x_axis, y_axis),
        raw_x: x,
        raw_y: y,
    })
}

/// Per-corner diagnostics of a solve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerReport {
    pub corner: CalibrationCorner,
    pub position: Point3<f32>,
    pub spread: f32,
    pub candidates: usize,
}

/// How well the captured rays agreed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub corners: Vec<CornerReport>,
    /// Mean corner spread in metres; persisted as the calibration quality.
    pub mean_spread: f32,
    /// `x · y` of the edge vectors before correction.
    pub raw_dot: f32,
    /// `x_axis · y_axis` of the final model.
    pub corrected_dot: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationResult {
    pub model: CalibrationModel,
    pub report: CalibrationReport,
}

/// Triangulate all four corners and derive the screen model.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn solve(
    samples: &CornerSamples,
    params: &CalibrationParams,
) -> Result<CalibrationResult, CalibrationError> {
    params.validate()?;

    let mut estimates = Vec::with_capacity(4);
    for corner in CalibrationCorner::ALL {
        let stance_samples = samples.corner(corner)?;
        estimates.push(triple_intersect(corner, &stance_samples, params.median_iterations)?);
    }
    let [tl, tr, bl, br] = [0, 1, 2, 3].map(|i| estimates[i].position);
    let basis = plane_basis(tl, tr, bl, br).ok_or(CalibrationError::DegenerateScreen)?;

    let corners: Vec<CornerReport> = estimates
        .iter()
        .map(|e| CornerReport {
            corner: e.corner,
            position: e.position,
            spread: e.spread,
            candidates: e.candidates.len(),
        })
        .collect();
    let mean_spread = corners.iter().map(|c| c.spread).sum::<f32>() / corners.len() as f32;
    let report = CalibrationReport {
        corners,
        mean_spread,
        raw_dot: basis.raw_x.dot(&basis.raw_y),
        corrected_dot: basis.model.x_axis.dot(&basis.model.y_axis),
    };

    log::info!(
        "calibrated screen {:.3} x {:.3} m, mean corner spread {:.4} m",
        basis.model.width(),
        basis.model.height(),
        report.mean_spread
    );
    Ok(CalibrationResult {
        model: basis.model,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_towards(head: Point3<f32>, target: Point3<f32>) -> CalibrationSample {
        // Fingertip 60% of the way from head to target.
        CalibrationSample::new(head, head + (target - head) * 0.6)
    }

    fn stance_heads() -> [Point3<f32>; 3] {
        [
            Point3::new(0.0, 1.6, 2.5),
            Point3::new(-0.4, 1.55, 2.4),
            Point3::new(0.4, 1.55, 2.4),
        ]
    }

    #[test]
    fn exact_rays_meet_at_the_corner() {
        let target = Point3::new(-0.8, 1.4, 0.0);
        let samples = stance_heads().map(|h| sample_towards(h, target));
        let est = triple_intersect(CalibrationCorner::TopLeft, &samples, 5).expect("corner");
        assert_eq!(est.candidates.len(), 6);
        assert_relative_eq!(est.position, target, epsilon = 1e-4);
        assert!(est.spread < 1e-4);
    }

    #[test]
    fn degenerate_and_parallel_rays_are_errors() {
        let target = Point3::new(0.5, 1.0, 0.0);
        let mut samples = stance_heads().map(|h| sample_towards(h, target));
        samples[1].fingertip = samples[1].head;
        assert_eq!(
            triple_intersect(CalibrationCorner::TopRight, &samples, 5).unwrap_err(),
            CalibrationError::DegenerateRay {
                corner: CalibrationCorner::TopRight,
                stance: Stance::LeanLeft,
            }
        );

        let dir = Vector3::new(0.0, 0.0, -1.0);
        let parallel = stance_heads().map(|h| CalibrationSample::new(h, h + dir));
        assert_eq!(
            triple_intersect(CalibrationCorner::TopRight, &parallel, 5).unwrap_err(),
            CalibrationError::NoIntersectingPair {
                corner: CalibrationCorner::TopRight
            }
        );
    }

    #[test]
    fn one_parallel_pair_leaves_four_candidates() {
        let dir = Vector3::new(0.25, -0.5, -1.0);
        let h0 = Point3::new(0.0, 1.5, 2.5);
        let h1 = Point3::new(-0.5, 1.5, 2.5);
        let h2 = Point3::new(0.5, 1.5, 2.5);
        let samples = [
            CalibrationSample::new(h0, h0 + dir),
            CalibrationSample::new(h1, h1 + Vector3::new(0.5, -0.25, -1.0)),
            CalibrationSample::new(h2, h2 + dir),
        ];
        let est = triple_intersect(CalibrationCorner::BottomLeft, &samples, 5).expect("corner");
        assert_eq!(est.candidates.len(), 4);
    }

    #[test]
    fn basis_of_a_rectangle_is_exact() {
        let basis = plane_basis(
            Point3::new(-1.0, 1.5, 0.0),
            Point3::new(1.0, 1.5, 0.0),
            Point3::new(-1.0, 0.5, 0.0),
            Point3::new(1.0, 0.5, 0.0),
        )
        .expect("basis");
        let m = basis.model;
        assert_relative_eq!(m.origin, Point3::new(-1.0, 1.5, 0.0), epsilon = 1e-6);
        assert_relative_eq!(m.x_axis, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(m.y_axis, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn basis_correction_reduces_skew() {
        let basis = plane_basis(
            Point3::new(-1.0, 1.5, 0.02),
            Point3::new(1.05, 1.58, -0.01),
            Point3::new(-0.93, 0.48, 0.0),
            Point3::new(1.0, 0.52, 0.03),
        )
        .expect("basis");
        let raw = basis.raw_x.dot(&basis.raw_y).abs();
        let corrected = basis.model.x_axis.dot(&basis.model.y_axis).abs();
        assert!(corrected < raw, "corrected {corrected} vs raw {raw}");
        assert_relative_eq!(basis.model.width(), basis.raw_x.norm(), epsilon = 1e-5);
        assert_relative_eq!(basis.model.height(), basis.raw_y.norm(), epsilon = 1e-5);
    }

    #[test]
    fn collinear_corners_have_no_basis() {
        let p = |x: f32| Point3::new(x, 1.0, 0.0);
        assert!(plane_basis(p(0.0), p(1.0), p(2.0), p(3.0)).is_none());
    }

    #[test]
    fn solve_reports_missing_stances() {
        let mut samples = CornerSamples::default();
        let s = sample_towards(stance_heads()[0], Point3::new(0.0, 1.0, 0.0));
        samples.insert(CalibrationCell::new(CalibrationCorner::TopLeft, Stance::Centered), s);
        assert_eq!(samples.len(), 1);
        assert_eq!(
            solve(&samples, &CalibrationParams::default()).unwrap_err(),
            CalibrationError::IncompleteCorner {
                corner: CalibrationCorner::TopLeft,
                found: 1
            }
        );
    }
}
