//! Head-to-fingertip ray projection onto the calibrated screen.

use std::time::{Duration, Instant};

use handpoint_calib::CalibrationModel;
use handpoint_core::{line_plane_intersection, Line, TrackedPoint};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Where a pointing ray meets the screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointingResult {
    /// Both normalized coordinates lie in `[0, 1]`.
    pub valid: bool,
    /// `(0, 0)` is the top-left corner, `(1, 1)` the bottom-right one.
    pub normalized: Point2<f32>,
}

impl PointingResult {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            normalized: Point2::origin(),
        }
    }
}

/// Project the ray from `head` through `fingertip` onto the screen plane.
///
/// Invalid when the points coincide, the model has no plane, the ray is
/// parallel to the screen, or the hit lies outside the screen.
pub fn project(
    head: Point3<f32>,
    fingertip: Point3<f32>,
    model: &CalibrationModel,
) -> PointingResult {
    let (Some(ray), Some(plane)) = (Line::through(head, fingertip), model.plane()) else {
        return PointingResult::invalid();
    };
    let Some(hit) = line_plane_intersection(&ray, &plane) else {
        return PointingResult::invalid();
    };
    let normalized = model.to_screen(&hit);
    let inside = |v: f32| (0.0..=1.0).contains(&v);
    PointingResult {
        valid: inside(normalized.x) && inside(normalized.y),
        normalized,
    }
}

/// [`project`] for sensor points; untracked input is invalid.
pub fn project_tracked(
    head: TrackedPoint,
    fingertip: TrackedPoint,
    model: &CalibrationModel,
) -> PointingResult {
    match (head.usable(), fingertip.usable()) {
        (Some(h), Some(f)) => project(h, f, model),
        _ => PointingResult::invalid(),
    }
}

/// Pixel position of normalized screen coordinates.
pub fn to_pixels(normalized: &Point2<f32>, width: u32, height: u32) -> Point2<f32> {
    Point2::new(normalized.x * width as f32, normalized.y * height as f32)
}

/// Smoothing and staleness of the on-screen pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerParams {
    /// Seconds without a valid projection after which pointing is unavailable.
    pub stale_after: f32,
    /// Weight of the previous position in exponential smoothing, `[0, 0.9]`.
    pub smooth_factor: f32,
}

impl Default for PointerParams {
    fn default() -> Self {
        Self {
            stale_after: 0.5,
            smooth_factor: 0.5,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PointerParamsError {
    #[error("stale_after must be a positive, representable number of seconds (got {0})")]
    InvalidTimeout(f32),
    #[error("smooth_factor must be in [0, 0.9] (got {0})")]
    InvalidSmoothing(f32),
}

impl PointerParams {
    pub fn validate(&self) -> Result<(), PointerParamsError> {
        self.stale_duration()?;
        if !(0.0..=0.9).contains(&self.smooth_factor) {
            return Err(PointerParamsError::InvalidSmoothing(self.smooth_factor));
        }
        Ok(())
    }

    fn stale_duration(&self) -> Result<Duration, PointerParamsError> {
        if !(self.stale_after > 0.0) {
            return Err(PointerParamsError::InvalidTimeout(self.stale_after));
        }
        Duration::try_from_secs_f32(self.stale_after)
            .map_err(|_| PointerParamsError::InvalidTimeout(self.stale_after))
    }
}

/// Smoothed pointer position with a staleness timeout.
///
/// Only valid projections move the pointer. Once none has arrived for
/// `stale_after`, the pointer is unavailable and the next valid projection
/// restarts smoothing from scratch.
#[derive(Clone, Debug)]
pub struct ScreenPointer {
    smooth_factor: f32,
    stale_after: Duration,
    position: Point2<f32>,
    last_valid: Option<Instant>,
}

impl ScreenPointer {
    pub fn new(params: &PointerParams) -> Result<Self, PointerParamsError> {
        params.validate()?;
        Ok(Self {
            smooth_factor: params.smooth_factor,
            stale_after: params.stale_duration()?,
            position: Point2::origin(),
            last_valid: None,
        })
    }

    /// Feed the projection computed at `now`.
    pub fn update(&mut self, result: &PointingResult, now: Instant) -> Option<Point2<f32>> {
        if result.valid {
            self.position = if self.is_available(now) {
                let s = self.smooth_factor;
                Point2::from(self.position.coords * s + result.normalized.coords * (1.0 - s))
            } else {
                result.normalized
            };
            self.last_valid = Some(now);
        }
        self.current(now)
    }

    pub fn is_available(&self, now: Instant) -> bool {
        self.last_valid
            .is_some_and(|t| now.saturating_duration_since(t) <= self.stale_after)
    }

    /// Smoothed normalized position, `None` when stale.
    pub fn current(&self, now: Instant) -> Option<Point2<f32>> {
        self.is_available(now).then_some(self.position)
    }

    pub fn reset(&mut self) {
        self.last_valid = None;
    }
}
