//! JSON persistence of calibrations and capture logs.

use std::fs;
use std::path::Path;

use handpoint_core::TrackedPoint;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::protocol::{CalibrationCell, CalibrationCorner, Stance};
use crate::sample::RawCapture;
use crate::solver::CalibrationResult;
use crate::CalibrationModel;

#[derive(thiserror::Error, Debug)]
pub enum CalibrationIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid calibration: {0}")]
    InvalidModel(&'static str),
}

/// On-disk form of a calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFile {
    pub origin: Point3<f32>,
    pub x_axis: Vector3<f32>,
    pub y_axis: Vector3<f32>,
    /// Mean corner spread of the solve, metres. Lower is better.
    #[serde(default)]
    pub quality: f32,
}

impl CalibrationFile {
    pub fn new(model: &CalibrationModel, quality: f32) -> Self {
        Self {
            origin: model.origin,
            x_axis: model.x_axis,
            y_axis: model.y_axis,
            quality,
        }
    }

    pub fn from_result(result: &CalibrationResult) -> Self {
        Self::new(&result.model, result.report.mean_spread)
    }

    /// Load a calibration from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this calibration to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// The stored model, checked for usability.
    pub fn model(&self) -> Result<CalibrationModel, CalibrationIoError> {
        let finite = self
            .origin
            .iter()
            .chain(self.x_axis.iter())
            .chain(self.y_axis.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(CalibrationIoError::InvalidModel("non-finite component"));
        }
        let model = CalibrationModel::new(self.origin, self.x_axis, self.y_axis);
        if model.normal().is_none() {
            return Err(CalibrationIoError::InvalidModel("axes do not span a plane"));
        }
        Ok(model)
    }
}

/// Load a calibration, treating any failure as "no calibration available".
pub fn load_or_none(path: impl AsRef<Path>) -> Option<CalibrationModel> {
    let path = path.as_ref();
    match CalibrationFile::load_json(path).and_then(|f| f.model()) {
        Ok(model) => Some(model),
        Err(e) => {
            log::warn!("no calibration available from {}: {}", path.display(), e);
            None
        }
    }
}

/// One line of a recorded calibration session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub corner: CalibrationCorner,
    pub stance: Stance,
    pub head: TrackedPoint,
    pub fingertip: TrackedPoint,
}

impl CaptureRecord {
    #[inline]
    pub fn cell(&self) -> CalibrationCell {
        CalibrationCell::new(self.corner, self.stance)
    }

    #[inline]
    pub fn capture(&self) -> RawCapture {
        RawCapture::new(self.head, self.fingertip)
    }
}

/// Read a JSON array of [`CaptureRecord`]s.
pub fn load_capture_log(path: impl AsRef<Path>) -> Result<Vec<CaptureRecord>, CalibrationIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
