use handpoint_core::DEFAULT_MEDIAN_ITERATIONS;
use serde::{Deserialize, Serialize};

use crate::CalibrationError;

/// Tunables of the capture protocol and the solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Tracked captures collected per (corner, stance) cell.
    pub samples_per_cell: usize,
    /// Weiszfeld iterations for every geometric median.
    pub median_iterations: usize,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            samples_per_cell: 30,
            median_iterations: DEFAULT_MEDIAN_ITERATIONS,
        }
    }
}

impl CalibrationParams {
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.samples_per_cell == 0 {
            return Err(CalibrationError::InvalidParams(
                "samples_per_cell must be >= 1".into(),
            ));
        }
        if self.median_iterations == 0 {
            return Err(CalibrationError::InvalidParams(
                "median_iterations must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
