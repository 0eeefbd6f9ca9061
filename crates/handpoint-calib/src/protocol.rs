//! Capture protocol: four screen corners, each pointed at from three stances.

use handpoint_core::TrackedPoint;
use serde::{Deserialize, Serialize};

use crate::sample::{CalibrationSample, RawCapture};
use crate::solver::{solve, CalibrationResult, CornerSamples};
use crate::{CalibrationError, CalibrationParams};

/// Screen corner used as a pointing target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CalibrationCorner {
    pub const ALL: [CalibrationCorner; 4] = [
        CalibrationCorner::TopLeft,
        CalibrationCorner::TopRight,
        CalibrationCorner::BottomLeft,
        CalibrationCorner::BottomRight,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CalibrationCorner::TopLeft => "top-left",
            CalibrationCorner::TopRight => "top-right",
            CalibrationCorner::BottomLeft => "bottom-left",
            CalibrationCorner::BottomRight => "bottom-right",
        }
    }
}

/// Body posture held while pointing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Centered,
    LeanLeft,
    LeanRight,
}

impl Stance {
    pub const ALL: [Stance; 3] = [Stance::Centered, Stance::LeanLeft, Stance::LeanRight];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Stance::Centered => "Stand centered",
            Stance::LeanLeft => "Lean to your left",
            Stance::LeanRight => "Lean to your right",
        }
    }
}

/// One (corner, stance) combination of the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalibrationCell {
    pub corner: CalibrationCorner,
    pub stance: Stance,
}

impl CalibrationCell {
    pub const COUNT: usize = 12;

    pub fn new(corner: CalibrationCorner, stance: Stance) -> Self {
        Self { corner, stance }
    }

    /// Cells in capture order: corner by corner, every stance per corner.
    pub fn all() -> impl Iterator<Item = CalibrationCell> {
        CalibrationCorner::ALL
            .into_iter()
            .flat_map(|corner| Stance::ALL.into_iter().map(move |stance| Self::new(corner, stance)))
    }
}

/// Result of feeding one capture to the protocol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CaptureOutcome {
    /// Head or fingertip not usable; nothing recorded.
    Discarded { cell: CalibrationCell },
    Collected {
        cell: CalibrationCell,
        collected: usize,
        required: usize,
    },
    /// The cell reached its capture count and was collapsed; the protocol
    /// moved on to the next cell.
    CellComplete {
        cell: CalibrationCell,
        sample: CalibrationSample,
    },
    /// Every cell is already complete; the capture was ignored.
    Finished,
}

/// Drives the operator through all twelve cells in a fixed order.
#[derive(Clone, Debug)]
pub struct CalibrationProtocol {
    params: CalibrationParams,
    cells: Vec<CalibrationCell>,
    current: usize,
    buffer: Vec<RawCapture>,
    samples: CornerSamples,
}

impl CalibrationProtocol {
    pub fn new(params: CalibrationParams) -> Result<Self, CalibrationError> {
        params.validate()?;
        Ok(Self {
            buffer: Vec::with_capacity(params.samples_per_cell),
            params,
            cells: CalibrationCell::all().collect(),
            current: 0,
            samples: CornerSamples::default(),
        })
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// Cell currently being captured, `None` once complete.
    pub fn current_cell(&self) -> Option<CalibrationCell> {
        self.cells.get(self.current).copied()
    }

    /// Completed cells and total cells.
    pub fn progress(&self) -> (usize, usize) {
        (self.current, self.cells.len())
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.cells.len()
    }

    /// Samples collected so far.
    pub fn samples(&self) -> &CornerSamples {
        &self.samples
    }

    /// What the operator should do next.
    pub fn instruction(&self) -> String {
        match self.current_cell() {
            Some(cell) => format!(
                "{} and point at the {} corner of the screen ({}/{})",
                cell.stance.instruction(),
                cell.corner.label(),
                self.buffer.len(),
                self.params.samples_per_cell
            ),
            None => "Calibration complete".to_string(),
        }
    }

    /// Record one capture for the current cell.
    pub fn push(&mut self, head: TrackedPoint, fingertip: TrackedPoint) -> CaptureOutcome {
        let Some(cell) = self.current_cell() else {
            return CaptureOutcome::Finished;
        };
        let capture = RawCapture::new(head, fingertip);
        if capture.usable().is_none() {
            log::debug!("{:?}/{:?}: untracked capture discarded", cell.corner, cell.stance);
            return CaptureOutcome::Discarded { cell };
        }

        self.buffer.push(capture);
        let required = self.params.samples_per_cell;
        if self.buffer.len() < required {
            return CaptureOutcome::Collected {
                cell,
                collected: self.buffer.len(),
                required,
            };
        }

        let collapsed =
            CalibrationSample::from_captures(&self.buffer, self.params.median_iterations);
        self.buffer.clear();
        let Some(sample) = collapsed else {
            return CaptureOutcome::Discarded { cell };
        };
        self.samples.insert(cell, sample);
        self.current += 1;
        log::info!(
            "calibration cell {}/{} done: {} corner, {:?}",
            self.current,
            self.cells.len(),
            cell.corner.label(),
            cell.stance
        );
        CaptureOutcome::CellComplete { cell, sample }
    }

    /// Drop the captures of the current cell and start it over.
    pub fn restart_cell(&mut self) {
        self.buffer.clear();
    }

    /// Solve the screen plane from the completed protocol.
    pub fn finish(&self) -> Result<CalibrationResult, CalibrationError> {
        if !self.is_complete() {
            return Err(CalibrationError::ProtocolIncomplete {
                remaining: self.cells.len() - self.current,
            });
        }
        solve(&self.samples, &self.params)
    }
}
