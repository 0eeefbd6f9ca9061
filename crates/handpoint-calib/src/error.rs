use crate::protocol::{CalibrationCorner, Stance};

/// Reasons a calibration run cannot produce a model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("corner {corner:?} has {found} of 3 stance samples")]
    IncompleteCorner {
        corner: CalibrationCorner,
        found: usize,
    },
    #[error("corner {corner:?}, stance {stance:?}: head and fingertip coincide")]
    DegenerateRay {
        corner: CalibrationCorner,
        stance: Stance,
    },
    #[error("corner {corner:?}: no two stance rays intersect")]
    NoIntersectingPair { corner: CalibrationCorner },
    #[error("corner {corner:?}, stance {stance:?}: no tracked captures")]
    EmptyCell {
        corner: CalibrationCorner,
        stance: Stance,
    },
    #[error("corner estimates do not span a plane")]
    DegenerateScreen,
    #[error("calibration protocol incomplete: {remaining} cells remaining")]
    ProtocolIncomplete { remaining: usize },
    #[error("invalid calibration params: {0}")]
    InvalidParams(String),
}
