//! Screen-plane calibration from pointing gestures.
//!
//! The operator points at each screen corner from three stances. For every
//! (corner, stance) cell a batch of head/fingertip captures is collapsed to a
//! [`CalibrationSample`] with a geometric median. Each corner is then
//! triangulated from its three pointing rays ([`triple_intersect`]) and the
//! four corners are turned into a near-orthogonal screen basis
//! ([`plane_basis`]).
//!
//! ```no_run
//! use handpoint_calib::{CalibrationParams, CalibrationProtocol, CaptureOutcome};
//! use handpoint_core::TrackedPoint;
//! use nalgebra::Point3;
//!
//! let mut protocol = CalibrationProtocol::new(CalibrationParams::default()).unwrap();
//! while !protocol.is_complete() {
//!     println!("{}", protocol.instruction());
//!     let head = TrackedPoint::tracked(Point3::new(0.0, 1.6, 2.0));
//!     let tip = TrackedPoint::tracked(Point3::new(0.1, 1.5, 1.6));
//!     if let CaptureOutcome::CellComplete { cell, .. } = protocol.push(head, tip) {
//!         println!("{cell:?} done");
//!     }
//! }
//! let solved = protocol.finish();
//! println!("{solved:?}");
//! ```

mod error;
mod io;
mod model;
mod params;
mod protocol;
mod sample;
mod solver;

pub use error::CalibrationError;
pub use io::{load_capture_log, load_or_none, CalibrationFile, CalibrationIoError, CaptureRecord};
pub use model::CalibrationModel;
pub use params::CalibrationParams;
pub use protocol::{CalibrationCell, CalibrationCorner, CalibrationProtocol, CaptureOutcome, Stance};
pub use sample::{CalibrationSample, RawCapture};
pub use solver::{
    plane_basis, solve, triple_intersect, CalibrationReport, CalibrationResult, CornerEstimate,
    CornerReport, CornerSamples, PlaneBasis,
};
