//! High-level facade crate for the `handpoint-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the geometry, fusion and calibration crates
//! - the pointing projector: head-to-fingertip ray onto the calibrated screen
//! - a [`PointingSession`] that turns fused body points into a smoothed pointer
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//! use handpoint::calib::load_or_none;
//! use handpoint::core::HandSide;
//! use handpoint::fusion::FusedBody;
//! use handpoint::{PointerParams, PointingSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let Some(model) = load_or_none("calibration.json") else {
//!     return Ok(());
//! };
//! let mut session = PointingSession::new(Arc::new(model), HandSide::Right, &PointerParams::default())?;
//! let body = FusedBody::default();
//! let hit = session.update(&body, Instant::now());
//! println!("valid: {}, at {:?}", hit.valid, session.pointing(Instant::now()));
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `handpoint::core`: lines, planes, medians, hand and skeleton types.
//! - `handpoint::fusion`: per-hand pose fusion over asynchronous estimators.
//! - `handpoint::calib`: guided calibration protocol and screen solver.
//! - [`projector`]: one-shot projection and pointer smoothing.

pub use handpoint_calib as calib;
pub use handpoint_core as core;
pub use handpoint_fusion as fusion;

pub mod projector;
mod session;

pub use handpoint_calib::{CalibrationModel, CalibrationProtocol};
pub use handpoint_core::{HandSide, TrackedPoint};
pub use handpoint_fusion::{FusedBody, FusionScheduler};
pub use projector::{
    project, project_tracked, to_pixels, PointerParams, PointerParamsError, PointingResult,
    ScreenPointer,
};
pub use session::PointingSession;
