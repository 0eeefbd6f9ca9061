//! Core types and geometric primitives for marker-less screen pointing.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about the depth sensor, the hand-landmark estimator or the screen; those
//! live in `handpoint-fusion` and `handpoint-calib`.
//!
//! All positions are in sensor space, metres, `f32`.

mod geometry;
mod hand;
mod logger;
mod tracking;

pub use geometry::{
    centroid, geometric_median, line_line_intersection, line_plane_intersection, Line, Plane,
    DEFAULT_MEDIAN_ITERATIONS,
};
pub use hand::{
    wrist_to_index_distance, HandKeypoint, HandKeypoints, HandPoseSample, HandSide,
    KEYPOINT_COUNT,
};
pub use tracking::{SkeletonJoint, TrackedPoint, TrackingState};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_filter, init_with_level, LogDirectiveError, LogFilter, LOG_ENV};
