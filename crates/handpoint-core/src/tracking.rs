//! Sensor-side tracking types: per-joint tracking state and skeleton joints.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// How the sensor (or the fusion layer) obtained a point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// No value at all; the position is meaningless.
    #[default]
    NotProvided,
    Tracked,
    /// Estimated by the sensor from neighbouring joints.
    Inferred,
    NotTracked,
}

impl TrackingState {
    /// Only tracked and inferred points may enter geometric computations.
    #[inline]
    pub fn is_usable(self) -> bool {
        matches!(self, TrackingState::Tracked | TrackingState::Inferred)
    }
}

/// A position tagged with its tracking state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedPoint {
    pub state: TrackingState,
    pub position: Point3<f32>,
}

impl TrackedPoint {
    pub fn new(state: TrackingState, position: Point3<f32>) -> Self {
        Self { state, position }
    }

    pub fn tracked(position: Point3<f32>) -> Self {
        Self::new(TrackingState::Tracked, position)
    }

    pub fn not_provided() -> Self {
        Self::new(TrackingState::NotProvided, Point3::origin())
    }

    /// The position, if the state allows using it.
    #[inline]
    pub fn usable(&self) -> Option<Point3<f32>> {
        self.state.is_usable().then_some(self.position)
    }
}

impl Default for TrackedPoint {
    fn default() -> Self {
        Self::not_provided()
    }
}

/// Skeleton joints the pointing system reads from the body sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonJoint {
    Head,
    Neck,
    SpineShoulder,
    ShoulderLeft,
    ShoulderRight,
    ElbowLeft,
    ElbowRight,
    WristLeft,
    WristRight,
    HandLeft,
    HandRight,
}

impl SkeletonJoint {
    pub const ALL: [SkeletonJoint; 11] = [
        SkeletonJoint::Head,
        SkeletonJoint::Neck,
        SkeletonJoint::SpineShoulder,
        SkeletonJoint::ShoulderLeft,
        SkeletonJoint::ShoulderRight,
        SkeletonJoint::ElbowLeft,
        SkeletonJoint::ElbowRight,
        SkeletonJoint::WristLeft,
        SkeletonJoint::WristRight,
        SkeletonJoint::HandLeft,
        SkeletonJoint::HandRight,
    ];
}
