//! Hand keypoint layout and the fused hand pose sample.

use std::time::Instant;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::SkeletonJoint;

/// Number of keypoints per hand produced by the landmark estimator.
pub const KEYPOINT_COUNT: usize = 21;

/// Physical hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const BOTH: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            HandSide::Left => 0,
            HandSide::Right => 1,
        }
    }

    /// Sensor joint holding the wrist of this hand.
    pub fn wrist_joint(self) -> SkeletonJoint {
        match self {
            HandSide::Left => SkeletonJoint::WristLeft,
            HandSide::Right => SkeletonJoint::WristRight,
        }
    }

    /// Sensor joint holding the centre of this hand.
    pub fn center_joint(self) -> SkeletonJoint {
        match self {
            HandSide::Left => SkeletonJoint::HandLeft,
            HandSide::Right => SkeletonJoint::HandRight,
        }
    }
}

/// Semantic keypoint order of the landmark estimator: wrist, then four joints
/// per digit from base to tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HandKeypoint {
    Wrist = 0,
    Thumb1,
    Thumb2,
    Thumb3,
    ThumbTip,
    Index1,
    Index2,
    Index3,
    IndexTip,
    Middle1,
    Middle2,
    Middle3,
    MiddleTip,
    Ring1,
    Ring2,
    Ring3,
    RingTip,
    Pinky1,
    Pinky2,
    Pinky3,
    PinkyTip,
}

impl HandKeypoint {
    pub const ALL: [HandKeypoint; KEYPOINT_COUNT] = [
        HandKeypoint::Wrist,
        HandKeypoint::Thumb1,
        HandKeypoint::Thumb2,
        HandKeypoint::Thumb3,
        HandKeypoint::ThumbTip,
        HandKeypoint::Index1,
        HandKeypoint::Index2,
        HandKeypoint::Index3,
        HandKeypoint::IndexTip,
        HandKeypoint::Middle1,
        HandKeypoint::Middle2,
        HandKeypoint::Middle3,
        HandKeypoint::MiddleTip,
        HandKeypoint::Ring1,
        HandKeypoint::Ring2,
        HandKeypoint::Ring3,
        HandKeypoint::RingTip,
        HandKeypoint::Pinky1,
        HandKeypoint::Pinky2,
        HandKeypoint::Pinky3,
        HandKeypoint::PinkyTip,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-size keypoint array in [`HandKeypoint`] order.
pub type HandKeypoints = [Point3<f32>; KEYPOINT_COUNT];

/// An accepted hand pose, in sensor space.
///
/// Samples are immutable once built; the fusion layer replaces them wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct HandPoseSample {
    pub keypoints: HandKeypoints,
    /// Detection score in `[0, 1]`.
    pub score: f32,
    pub handedness: f32,
    /// Sensor frame the estimate was dispatched for.
    pub frame: u64,
    pub timestamp: Instant,
}

impl HandPoseSample {
    #[inline]
    pub fn keypoint(&self, k: HandKeypoint) -> Point3<f32> {
        self.keypoints[k.index()]
    }

    #[inline]
    pub fn wrist(&self) -> Point3<f32> {
        self.keypoint(HandKeypoint::Wrist)
    }

    /// Keypoints shifted by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> HandKeypoints {
        self.keypoints.map(|p| p + offset)
    }
}

/// Distance between wrist and index base, used as the hand's scale reference.
#[inline]
pub fn wrist_to_index_distance(keypoints: &HandKeypoints) -> f32 {
    (keypoints[HandKeypoint::Index1.index()] - keypoints[HandKeypoint::Wrist.index()]).norm()
}
