//! Uniform access to skeleton joints and fused hand keypoints.

use handpoint_core::{HandKeypoint, HandKeypoints, HandSide, SkeletonJoint, TrackedPoint};
use serde::{Deserialize, Serialize};

use crate::sensor::{SkeletonFrame, SkeletonSource};

/// A named point on the tracked body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPoint {
    Head,
    Neck,
    SpineShoulder,
    ShoulderLeft,
    ShoulderRight,
    ElbowLeft,
    ElbowRight,
    LeftHand(HandKeypoint),
    RightHand(HandKeypoint),
}

/// Where the value of a [`BodyPoint`] comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointSource {
    Hand { side: HandSide, keypoint: HandKeypoint },
    Skeleton(SkeletonJoint),
}

impl BodyPoint {
    pub fn hand(side: HandSide, keypoint: HandKeypoint) -> Self {
        match side {
            HandSide::Left => BodyPoint::LeftHand(keypoint),
            HandSide::Right => BodyPoint::RightHand(keypoint),
        }
    }

    pub fn source(self) -> PointSource {
        match self {
            BodyPoint::Head => PointSource::Skeleton(SkeletonJoint::Head),
            BodyPoint::Neck => PointSource::Skeleton(SkeletonJoint::Neck),
            BodyPoint::SpineShoulder => PointSource::Skeleton(SkeletonJoint::SpineShoulder),
            BodyPoint::ShoulderLeft => PointSource::Skeleton(SkeletonJoint::ShoulderLeft),
            BodyPoint::ShoulderRight => PointSource::Skeleton(SkeletonJoint::ShoulderRight),
            BodyPoint::ElbowLeft => PointSource::Skeleton(SkeletonJoint::ElbowLeft),
            BodyPoint::ElbowRight => PointSource::Skeleton(SkeletonJoint::ElbowRight),
            BodyPoint::LeftHand(keypoint) => PointSource::Hand {
                side: HandSide::Left,
                keypoint,
            },
            BodyPoint::RightHand(keypoint) => PointSource::Hand {
                side: HandSide::Right,
                keypoint,
            },
        }
    }
}

/// Anything that can answer body-point queries.
pub trait BodyPointsProvider {
    fn body_point(&self, point: BodyPoint) -> TrackedPoint;
}

/// Snapshot of the sensor skeleton combined with the fused hand poses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FusedBody {
    pub skeleton: SkeletonFrame,
    /// Fused keypoints per hand, indexed by [`HandSide::index`].
    pub hands: [Option<HandKeypoints>; 2],
}

impl FusedBody {
    pub fn new(skeleton: SkeletonFrame, hands: [Option<HandKeypoints>; 2]) -> Self {
        Self { skeleton, hands }
    }

    /// Fused keypoints of one hand, if a pose has been accepted for it.
    pub fn hand(&self, side: HandSide) -> Option<&HandKeypoints> {
        self.hands[side.index()].as_ref()
    }
}

impl BodyPointsProvider for FusedBody {
    fn body_point(&self, point: BodyPoint) -> TrackedPoint {
        match point.source() {
            PointSource::Skeleton(joint) => self.skeleton.joint(joint),
            PointSource::Hand { side, keypoint } => self
                .hand(side)
                .map_or_else(TrackedPoint::not_provided, |kp| {
                    TrackedPoint::tracked(kp[keypoint.index()])
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handpoint_core::{TrackingState, KEYPOINT_COUNT};
    use nalgebra::Point3;

    #[test]
    fn hand_points_route_to_their_side() {
        assert_eq!(
            BodyPoint::hand(HandSide::Right, HandKeypoint::IndexTip).source(),
            PointSource::Hand {
                side: HandSide::Right,
                keypoint: HandKeypoint::IndexTip
            }
        );
        assert_eq!(
            BodyPoint::ElbowLeft.source(),
            PointSource::Skeleton(SkeletonJoint::ElbowLeft)
        );
    }

    #[test]
    fn fused_body_answers_from_both_sources() {
        let head = Point3::new(0.0, 1.7, 2.5);
        let skeleton =
            SkeletonFrame::default().with_joint(SkeletonJoint::Head, TrackedPoint::tracked(head));
        let mut right = [Point3::origin(); KEYPOINT_COUNT];
        right[HandKeypoint::IndexTip.index()] = Point3::new(0.3, 1.2, 2.0);
        let body = FusedBody::new(skeleton, [None, Some(right)]);

        assert_eq!(body.body_point(BodyPoint::Head).usable(), Some(head));
        assert_eq!(
            body.body_point(BodyPoint::RightHand(HandKeypoint::IndexTip))
                .usable(),
            Some(Point3::new(0.3, 1.2, 2.0))
        );
        assert_eq!(
            body.body_point(BodyPoint::LeftHand(HandKeypoint::IndexTip))
                .state,
            TrackingState::NotProvided
        );
        assert_eq!(
            body.body_point(BodyPoint::Neck).state,
            TrackingState::NotProvided
        );
    }
}
