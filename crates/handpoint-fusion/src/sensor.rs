//! Body-sensor collaborator: skeleton queries, camera optics and hand crops.

use std::collections::BTreeMap;

use handpoint_core::{HandSide, SkeletonJoint, TrackedPoint};
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Skeleton as reported by the body sensor.
pub trait SkeletonSource {
    /// Position and tracking state of `joint`. Joints the sensor does not
    /// report come back as `NotProvided`.
    fn joint(&self, joint: SkeletonJoint) -> TrackedPoint;
}

/// Owned snapshot of a skeleton.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFrame {
    pub joints: BTreeMap<SkeletonJoint, TrackedPoint>,
}

impl SkeletonFrame {
    /// Copy every known joint out of `source`.
    pub fn capture<S: SkeletonSource + ?Sized>(source: &S) -> Self {
        let joints = SkeletonJoint::ALL
            .iter()
            .map(|&j| (j, source.joint(j)))
            .collect();
        Self { joints }
    }

    pub fn with_joint(mut self, joint: SkeletonJoint, point: TrackedPoint) -> Self {
        self.joints.insert(joint, point);
        self
    }
}

impl SkeletonSource for SkeletonFrame {
    fn joint(&self, joint: SkeletonJoint) -> TrackedPoint {
        self.joints.get(&joint).copied().unwrap_or_default()
    }
}

/// Video feed a pipeline consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Color,
    Infrared,
    /// Infrared crop augmented with colour information.
    Combined,
}

/// Pinhole description of one sensor camera, used to locate hands in its image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorOptics {
    /// Horizontal and vertical field of view, degrees.
    pub fov_deg: [f32; 2],
    /// Camera position relative to the skeleton origin, metres.
    pub pov: [f32; 3],
}

impl Default for SensorOptics {
    fn default() -> Self {
        Self {
            fov_deg: [84.1, 53.8],
            pov: [0.0, 0.0, 0.0],
        }
    }
}

impl SensorOptics {
    /// Normalized image coordinates of a camera-space point (`y` already
    /// pointing down). `None` for points at or behind the camera plane.
    pub fn world_to_image(&self, pos: Point3<f32>) -> Option<Point2<f32>> {
        let p = pos - Vector3::from(self.pov);
        if !(p.z > 0.0) {
            return None;
        }
        let nx = p.x / p.z;
        let ny = p.y / p.z;
        let hw = (self.fov_deg[0].to_radians() / 2.0).tan();
        let vw = (self.fov_deg[1].to_radians() / 2.0).tan();
        Some(Point2::new((nx / hw + 1.0) / 2.0, (ny / vw + 1.0) / 2.0))
    }

    /// Normalized image rectangle covering a square of half-size `radius`
    /// centred on a skeleton-space point.
    pub fn crop_box(&self, center: Point3<f32>, radius: f32) -> Option<CropBox> {
        // Skeleton y points up, image y points down.
        let pos = Point3::new(center.x, -center.y, center.z);
        let half = Vector3::new(radius, radius, 0.0);
        let a = self.world_to_image(pos - half)?;
        let b = self.world_to_image(pos + half)?;
        Some(CropBox {
            x: a.x,
            y: a.y,
            width: b.x - a.x,
            height: b.y - a.y,
        })
    }
}

/// Axis-aligned rectangle in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// What the scheduler asks the cropper for, once per (hand, modality).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRequest {
    pub hand: HandSide,
    pub modality: Modality,
    /// Last tracked hand centre, skeleton space.
    pub center: Point3<f32>,
    pub crop_box: CropBox,
}

/// Produces estimator-ready images from the latest video frames.
pub trait FrameCropper<I> {
    /// Crop the current frame of `request.modality`. `None` skips this
    /// pipeline for the frame (e.g. the feed has no frame yet).
    fn crop(&self, request: &CropRequest) -> Option<I>;
}

impl<I, F> FrameCropper<I> for F
where
    F: Fn(&CropRequest) -> Option<I>,
{
    fn crop(&self, request: &CropRequest) -> Option<I> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use handpoint_core::TrackingState;

    #[test]
    fn optical_axis_maps_to_image_center() {
        let optics = SensorOptics::default();
        let p = optics
            .world_to_image(Point3::new(0.0, 0.0, 2.0))
            .expect("in front");
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.5, epsilon = 1e-6);
        assert!(optics.world_to_image(Point3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn field_of_view_edge_maps_to_image_border() {
        let optics = SensorOptics {
            fov_deg: [90.0, 90.0],
            pov: [0.0, 0.0, 0.0],
        };
        let p = optics
            .world_to_image(Point3::new(1.0, -1.0, 1.0))
            .expect("in front");
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn crop_box_shrinks_with_distance() {
        let optics = SensorOptics::default();
        let near = optics
            .crop_box(Point3::new(0.1, 0.2, 1.0), 0.18)
            .expect("in front");
        let far = optics
            .crop_box(Point3::new(0.1, 0.2, 3.0), 0.18)
            .expect("in front");
        assert!(near.width > 0.0 && near.height > 0.0);
        assert_relative_eq!(near.width / far.width, 3.0, epsilon = 1e-4);
        // A hand above the optical axis lands in the upper half of the image.
        assert!(near.y + near.height / 2.0 < 0.5);
    }

    #[test]
    fn skeleton_frame_defaults_missing_joints() {
        let frame = SkeletonFrame::default().with_joint(
            SkeletonJoint::Head,
            TrackedPoint::tracked(Point3::new(0.0, 1.6, 2.0)),
        );
        assert_eq!(frame.joint(SkeletonJoint::Head).state, TrackingState::Tracked);
        assert_eq!(
            frame.joint(SkeletonJoint::WristLeft).state,
            TrackingState::NotProvided
        );
        let copy = SkeletonFrame::capture(&frame);
        assert_eq!(copy.joint(SkeletonJoint::Head), frame.joint(SkeletonJoint::Head));
    }
}
