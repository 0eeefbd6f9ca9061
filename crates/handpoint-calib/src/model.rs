use handpoint_core::Plane;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Screen plane in sensor space.
///
/// `origin` is the top-left corner; `x_axis` spans the screen width and
/// `y_axis` its height (towards the bottom edge). Both axes carry the
/// physical screen size as their length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub origin: Point3<f32>,
    pub x_axis: Vector3<f32>,
    pub y_axis: Vector3<f32>,
}

impl CalibrationModel {
    pub fn new(origin: Point3<f32>, x_axis: Vector3<f32>, y_axis: Vector3<f32>) -> Self {
        Self {
            origin,
            x_axis,
            y_axis,
        }
    }

    /// Unit normal `x_axis × y_axis`, `None` if the axes are degenerate.
    pub fn normal(&self) -> Option<Vector3<f32>> {
        self.x_axis.cross(&self.y_axis).try_normalize(f32::EPSILON)
    }

    pub fn plane(&self) -> Option<Plane> {
        Some(Plane::new(self.origin, self.normal()?))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x_axis.norm()
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y_axis.norm()
    }

    /// Normalized screen coordinates of a point on (or near) the plane.
    ///
    /// `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right one.
    pub fn to_screen(&self, point: &Point3<f32>) -> Point2<f32> {
        let d = point - self.origin;
        Point2::new(
            self.x_axis.dot(&d) / self.x_axis.norm_squared(),
            self.y_axis.dot(&d) / self.y_axis.norm_squared(),
        )
    }

    /// Sensor-space position of normalized screen coordinates.
    pub fn from_screen(&self, uv: &Point2<f32>) -> Point3<f32> {
        self.origin + self.x_axis * uv.x + self.y_axis * uv.y
    }

    /// Corners in top-left, top-right, bottom-left, bottom-right order.
    pub fn corners(&self) -> [Point3<f32>; 4] {
        [
            self.origin,
            self.origin + self.x_axis,
            self.origin + self.y_axis,
            self.origin + self.x_axis + self.y_axis,
        ]
    }
}
