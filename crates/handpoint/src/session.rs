//! Live pointing: fused body points in, smoothed screen position out.

use std::sync::Arc;
use std::time::Instant;

use handpoint_calib::CalibrationModel;
use handpoint_core::{HandKeypoint, HandSide};
use handpoint_fusion::{BodyPoint, BodyPointsProvider};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::projector::{
    project_tracked, PointerParams, PointerParamsError, PointingResult, ScreenPointer,
};

/// Projects the head through the index fingertip of one hand.
#[derive(Clone, Debug)]
pub struct PointingSession {
    model: Arc<CalibrationModel>,
    hand: HandSide,
    pointer: ScreenPointer,
}

impl PointingSession {
    pub fn new(
        model: Arc<CalibrationModel>,
        hand: HandSide,
        params: &PointerParams,
    ) -> Result<Self, PointerParamsError> {
        Ok(Self {
            model,
            hand,
            pointer: ScreenPointer::new(params)?,
        })
    }

    #[inline]
    pub fn hand(&self) -> HandSide {
        self.hand
    }

    #[inline]
    pub fn model(&self) -> &CalibrationModel {
        &self.model
    }

    /// Project the current body points and feed the pointer.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, body), fields(hand = ?self.hand))
    )]
    pub fn update<P: BodyPointsProvider + ?Sized>(
        &mut self,
        body: &P,
        now: Instant,
    ) -> PointingResult {
        let head = body.body_point(BodyPoint::Head);
        let tip = body.body_point(BodyPoint::hand(self.hand, HandKeypoint::IndexTip));
        let result = project_tracked(head, tip, &self.model);
        if !result.valid {
            log::trace!(
                "no screen hit (head {:?}, fingertip {:?})",
                head.state,
                tip.state
            );
        }
        self.pointer.update(&result, now);
        result
    }

    /// Smoothed normalized position, `None` while pointing is unavailable.
    pub fn pointing(&self, now: Instant) -> Option<Point2<f32>> {
        self.pointer.current(now)
    }

    /// Swap in a new calibration; the pointer restarts.
    pub fn replace_model(&mut self, model: Arc<CalibrationModel>) {
        log::info!("calibration replaced");
        self.model = model;
        self.pointer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handpoint_core::{SkeletonJoint, TrackedPoint, KEYPOINT_COUNT};
    use handpoint_fusion::{FusedBody, SkeletonFrame};
    use nalgebra::{Point3, Vector3};

    fn body_pointing_at(head: Point3<f32>, tip: Point3<f32>, side: HandSide) -> FusedBody {
        let skeleton =
            SkeletonFrame::default().with_joint(SkeletonJoint::Head, TrackedPoint::tracked(head));
        let mut keypoints = [Point3::origin(); KEYPOINT_COUNT];
        keypoints[HandKeypoint::IndexTip.index()] = tip;
        let mut hands = [None, None];
        hands[side.index()] = Some(keypoints);
        FusedBody::new(skeleton, hands)
    }

    fn session(hand: HandSide) -> PointingSession {
        let model = CalibrationModel::new(Point3::origin(), Vector3::x(), Vector3::y());
        PointingSession::new(Arc::new(model), hand, &PointerParams::default()).expect("params")
    }

    #[test]
    fn uses_the_configured_hand() {
        let body = body_pointing_at(
            Point3::new(0.5, 0.5, 2.0),
            Point3::new(0.5, 0.5, 1.0),
            HandSide::Left,
        );
        let now = Instant::now();

        let mut right = session(HandSide::Right);
        assert!(!right.update(&body, now).valid);
        assert_eq!(right.pointing(now), None);

        let mut left = session(HandSide::Left);
        assert!(left.update(&body, now).valid);
        let p = left.pointing(now).expect("pointing");
        assert!((p - Point2::new(0.5, 0.5)).norm() < 1e-6);
    }

    #[test]
    fn replacing_the_model_resets_the_pointer() {
        let body = body_pointing_at(
            Point3::new(0.25, 0.5, 2.0),
            Point3::new(0.25, 0.5, 1.0),
            HandSide::Right,
        );
        let now = Instant::now();
        let mut s = session(HandSide::Right);
        s.update(&body, now);
        assert!(s.pointing(now).is_some());

        // Same plane, twice as wide.
        s.replace_model(Arc::new(CalibrationModel::new(
            Point3::origin(),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::y(),
        )));
        assert_eq!(s.pointing(now), None);
        let result = s.update(&body, now);
        assert!(result.valid);
        assert_eq!(s.pointing(now), Some(result.normalized));
        assert!((result.normalized.x - 0.125).abs() < 1e-6);
    }
}
