//! Contract of the hand-landmark estimator collaborator.

use handpoint_core::{HandKeypoints, KEYPOINT_COUNT};
use nalgebra::Point3;

/// Raw estimator output for one cropped image.
///
/// Keypoints are in the estimator's own (crop-relative, arbitrarily scaled)
/// space; the scheduler rescales them into sensor space on acceptance.
#[derive(Clone, Debug, PartialEq)]
pub struct RawHandPose {
    pub keypoints: HandKeypoints,
    /// Detection score in `[0, 1]`.
    pub score: f32,
    pub handedness: f32,
}

impl RawHandPose {
    pub fn new(keypoints: HandKeypoints, score: f32, handedness: f32) -> Self {
        Self {
            keypoints,
            score,
            handedness,
        }
    }

    /// All keypoints at the origin with a zero score.
    pub fn empty() -> Self {
        Self::new([Point3::origin(); KEYPOINT_COUNT], 0.0, 0.0)
    }
}

/// Failures reported by an estimator instead of a pose.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("estimator failed: {0}")]
    Failed(String),
    #[error("estimator timed out")]
    TimedOut,
}

/// One-shot continuation handed to the estimator with every request.
pub type EstimateCallback = Box<dyn FnOnce(Result<RawHandPose, EstimatorError>) + Send + 'static>;

/// Asynchronous hand-landmark estimator.
///
/// `estimate` must not block: it starts inference on `image` and calls
/// `on_complete` exactly once, from any thread, when the result is ready.
/// Implementations do not need to guard against concurrent requests; the
/// pipeline wrapper keeps at most one request in flight per instance.
pub trait HandPoseEstimator<I>: Send + Sync {
    fn estimate(&self, image: I, on_complete: EstimateCallback);
}

impl<I, F> HandPoseEstimator<I> for F
where
    F: Fn(I, EstimateCallback) + Send + Sync,
{
    fn estimate(&self, image: I, on_complete: EstimateCallback) {
        self(image, on_complete)
    }
}
