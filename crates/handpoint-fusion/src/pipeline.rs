//! Busy/idle gate around one estimator instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::estimator::{EstimatorError, HandPoseEstimator, RawHandPose};
use crate::sensor::Modality;

/// Whether a pipeline has an inference in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Dispatched,
}

/// Result of one inference, as delivered to the completion continuation.
#[derive(Clone, Debug)]
pub struct PipelineCompletion {
    pub modality: Modality,
    /// Sensor frame the request was dispatched for.
    pub frame: u64,
    pub result: Result<RawHandPose, EstimatorError>,
}

impl PipelineCompletion {
    /// Detection score; a failed inference counts as zero.
    pub fn score(&self) -> f32 {
        self.result.as_ref().map_or(0.0, |pose| pose.score)
    }
}

/// Wraps exactly one estimator with a single-slot admission gate.
///
/// `submit` on a dispatched pipeline drops the request instead of queueing it.
/// The gate reopens when the estimator completes, before the completion is
/// handed on, whether or not the result will be used.
pub struct PosePipeline<I> {
    modality: Modality,
    estimator: Arc<dyn HandPoseEstimator<I>>,
    busy: Arc<AtomicBool>,
}

impl<I: Send + 'static> PosePipeline<I> {
    pub fn new(modality: Modality, estimator: Arc<dyn HandPoseEstimator<I>>) -> Self {
        Self {
            modality,
            estimator,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn state(&self) -> PipelineState {
        if self.busy.load(Ordering::Acquire) {
            PipelineState::Dispatched
        } else {
            PipelineState::Idle
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state() == PipelineState::Idle
    }

    /// Start an inference on `image` unless one is already in flight.
    ///
    /// Returns `false` (and drops `image`) when the pipeline is dispatched.
    /// `on_complete` runs exactly once per accepted submit, on whatever
    /// thread the estimator completes on.
    pub fn submit<F>(&self, image: I, frame: u64, on_complete: F) -> bool
    where
        F: FnOnce(PipelineCompletion) + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::trace!("{:?} pipeline busy, frame {} dropped", self.modality, frame);
            return false;
        }

        let busy = Arc::clone(&self.busy);
        let modality = self.modality;
        self.estimator.estimate(
            image,
            Box::new(move |result| {
                busy.store(false, Ordering::Release);
                on_complete(PipelineCompletion {
                    modality,
                    frame,
                    result,
                });
            }),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::EstimateCallback;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Parked {
        pending: Mutex<Vec<(u32, EstimateCallback)>>,
    }

    impl HandPoseEstimator<u32> for Parked {
        fn estimate(&self, image: u32, on_complete: EstimateCallback) {
            self.pending
                .lock()
                .expect("lock")
                .push((image, on_complete));
        }
    }

    impl Parked {
        fn complete_next(&self, result: Result<RawHandPose, EstimatorError>) -> u32 {
            let (image, cb) = self.pending.lock().expect("lock").remove(0);
            cb(result);
            image
        }

        fn pending(&self) -> usize {
            self.pending.lock().expect("lock").len()
        }
    }

    #[test]
    fn second_submit_while_dispatched_is_dropped() {
        let est = Arc::new(Parked::default());
        let pipeline = PosePipeline::<u32>::new(Modality::Color, est.clone());
        let done = Arc::new(Mutex::new(Vec::new()));

        let sink = done.clone();
        assert!(pipeline.submit(1, 10, move |c| sink.lock().expect("lock").push(c.frame)));
        assert_eq!(pipeline.state(), PipelineState::Dispatched);

        let sink = done.clone();
        assert!(!pipeline.submit(2, 11, move |c| sink.lock().expect("lock").push(c.frame)));
        assert_eq!(pipeline.state(), PipelineState::Dispatched);
        assert_eq!(est.pending(), 1);

        assert_eq!(est.complete_next(Ok(RawHandPose::empty())), 1);
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(*done.lock().expect("lock"), vec![10]);
    }

    #[test]
    fn failed_inference_reopens_gate_with_zero_score() {
        let est = Arc::new(Parked::default());
        let pipeline = PosePipeline::<u32>::new(Modality::Infrared, est.clone());
        let score = Arc::new(Mutex::new(None));

        let sink = score.clone();
        pipeline.submit(7, 0, move |c| {
            assert_eq!(c.modality, Modality::Infrared);
            *sink.lock().expect("lock") = Some(c.score());
        });
        est.complete_next(Err(EstimatorError::TimedOut));

        assert!(pipeline.is_idle());
        assert_eq!(*score.lock().expect("lock"), Some(0.0));
    }

    #[test]
    fn synchronous_estimator_completes_inside_submit() {
        let est: Arc<dyn HandPoseEstimator<u32>> =
            Arc::new(|_img: u32, cb: EstimateCallback| cb(Ok(RawHandPose::empty())));
        let pipeline = PosePipeline::new(Modality::Color, est);
        let hits = Arc::new(Mutex::new(0));
        for frame in 0..3 {
            let sink = hits.clone();
            assert!(pipeline.submit(0, frame, move |_| *sink.lock().expect("lock") += 1));
        }
        assert_eq!(*hits.lock().expect("lock"), 3);
        assert!(pipeline.is_idle());
    }
}
