use std::sync::Arc;
use std::time::Instant;

use handpoint_core::{wrist_to_index_distance, HandPoseSample, HandSide};
use nalgebra::Point3;

use crate::estimator::EstimatorError;
use crate::params::{FusionParams, HandednessBand};
use crate::pipeline::PipelineCompletion;

/// Why a completion did not replace the accepted pose.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    EstimatorFailed(EstimatorError),
    /// Score not strictly above the current (decayed) accepted score.
    NotImproving { score: f32, accepted: f32 },
    /// Handedness outside this hand's band.
    WrongHandedness { handedness: f32 },
    /// Raw wrist-to-index-base distance outside the plausible range.
    ImplausibleScale { distance: f32 },
    /// The sensor wrist the pose is anchored to is not usable right now.
    WristUntracked,
}

/// Per-hand plausibility limits, derived from [`FusionParams`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct AcceptRules {
    pub band: HandednessBand,
    pub min_scale: f32,
    pub max_scale: f32,
    pub reference_length: f32,
}

impl AcceptRules {
    pub fn for_hand(params: &FusionParams, side: HandSide) -> Self {
        Self {
            band: params.handedness.band(side),
            min_scale: params.min_hand_scale,
            max_scale: params.max_hand_scale,
            reference_length: params.reference_hand_length,
        }
    }
}

/// Score bookkeeping and the accepted pose of one hand.
///
/// Invariant: `accepted_score >= decay_floor`.
#[derive(Clone, Debug)]
pub struct HandFusionState {
    side: HandSide,
    accepted_score: f32,
    decay_floor: f32,
    last_accepted: Option<Arc<HandPoseSample>>,
}

impl HandFusionState {
    pub(crate) fn new(side: HandSide, decay_floor: f32) -> Self {
        Self {
            side,
            accepted_score: decay_floor,
            decay_floor,
            last_accepted: None,
        }
    }

    #[inline]
    pub fn side(&self) -> HandSide {
        self.side
    }

    #[inline]
    pub fn accepted_score(&self) -> f32 {
        self.accepted_score
    }

    #[inline]
    pub fn decay_floor(&self) -> f32 {
        self.decay_floor
    }

    #[inline]
    pub fn last_accepted(&self) -> Option<&Arc<HandPoseSample>> {
        self.last_accepted.as_ref()
    }

    pub(crate) fn decay(&mut self, step: f32) {
        self.accepted_score = (self.accepted_score - step).max(self.decay_floor);
    }

    /// Apply the accept rule to `completion` and build the sensor-space sample.
    ///
    /// Raw keypoints are rescaled so the wrist-to-index-base distance equals
    /// `reference_length`, and translated so the wrist sits on `live_wrist`.
    pub(crate) fn evaluate(
        &self,
        completion: &PipelineCompletion,
        rules: &AcceptRules,
        live_wrist: Option<Point3<f32>>,
    ) -> Result<HandPoseSample, Rejection> {
        let raw = match &completion.result {
            Ok(raw) => raw,
            Err(e) => return Err(Rejection::EstimatorFailed(e.clone())),
        };
        if !(raw.score > self.accepted_score) {
            return Err(Rejection::NotImproving {
                score: raw.score,
                accepted: self.accepted_score,
            });
        }
        if !rules.band.contains(raw.handedness) {
            return Err(Rejection::WrongHandedness {
                handedness: raw.handedness,
            });
        }
        let distance = wrist_to_index_distance(&raw.keypoints);
        if !(rules.min_scale..=rules.max_scale).contains(&distance) {
            return Err(Rejection::ImplausibleScale { distance });
        }
        let anchor = live_wrist.ok_or(Rejection::WristUntracked)?;

        let scale = rules.reference_length / distance;
        let raw_wrist = raw.keypoints[0];
        let keypoints = raw.keypoints.map(|p| anchor + (p - raw_wrist) * scale);

        Ok(HandPoseSample {
            keypoints,
            score: raw.score,
            handedness: raw.handedness,
            frame: completion.frame,
            timestamp: Instant::now(),
        })
    }

    pub(crate) fn accept(&mut self, sample: Arc<HandPoseSample>) {
        self.accepted_score = sample.score.max(self.decay_floor);
        self.last_accepted = Some(sample);
    }
}
