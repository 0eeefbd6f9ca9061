//! Per-hand fusion of competing pose pipelines.
//!
//! Every video frame:
//! 1. the accepted score of each hand decays toward its floor,
//! 2. if any pipeline of any hand is still dispatched, nothing is dispatched
//!    (no partial dispatch, results never mix frames),
//! 3. otherwise every (hand, modality) pipeline gets a fresh crop.
//!
//! Completions arrive on arbitrary threads in arbitrary order. Each one runs
//! the accept rule against the hand's current score inside that hand's lock,
//! so check and write never interleave with another completion for the same
//! hand. Accepted poses are published once on the update channel.

mod state;

pub use state::{HandFusionState, Rejection};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use handpoint_core::{HandKeypoints, HandPoseSample, HandSide};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::body::FusedBody;
use crate::estimator::HandPoseEstimator;
use crate::params::{FusionParams, FusionParamsError, ModalityParams};
use crate::pipeline::{PipelineCompletion, PipelineState, PosePipeline};
use crate::sensor::{CropRequest, FrameCropper, Modality, SkeletonFrame, SkeletonSource};
use state::AcceptRules;

/// Notification that a hand has a new accepted pose.
#[derive(Clone, Debug)]
pub struct PoseUpdate {
    pub hand: HandSide,
    pub sample: Arc<HandPoseSample>,
}

/// What a video frame led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Requests were submitted to this many pipelines.
    Dispatched { requests: usize },
    /// A previous cycle is still in flight; the frame is dropped.
    PipelinesBusy,
    /// No body is tracked.
    NoBody,
}

/// Running totals, mostly for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FusionStats {
    pub frames: u64,
    pub busy_frames: u64,
    pub requests: u64,
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Default)]
struct LiveSkeleton {
    frame: Option<SkeletonFrame>,
    /// Last centre seen while both centre and wrist were usable.
    hand_centers: [Option<Point3<f32>>; 2],
}

#[derive(Default)]
struct Counters {
    busy_frames: AtomicU64,
    requests: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

/// State reachable from completion callbacks.
struct FusionShared {
    rules: [AcceptRules; 2],
    hands: [Mutex<HandFusionState>; 2],
    skeleton: Mutex<LiveSkeleton>,
    updates: Sender<PoseUpdate>,
    counters: Counters,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FusionShared {
    fn live_wrist(&self, side: HandSide) -> Option<Point3<f32>> {
        lock(&self.skeleton)
            .frame
            .as_ref()
            .and_then(|f| f.joint(side.wrist_joint()).usable())
    }

    fn complete(&self, side: HandSide, completion: PipelineCompletion) {
        let live_wrist = self.live_wrist(side);
        let rules = &self.rules[side.index()];

        let mut hand = lock(&self.hands[side.index()]);
        match hand.evaluate(&completion, rules, live_wrist) {
            Ok(sample) => {
                let sample = Arc::new(sample);
                log::debug!(
                    "{:?} hand: accepted {:?} score {:.3} (was {:.3}), frame {}",
                    side,
                    completion.modality,
                    sample.score,
                    hand.accepted_score(),
                    completion.frame
                );
                hand.accept(Arc::clone(&sample));
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                // Sent under the hand lock so updates for one hand stay ordered.
                if self
                    .updates
                    .send(PoseUpdate { hand: side, sample })
                    .is_err()
                {
                    log::trace!("pose update dropped, no receiver");
                }
            }
            Err(rejection) => {
                log::debug!(
                    "{:?} hand: rejected {:?} frame {}: {:?}",
                    side,
                    completion.modality,
                    completion.frame,
                    rejection
                );
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Owns every pipeline and the fusion state of both hands.
///
/// Sensor callbacks (`on_skeleton`, `on_video_frame`) are expected on a single
/// control thread; estimator completions may arrive on any thread.
pub struct FusionScheduler<I> {
    hands: [Vec<PosePipeline<I>>; 2],
    modalities: Vec<ModalityParams>,
    score_decay: f32,
    frame: u64,
    shared: Arc<FusionShared>,
}

impl<I: Send + 'static> FusionScheduler<I> {
    /// Build a scheduler with one estimator per (hand, modality).
    ///
    /// Returns the receiving end of the pose update channel alongside.
    pub fn new<F>(
        params: FusionParams,
        mut make_estimator: F,
    ) -> Result<(Self, Receiver<PoseUpdate>), FusionParamsError>
    where
        F: FnMut(HandSide, Modality) -> Arc<dyn HandPoseEstimator<I>>,
    {
        params.validate()?;

        let hands = HandSide::BOTH.map(|side| {
            params
                .modalities
                .iter()
                .map(|m| PosePipeline::new(m.modality, make_estimator(side, m.modality)))
                .collect::<Vec<_>>()
        });

        let (tx, rx) = mpsc::channel();
        let shared = FusionShared {
            rules: HandSide::BOTH.map(|side| AcceptRules::for_hand(&params, side)),
            hands: HandSide::BOTH
                .map(|side| Mutex::new(HandFusionState::new(side, params.decay_floor))),
            skeleton: Mutex::new(LiveSkeleton::default()),
            updates: tx,
            counters: Counters::default(),
        };

        log::info!(
            "fusion scheduler: {} modalities per hand, decay {} floor {}",
            params.modalities.len(),
            params.score_decay,
            params.decay_floor
        );

        Ok((
            Self {
                hands,
                modalities: params.modalities,
                score_decay: params.score_decay,
                frame: 0,
                shared: Arc::new(shared),
            },
            rx,
        ))
    }

    /// Record the latest skeleton.
    pub fn on_skeleton<S: SkeletonSource + ?Sized>(&self, source: &S) {
        let frame = SkeletonFrame::capture(source);
        let mut live = lock(&self.shared.skeleton);
        for side in HandSide::BOTH {
            let center = frame.joint(side.center_joint()).usable();
            let wrist = frame.joint(side.wrist_joint()).usable();
            if let (Some(center), Some(_)) = (center, wrist) {
                live.hand_centers[side.index()] = Some(center);
            }
        }
        live.frame = Some(frame);
    }

    /// The sensor lost the body; dispatching stops until it comes back.
    pub fn on_body_lost(&self) {
        lock(&self.shared.skeleton).frame = None;
    }

    /// Run one fusion cycle for a new video frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, cropper), fields(frame = self.frame + 1))
    )]
    pub fn on_video_frame<C: FrameCropper<I> + ?Sized>(&mut self, cropper: &C) -> FrameOutcome {
        self.frame += 1;
        for hand in &self.shared.hands {
            lock(hand).decay(self.score_decay);
        }

        let centers = {
            let live = lock(&self.shared.skeleton);
            if live.frame.is_none() {
                return FrameOutcome::NoBody;
            }
            live.hand_centers
        };

        if self.hands.iter().flatten().any(|p| !p.is_idle()) {
            log::debug!("frame {}: pipelines busy, not dispatching", self.frame);
            self.shared.counters.busy_frames.fetch_add(1, Ordering::Relaxed);
            return FrameOutcome::PipelinesBusy;
        }

        let mut requests = 0;
        for side in HandSide::BOTH {
            let Some(center) = centers[side.index()] else {
                continue;
            };
            for (pipeline, m) in self.hands[side.index()].iter().zip(&self.modalities) {
                let Some(crop_box) = m.optics.crop_box(center, m.crop_radius) else {
                    continue;
                };
                let request = CropRequest {
                    hand: side,
                    modality: m.modality,
                    center,
                    crop_box,
                };
                let Some(image) = cropper.crop(&request) else {
                    continue;
                };
                let shared = Arc::clone(&self.shared);
                if pipeline.submit(image, self.frame, move |c| shared.complete(side, c)) {
                    requests += 1;
                }
            }
        }
        self.shared
            .counters
            .requests
            .fetch_add(requests as u64, Ordering::Relaxed);
        FrameOutcome::Dispatched { requests }
    }

    /// Index of the last video frame seen.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn accepted_score(&self, side: HandSide) -> f32 {
        lock(&self.shared.hands[side.index()]).accepted_score()
    }

    /// Copy of the fusion state of one hand.
    pub fn hand_state(&self, side: HandSide) -> HandFusionState {
        lock(&self.shared.hands[side.index()]).clone()
    }

    pub fn last_accepted_pose(&self, side: HandSide) -> Option<Arc<HandPoseSample>> {
        lock(&self.shared.hands[side.index()]).last_accepted().cloned()
    }

    /// Accepted keypoints, translated to follow the live sensor wrist.
    ///
    /// The accepted sample is left untouched; when the wrist is not usable the
    /// keypoints are returned where they were accepted.
    pub fn fused_keypoints(&self, side: HandSide) -> Option<HandKeypoints> {
        let sample = self.last_accepted_pose(side)?;
        let offset = self
            .shared
            .live_wrist(side)
            .map_or_else(Vector3::zeros, |w| w - sample.wrist());
        Some(sample.translated(offset))
    }

    /// Sensor skeleton plus fused hands. Empty when no body is tracked.
    pub fn fused_body(&self) -> FusedBody {
        let Some(skeleton) = self.skeleton() else {
            return FusedBody::default();
        };
        FusedBody::new(skeleton, HandSide::BOTH.map(|side| self.fused_keypoints(side)))
    }

    pub fn pipeline_states(&self, side: HandSide) -> Vec<PipelineState> {
        self.hands[side.index()].iter().map(|p| p.state()).collect()
    }

    /// Latest skeleton, if a body is tracked.
    pub fn skeleton(&self) -> Option<SkeletonFrame> {
        lock(&self.shared.skeleton).frame.clone()
    }

    pub fn stats(&self) -> FusionStats {
        let c = &self.shared.counters;
        FusionStats {
            frames: self.frame,
            busy_frames: c.busy_frames.load(Ordering::Relaxed),
            requests: c.requests.load(Ordering::Relaxed),
            accepted: c.accepted.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
        }
    }
}
