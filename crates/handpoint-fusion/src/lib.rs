//! Hand-pose fusion for marker-less pointing.
//!
//! A [`FusionScheduler`] owns one [`PosePipeline`] per (hand, modality). Each
//! pipeline wraps a single asynchronous [`HandPoseEstimator`] behind a
//! busy/idle gate. On every video frame the scheduler decays the accepted
//! score of both hands, then dispatches a crop to every pipeline unless any
//! of them is still in flight. Completions are scored against the decayed
//! score and accepted only if they strictly improve it and look like the
//! right hand at a plausible scale.
//!
//! ```no_run
//! use std::sync::Arc;
//! use handpoint_fusion::{
//!     EstimateCallback, FusionParams, FusionScheduler, HandPoseEstimator, Modality, RawHandPose,
//! };
//!
//! let params = FusionParams::with_modalities(&[Modality::Color, Modality::Infrared]);
//! let (mut scheduler, updates) = FusionScheduler::<Vec<u8>>::new(params, |_, _| {
//!     let est: Arc<dyn HandPoseEstimator<Vec<u8>>> =
//!         Arc::new(|_img: Vec<u8>, done: EstimateCallback| done(Ok(RawHandPose::empty())));
//!     est
//! })
//! .expect("valid params");
//!
//! let outcome = scheduler.on_video_frame(&|_req: &handpoint_fusion::CropRequest| Some(Vec::new()));
//! println!("{outcome:?}, {} updates", updates.try_iter().count());
//! ```

mod body;
mod estimator;
mod params;
mod pipeline;
mod scheduler;
mod sensor;

pub use body::{BodyPoint, BodyPointsProvider, FusedBody, PointSource};
pub use estimator::{EstimateCallback, EstimatorError, HandPoseEstimator, RawHandPose};
pub use params::{FusionParams, FusionParamsError, HandednessBand, HandednessBands, ModalityParams};
pub use pipeline::{PipelineCompletion, PipelineState, PosePipeline};
pub use scheduler::{
    FrameOutcome, FusionScheduler, FusionStats, HandFusionState, PoseUpdate, Rejection,
};
pub use sensor::{
    CropBox, CropRequest, FrameCropper, Modality, SensorOptics, SkeletonFrame, SkeletonSource,
};
