use handpoint_core::HandSide;
use serde::{Deserialize, Serialize};

use crate::sensor::{Modality, SensorOptics};

/// Open interval of handedness values accepted for one physical hand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandednessBand {
    pub min: f32,
    pub max: f32,
}

impl HandednessBand {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, handedness: f32) -> bool {
        handedness > self.min && handedness < self.max
    }

    fn overlaps(&self, other: &HandednessBand) -> bool {
        self.min < other.max && other.min < self.max
    }
}

/// Handedness acceptance band per hand. The two bands must be disjoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandednessBands {
    pub left: HandednessBand,
    pub right: HandednessBand,
}

impl Default for HandednessBands {
    fn default() -> Self {
        Self {
            left: HandednessBand::new(0.8, 1.2),
            right: HandednessBand::new(-0.2, 0.2),
        }
    }
}

impl HandednessBands {
    #[inline]
    pub fn band(&self, side: HandSide) -> HandednessBand {
        match side {
            HandSide::Left => self.left,
            HandSide::Right => self.right,
        }
    }
}

/// One input feed and how hands are cropped out of it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModalityParams {
    pub modality: Modality,
    #[serde(default)]
    pub optics: SensorOptics,
    /// Half-size of the square cropped around the hand centre, metres.
    #[serde(default = "default_crop_radius")]
    pub crop_radius: f32,
}

fn default_crop_radius() -> f32 {
    0.18
}

impl ModalityParams {
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            optics: SensorOptics::default(),
            crop_radius: default_crop_radius(),
        }
    }
}

/// Configuration of the fusion scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    /// Amount the accepted score loses every video frame.
    pub score_decay: f32,
    /// Lower bound of the decayed score; also the initial score.
    pub decay_floor: f32,
    pub handedness: HandednessBands,
    /// One pipeline per hand is created for every entry.
    pub modalities: Vec<ModalityParams>,
    /// Accepted range of the raw wrist-to-index-base distance (inclusive).
    pub min_hand_scale: f32,
    pub max_hand_scale: f32,
    /// Real-world wrist-to-index-base length raw keypoints are rescaled to, metres.
    pub reference_hand_length: f32,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            score_decay: 0.05,
            decay_floor: 0.7,
            handedness: HandednessBands::default(),
            modalities: vec![ModalityParams::new(Modality::Color)],
            min_hand_scale: 0.1,
            max_hand_scale: 4.0,
            reference_hand_length: 0.1,
        }
    }
}

/// Invalid scheduler configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FusionParamsError {
    #[error("at least one input modality is required")]
    NoModalities,
    #[error("modality {0:?} configured more than once")]
    DuplicateModality(Modality),
    #[error("score_decay must be finite and >= 0 (got {0})")]
    InvalidDecay(f32),
    #[error("decay_floor must be in [0, 1] (got {0})")]
    InvalidFloor(f32),
    #[error("handedness band [{min}, {max}] is empty")]
    EmptyBand { min: f32, max: f32 },
    #[error("left and right handedness bands overlap")]
    OverlappingBands,
    #[error("hand scale range [{min}, {max}] is invalid")]
    InvalidScaleRange { min: f32, max: f32 },
    #[error("reference_hand_length must be > 0 (got {0})")]
    InvalidReferenceLength(f32),
    #[error("crop_radius must be > 0 (got {0})")]
    InvalidCropRadius(f32),
}

impl FusionParams {
    /// Default configuration with the given feeds.
    pub fn with_modalities(modalities: &[Modality]) -> Self {
        Self {
            modalities: modalities.iter().copied().map(ModalityParams::new).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), FusionParamsError> {
        if self.modalities.is_empty() {
            return Err(FusionParamsError::NoModalities);
        }
        for (i, m) in self.modalities.iter().enumerate() {
            if self.modalities[..i].iter().any(|o| o.modality == m.modality) {
                return Err(FusionParamsError::DuplicateModality(m.modality));
            }
            if !m.crop_radius.is_finite() || m.crop_radius <= 0.0 {
                return Err(FusionParamsError::InvalidCropRadius(m.crop_radius));
            }
        }
        if !self.score_decay.is_finite() || self.score_decay < 0.0 {
            return Err(FusionParamsError::InvalidDecay(self.score_decay));
        }
        if !(0.0..=1.0).contains(&self.decay_floor) {
            return Err(FusionParamsError::InvalidFloor(self.decay_floor));
        }
        for band in [self.handedness.left, self.handedness.right] {
            if !(band.min < band.max) {
                return Err(FusionParamsError::EmptyBand {
                    min: band.min,
                    max: band.max,
                });
            }
        }
        if self.handedness.left.overlaps(&self.handedness.right) {
            return Err(FusionParamsError::OverlappingBands);
        }
        if !(self.min_hand_scale > 0.0 && self.min_hand_scale < self.max_hand_scale)
            || !self.max_hand_scale.is_finite()
        {
            return Err(FusionParamsError::InvalidScaleRange {
                min: self.min_hand_scale,
                max: self.max_hand_scale,
            });
        }
        if !(self.reference_hand_length > 0.0) || !self.reference_hand_length.is_finite() {
            return Err(FusionParamsError::InvalidReferenceLength(
                self.reference_hand_length,
            ));
        }
        Ok(())
    }
}
