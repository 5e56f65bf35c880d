//! How the extractor tunes detection and pose classification.
//!
//! A strategy is picked once when the extractor is built and never changes
//! afterwards. The standard strategy uses fixed thresholds; the enhanced
//! strategy derives every knob from a single [`Sensitivity`].

use std::borrow::Cow;

use super::frame_enhancer;
use super::head_pose::{PoseThresholds, DEFAULT_POSE_THRESHOLD};
use super::landmark_set::LandmarkScheme;
use crate::shared::frame::Frame;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_SENSITIVITY: f64 = 0.5;

/// Sensitivity above which frames are contrast-boosted and sharpened.
const ENHANCE_ABOVE: f64 = 0.7;

pub trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Frame handed to the external models. Must keep the input dimensions.
    fn prepare<'a>(&self, frame: &'a Frame) -> Cow<'a, Frame>;

    /// Candidates scoring below this are ignored.
    fn min_confidence(&self) -> f64;

    /// Fraction of box width/height added on every side before clamping.
    fn margin(&self) -> f64;

    fn pose_thresholds(&self) -> PoseThresholds;

    fn landmark_scheme(&self) -> LandmarkScheme;
}

/// Plain detection: no preprocessing, no margin, eye-only pose.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardStrategy {
    min_confidence: f64,
    thresholds: PoseThresholds,
}

impl StandardStrategy {
    pub fn new(min_confidence: f64, thresholds: PoseThresholds) -> Self {
        Self {
            min_confidence,
            thresholds,
        }
    }
}

impl Default for StandardStrategy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_CONFIDENCE,
            PoseThresholds::symmetric(DEFAULT_POSE_THRESHOLD),
        )
    }
}

impl DetectionStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn prepare<'a>(&self, frame: &'a Frame) -> Cow<'a, Frame> {
        Cow::Borrowed(frame)
    }

    fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    fn margin(&self) -> f64 {
        0.0
    }

    fn pose_thresholds(&self) -> PoseThresholds {
        self.thresholds
    }

    fn landmark_scheme(&self) -> LandmarkScheme {
        LandmarkScheme::EyeInner
    }
}

/// Detection sensitivity in `[0, 1]`; higher trades precision for recall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sensitivity(f64);

impl Sensitivity {
    /// Clamps into `[0, 1]`. NaN falls back to the default.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// 0.7 at zero sensitivity down to 0.3 at full sensitivity.
    pub fn min_confidence(&self) -> f64 {
        0.7 - self.0 * 0.4
    }

    /// 10% to 20% of the box on each side.
    pub fn margin(&self) -> f64 {
        0.1 + self.0 * 0.1
    }

    /// 0.03 to 0.07 on each side.
    pub fn pose_threshold(&self) -> f64 {
        0.03 + self.0 * 0.04
    }

    pub fn enhances_frames(&self) -> bool {
        self.0 > ENHANCE_ABOVE
    }

    /// `(alpha, beta)` for the contrast boost.
    pub fn contrast(&self) -> (f64, f64) {
        (1.0 + self.0 * 0.5, 30.0 * self.0)
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(DEFAULT_SENSITIVITY)
    }
}

/// Sensitivity-driven detection with margin expansion and a wider
/// landmark set (eyes and mouth) for pose.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EnhancedStrategy {
    sensitivity: Sensitivity,
}

impl EnhancedStrategy {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self { sensitivity }
    }
}

impl DetectionStrategy for EnhancedStrategy {
    fn name(&self) -> &'static str {
        "enhanced"
    }

    fn prepare<'a>(&self, frame: &'a Frame) -> Cow<'a, Frame> {
        if !self.sensitivity.enhances_frames() {
            return Cow::Borrowed(frame);
        }
        let (alpha, beta) = self.sensitivity.contrast();
        Cow::Owned(frame_enhancer::enhance(frame, alpha, beta))
    }

    fn min_confidence(&self) -> f64 {
        self.sensitivity.min_confidence()
    }

    fn margin(&self) -> f64 {
        self.sensitivity.margin()
    }

    fn pose_thresholds(&self) -> PoseThresholds {
        PoseThresholds::symmetric(self.sensitivity.pose_threshold())
    }

    fn landmark_scheme(&self) -> LandmarkScheme {
        LandmarkScheme::EyeInnerAndMouth
    }
}
