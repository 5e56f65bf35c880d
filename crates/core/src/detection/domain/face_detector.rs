use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Failure inside an external vision model.
///
/// Distinct from "no face": a detector that ran fine and found nothing
/// returns an empty candidate list instead.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("model session poisoned by an earlier panic")]
    Poisoned,
}

/// Domain interface for an external face detector.
///
/// Returns raw candidates in pixel coordinates. Boxes may extend past the
/// frame; selection and clamping belong to the extractor. Implementations
/// are shared between request threads, hence `&self` and `Sync`.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError>;
}
