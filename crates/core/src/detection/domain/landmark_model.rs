use super::face_detector::DetectionError;
use super::landmark_set::LandmarkSet;
use crate::shared::frame::Frame;

/// Domain interface for an external facial landmark model.
///
/// `Ok(None)` means the model saw no face.
pub trait LandmarkModel: Send + Sync {
    fn landmarks(&self, frame: &Frame) -> Result<Option<LandmarkSet>, DetectionError>;
}
