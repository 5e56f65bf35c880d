use std::sync::Arc;

use crate::decoding::payload_decoder::{decode_payload, DecodeError};
use crate::extraction::detection_report::GestureReport;
use crate::extraction::face_extractor::FaceExtractor;

/// Head-turn gesture on an uploaded frame: decode → pose → report.
///
/// Only a malformed payload fails; pose estimation itself falls back to
/// `center`.
pub struct DetectGestureUseCase {
    extractor: Arc<FaceExtractor>,
}

impl DetectGestureUseCase {
    pub fn new(extractor: Arc<FaceExtractor>) -> Self {
        Self { extractor }
    }

    pub fn execute(&self, payload: &str) -> Result<GestureReport, DecodeError> {
        let frame = decode_payload(payload)?;
        let pose = self.extractor.head_pose(&frame);
        Ok(GestureReport::from(pose))
    }
}
