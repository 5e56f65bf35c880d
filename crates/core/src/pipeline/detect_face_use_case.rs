use std::sync::Arc;

use crate::decoding::payload_decoder::{decode_payload, DecodeError};
use crate::detection::domain::face_detector::DetectionError;
use crate::extraction::detection_report::DetectionReport;
use crate::extraction::face_extractor::FaceExtractor;

#[derive(thiserror::Error, Debug)]
pub enum DetectFaceError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Face detection on an uploaded frame: decode → detect → report.
pub struct DetectFaceUseCase {
    extractor: Arc<FaceExtractor>,
}

impl DetectFaceUseCase {
    pub fn new(extractor: Arc<FaceExtractor>) -> Self {
        Self { extractor }
    }

    pub fn execute(&self, payload: &str) -> Result<DetectionReport, DetectFaceError> {
        let frame = decode_payload(payload)?;
        Ok(self.extractor.report(&frame)?)
    }
}
