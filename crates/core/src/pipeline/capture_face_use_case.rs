use std::sync::Arc;

use crate::decoding::payload_decoder::{decode_payload, DecodeError};
use crate::detection::domain::face_detector::DetectionError;
use crate::extraction::detection_report::CaptureReport;
use crate::extraction::face_extractor::FaceExtractor;
use crate::extraction::region_encoder::{FaceThumbnail, RegionError};
use crate::shared::bounding_box::BoundingBox;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Result of a capture attempt. Finding no face is an ordinary outcome.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome {
    NoFace,
    Captured {
        thumbnail: FaceThumbnail,
        bbox: BoundingBox,
    },
}

impl CaptureOutcome {
    /// JSON-ready summary, `None` when no face was found.
    pub fn report(&self) -> Option<CaptureReport> {
        match self {
            CaptureOutcome::NoFace => None,
            CaptureOutcome::Captured { thumbnail, bbox } => {
                Some(CaptureReport::new(thumbnail, bbox))
            }
        }
    }
}

/// Face capture for registration: decode → detect → crop → resize → encode.
pub struct CaptureFaceUseCase {
    extractor: Arc<FaceExtractor>,
}

impl CaptureFaceUseCase {
    pub fn new(extractor: Arc<FaceExtractor>) -> Self {
        Self { extractor }
    }

    pub fn execute(&self, payload: &str) -> Result<CaptureOutcome, CaptureError> {
        let frame = decode_payload(payload)?;

        let Some(bbox) = self.extractor.detect(&frame)? else {
            log::info!("No face found in {}x{} frame", frame.width(), frame.height());
            return Ok(CaptureOutcome::NoFace);
        };

        let thumbnail = self.extractor.extract_region(&frame, &bbox)?;
        log::info!(
            "Captured face at ({}, {}) {}x{}, {} bytes",
            bbox.x,
            bbox.y,
            bbox.width,
            bbox.height,
            thumbnail.len()
        );
        Ok(CaptureOutcome::Captured { thumbnail, bbox })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::face_extractor::tests::{FailingDetector, StubDetector, StubLandmarks};
    use crate::pipeline::detect_face_use_case::tests::png_payload;

    fn use_case(boxes: Vec<BoundingBox>) -> CaptureFaceUseCase {
        CaptureFaceUseCase::new(Arc::new(FaceExtractor::standard(
            Arc::new(StubDetector::new(boxes)),
            Arc::new(StubLandmarks::NoFace),
        )))
    }

    #[test]
    fn test_captures_canonical_thumbnail() {
        let uc = use_case(vec![BoundingBox::new(20, 10, 60, 90).with_confidence(0.9)]);
        let outcome = uc.execute(&png_payload(160, 120)).unwrap();

        let CaptureOutcome::Captured { thumbnail, bbox } = &outcome else {
            panic!("expected a captured face, got {outcome:?}");
        };
        assert_eq!((thumbnail.width, thumbnail.height), (200, 200));
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (20, 10, 60, 90));

        let report = outcome.report().unwrap();
        assert!(report.face_image.starts_with("data:image/jpeg;base64,"));
        assert_eq!(report.face_size, thumbnail.len());
    }

    #[test]
    fn test_partly_outside_face_is_clamped() {
        let uc = use_case(vec![BoundingBox::new(-50, -50, 100, 100).with_confidence(0.9)]);
        let outcome = uc.execute(&png_payload(80, 80)).unwrap();
        let CaptureOutcome::Captured { bbox, .. } = outcome else {
            panic!("expected a captured face");
        };
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (0, 0, 50, 50));
    }

    #[test]
    fn test_no_face() {
        let outcome = use_case(Vec::new()).execute(&png_payload(40, 40)).unwrap();
        assert_eq!(outcome, CaptureOutcome::NoFace);
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            use_case(Vec::new()).execute("data:image/png;base64,"),
            Err(CaptureError::Decode(DecodeError::EmptyPayload))
        ));
    }

    #[test]
    fn test_detector_failure() {
        let uc = CaptureFaceUseCase::new(Arc::new(FaceExtractor::standard(
            Arc::new(FailingDetector),
            Arc::new(StubLandmarks::NoFace),
        )));
        assert!(matches!(
            uc.execute(&png_payload(40, 40)),
            Err(CaptureError::Detection(_))
        ));
    }
}
