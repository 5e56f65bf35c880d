//! JSON shapes returned to webcam clients.

use serde::Serialize;

use super::region_encoder::FaceThumbnail;
use crate::detection::domain::head_pose::PoseLabel;
use crate::shared::bounding_box::{BoundingBox, BoxJson};

/// `{detected, box?, confidence?}`. Absent fields are omitted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionReport {
    pub detected: bool,
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoxJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl DetectionReport {
    pub fn not_detected() -> Self {
        Self {
            detected: false,
            bbox: None,
            confidence: None,
        }
    }

    pub fn from_box(bbox: Option<&BoundingBox>) -> Self {
        match bbox {
            Some(b) => Self {
                detected: true,
                bbox: Some(b.to_json()),
                confidence: b.confidence,
            },
            None => Self::not_detected(),
        }
    }
}

/// `{gesture, detected}` where `detected` means the head is turned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GestureReport {
    pub gesture: PoseLabel,
    pub detected: bool,
}

impl From<PoseLabel> for GestureReport {
    fn from(gesture: PoseLabel) -> Self {
        Self {
            gesture,
            detected: gesture.is_turned(),
        }
    }
}

/// A captured face: data URI for preview plus the encoded size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureReport {
    pub face_image: String,
    pub face_size: usize,
    #[serde(rename = "box")]
    pub bbox: BoxJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl CaptureReport {
    pub fn new(thumbnail: &FaceThumbnail, bbox: &BoundingBox) -> Self {
        Self {
            face_image: thumbnail.to_data_uri(),
            face_size: thumbnail.len(),
            bbox: bbox.to_json(),
            confidence: bbox.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_not_detected_omits_fields() {
        let value = serde_json::to_value(DetectionReport::not_detected()).unwrap();
        assert_eq!(value, json!({"detected": false}));
    }

    #[test]
    fn test_detected_with_confidence() {
        let b = BoundingBox::new(10, 20, 30, 40).with_confidence(0.75);
        let value = serde_json::to_value(DetectionReport::from_box(Some(&b))).unwrap();
        assert_eq!(
            value,
            json!({"detected": true, "box": {"x": 10, "y": 20, "w": 30, "h": 40}, "confidence": 0.75})
        );
    }

    #[test]
    fn test_detected_without_confidence() {
        let b = BoundingBox::new(1, 2, 3, 4);
        let value = serde_json::to_value(DetectionReport::from_box(Some(&b))).unwrap();
        assert!(value.get("confidence").is_none());
        assert_eq!(value["box"]["w"], 3);
    }

    #[rstest]
    #[case::left(PoseLabel::Left, json!({"gesture": "left", "detected": true}))]
    #[case::right(PoseLabel::Right, json!({"gesture": "right", "detected": true}))]
    #[case::center(PoseLabel::Center, json!({"gesture": "center", "detected": false}))]
    fn test_gesture_report(#[case] pose: PoseLabel, #[case] expected: serde_json::Value) {
        let value = serde_json::to_value(GestureReport::from(pose)).unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_capture_report() {
        let thumb = FaceThumbnail {
            data: vec![1, 2, 3, 4],
            width: 200,
            height: 200,
        };
        let b = BoundingBox::new(5, 6, 7, 8);
        let value = serde_json::to_value(CaptureReport::new(&thumb, &b)).unwrap();
        assert_eq!(value["face_size"], 4);
        assert_eq!(value["face_image"], "data:image/jpeg;base64,AQIDBA==");
        assert_eq!(value["box"]["x"], 5);
        assert!(value.get("confidence").is_none());
    }
}
