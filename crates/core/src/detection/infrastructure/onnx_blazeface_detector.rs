/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// A lightweight short-range detector suited to webcam selfies. Produces
/// scored candidate boxes; the extractor picks one and clamps it.
use std::path::Path;
use std::sync::Mutex;

use super::math::{nms, sigmoid, ScoredBox};
use super::onnx_session::{inference_err, load_session, Session};
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Default score below which candidates never leave the adapter.
/// Lowered to the caller's threshold when that is more permissive.
pub const CANDIDATE_FLOOR: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output (box + 6 keypoints).
const REGRESSOR_STRIDE: usize = 16;

/// BlazeFace face detector backed by an ONNX Runtime session.
///
/// The session is locked per call, so one instance can be shared by
/// every request thread.
pub struct OnnxBlazefaceDetector {
    session: Mutex<Session>,
    floor: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    ///
    /// `min_confidence` is the lowest score the caller will accept; any
    /// candidate at or above it reaches the caller.
    pub fn new(model_path: &Path, min_confidence: f64) -> Result<Self, DetectionError> {
        let session = load_session(model_path)?;
        log::info!("Loaded BlazeFace model from {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
            floor: candidate_floor(min_confidence),
            anchors: generate_anchors(),
        })
    }

    fn infer(&self, frame: &Frame) -> Result<(Vec<f32>, Vec<f32>), DetectionError> {
        let input_tensor = preprocess(frame, INPUT_SIZE);
        let input_value =
            ort::value::Tensor::from_array(input_tensor).map_err(inference_err)?;

        let mut session = self.session.lock().map_err(|_| DetectionError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(inference_err)?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, 896, 16] (box deltas + keypoints)
        // - classificators: [1, 896, 1] (confidence logits)
        if outputs.len() < 2 {
            return Err(DetectionError::UnexpectedOutput(format!(
                "BlazeFace model expected 2 outputs, got {}",
                outputs.len()
            )));
        }

        let regressors = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;
        let scores = outputs[1]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;
        let reg_data = regressors
            .as_slice()
            .ok_or_else(|| DetectionError::UnexpectedOutput("regressors not contiguous".into()))?
            .to_vec();
        let score_data = scores
            .as_slice()
            .ok_or_else(|| DetectionError::UnexpectedOutput("scores not contiguous".into()))?
            .to_vec();
        Ok((reg_data, score_data))
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let (reg_data, score_data) = self.infer(frame)?;
        let mut raw = decode(
            &reg_data,
            &score_data,
            &self.anchors,
            self.floor,
            frame.width(),
            frame.height(),
        );
        let kept = nms(&mut raw, NMS_IOU_THRESH);
        log::debug!("BlazeFace: {} candidates after NMS", kept.len());

        Ok(kept
            .iter()
            .map(|d| {
                let [x1, y1, x2, y2] = d.corners;
                BoundingBox::from_corners(x1, y1, x2, y2).with_confidence(d.score)
            })
            .collect())
    }
}

/// Adapter-side score gate: never stricter than the caller's threshold.
fn candidate_floor(min_confidence: f64) -> f64 {
    if min_confidence.is_finite() {
        CANDIDATE_FLOOR.min(min_confidence.max(0.0))
    } else {
        CANDIDATE_FLOOR
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Turns raw model output into scored boxes in frame pixels.
///
/// Boxes are left unclamped; a face partly outside the frame keeps its
/// full extent.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    floor: f64,
    fw: u32,
    fh: u32,
) -> Vec<ScoredBox> {
    let mut dets = Vec::new();
    let num_anchors = anchors.len().min(NUM_ANCHORS);

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if !score.is_finite() || (score as f64) < floor {
            continue;
        }

        let anchor = &anchors[i];
        let reg_offset = i * REGRESSOR_STRIDE;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

        dets.push(ScoredBox {
            corners: [
                ((cx - w / 2.0) * fw as f32) as f64,
                ((cy - h / 2.0) * fh as f32) as f64,
                ((cx + w / 2.0) * fw as f32) as f64,
                ((cy + h / 2.0) * fh as f32) as f64,
            ],
            score: score as f64,
        });
    }

    dets
}

// ---------------------------------------------------------------------------
// Anchor generation (BlazeFace short-range)
// ---------------------------------------------------------------------------

/// Generate BlazeFace anchors for the short-range model.
///
/// The short-range model uses two feature map sizes: 16×16 and 8×8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}
