//! ONNX Runtime plumbing shared by the model adapters.

use std::path::Path;

use crate::detection::domain::face_detector::DetectionError;

pub type Session = ort::session::Session;

/// Builds a session for the model at `model_path`.
pub fn load_session(model_path: &Path) -> Result<Session, DetectionError> {
    build(model_path)
        .map_err(|e| DetectionError::ModelLoad(format!("{}: {e}", model_path.display())))
}

fn build(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    Ok(ort::session::Session::builder()?.commit_from_file(model_path)?)
}

/// Shape of the first model input, if it is a tensor.
pub fn input_shape(session: &Session) -> Option<Vec<i64>> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            Some(shape.iter().copied().collect())
        } else {
            None
        }
    })
}

pub fn inference_err(e: impl std::fmt::Display) -> DetectionError {
    DetectionError::Inference(e.to_string())
}
