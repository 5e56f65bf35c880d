use std::sync::Arc;

use thiserror::Error;

use super::onnx_blazeface_detector::OnnxBlazefaceDetector;
use super::onnx_face_mesh_landmarker::OnnxFaceMeshLandmarker;
use crate::config::ExtractorConfig;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::extraction::face_extractor::FaceExtractor;
use crate::extraction::region_encoder::RegionEncoder;
use crate::shared::constants::{DETECTOR_MODEL_NAME, FACE_MESH_MODEL_NAME};
use crate::shared::model_resolver::{self, ModelResolveError, ModelSource, ProgressFn};

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error(transparent)]
    Resolve(#[from] ModelResolveError),
    #[error(transparent)]
    Model(#[from] DetectionError),
}

/// Where the detector model comes from, per the config.
pub fn detector_source(config: &ExtractorConfig) -> ModelSource<'_> {
    ModelSource {
        name: DETECTOR_MODEL_NAME,
        explicit_path: config.detector_path.as_deref(),
        url: config.detector_url.as_deref(),
        bundled_dir: config.bundled_dir.as_deref(),
    }
}

/// Where the face-mesh model comes from, per the config.
pub fn landmark_source(config: &ExtractorConfig) -> ModelSource<'_> {
    ModelSource {
        name: FACE_MESH_MODEL_NAME,
        explicit_path: config.landmark_path.as_deref(),
        url: config.landmark_url.as_deref(),
        bundled_dir: config.bundled_dir.as_deref(),
    }
}

/// Resolves and loads the BlazeFace detector, letting through every
/// candidate the configured strategy could accept.
pub fn create_detector(
    config: &ExtractorConfig,
    progress: Option<ProgressFn>,
) -> Result<Arc<dyn FaceDetector>, FactoryError> {
    let path = model_resolver::resolve(&detector_source(config), progress)?;
    let min_confidence = config.build_strategy().min_confidence();
    Ok(Arc::new(OnnxBlazefaceDetector::new(&path, min_confidence)?))
}

/// Resolves and loads the face-mesh model, locating faces with `locator`.
pub fn create_landmarker(
    config: &ExtractorConfig,
    locator: Arc<dyn FaceDetector>,
    progress: Option<ProgressFn>,
) -> Result<Arc<dyn LandmarkModel>, FactoryError> {
    let path = model_resolver::resolve(&landmark_source(config), progress)?;
    Ok(Arc::new(OnnxFaceMeshLandmarker::new(&path, locator)?))
}

/// Makes a download progress callback for the named model file.
pub type ProgressFactory<'a> = &'a dyn Fn(&str) -> ProgressFn;

/// Builds an extractor with both models loaded and the configured strategy.
///
/// The detector instance is shared with the landmarker, so each model file
/// is loaded once.
pub fn create_extractor(
    config: &ExtractorConfig,
    progress: Option<ProgressFactory<'_>>,
) -> Result<FaceExtractor, FactoryError> {
    let detector = create_detector(config, progress.map(|p| p(DETECTOR_MODEL_NAME)))?;
    let landmarks = create_landmarker(
        config,
        Arc::clone(&detector),
        progress.map(|p| p(FACE_MESH_MODEL_NAME)),
    )?;
    let strategy = config.build_strategy();
    log::info!("Using {} detection strategy", strategy.name());

    Ok(FaceExtractor::new(
        detector,
        landmarks,
        strategy,
        RegionEncoder::new(config.canonical_size, config.jpeg_quality),
    ))
}
