use std::sync::Arc;

use super::detection_report::DetectionReport;
use super::region_encoder::{FaceThumbnail, RegionEncoder, RegionError};
use crate::detection::domain::detection_strategy::{DetectionStrategy, StandardStrategy};
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::head_pose::{classify, PoseLabel};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::shared::bounding_box::{select_best, BoundingBox};
use crate::shared::frame::Frame;

/// Finds the single best face in a frame, classifies head pose and cuts
/// face thumbnails.
///
/// Built once with its models and strategy, then shared read-only between
/// request threads.
pub struct FaceExtractor {
    detector: Arc<dyn FaceDetector>,
    landmarks: Arc<dyn LandmarkModel>,
    strategy: Box<dyn DetectionStrategy>,
    encoder: RegionEncoder,
}

impl FaceExtractor {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        landmarks: Arc<dyn LandmarkModel>,
        strategy: Box<dyn DetectionStrategy>,
        encoder: RegionEncoder,
    ) -> Self {
        log::debug!("Face extractor using {} strategy", strategy.name());
        Self {
            detector,
            landmarks,
            strategy,
            encoder,
        }
    }

    /// Standard strategy with the default thumbnail encoder.
    pub fn standard(detector: Arc<dyn FaceDetector>, landmarks: Arc<dyn LandmarkModel>) -> Self {
        Self::new(
            detector,
            landmarks,
            Box::new(StandardStrategy::default()),
            RegionEncoder::default(),
        )
    }

    /// A new extractor sharing this one's models but tuned differently.
    pub fn with_strategy(&self, strategy: Box<dyn DetectionStrategy>) -> Self {
        Self::new(
            Arc::clone(&self.detector),
            Arc::clone(&self.landmarks),
            strategy,
            self.encoder,
        )
    }

    pub fn strategy(&self) -> &dyn DetectionStrategy {
        self.strategy.as_ref()
    }

    /// Best face in the frame, expanded by the strategy's margin and clamped
    /// to the frame.
    ///
    /// `Ok(None)` when there is no candidate, the best one scores below the
    /// strategy's threshold, or nothing of it lies inside the frame.
    pub fn detect(&self, frame: &Frame) -> Result<Option<BoundingBox>, DetectionError> {
        if frame.is_empty() {
            return Ok(None);
        }

        let prepared = self.strategy.prepare(frame);
        let candidates = self.detector.detect(&prepared)?;
        let Some(best) = select_best(&candidates) else {
            log::debug!("No face candidates");
            return Ok(None);
        };

        let threshold = self.strategy.min_confidence();
        if best.score() < threshold {
            log::debug!(
                "Best candidate scored {:.3}, below {:.3}",
                best.score(),
                threshold
            );
            return Ok(None);
        }

        let clamped = best
            .expand(self.strategy.margin())
            .clamp_to(frame.width(), frame.height());
        if clamped.is_none() {
            log::debug!("Best candidate has no area inside the frame");
        }
        Ok(clamped)
    }

    /// Coarse left/right/center pose. Never fails: anything that prevents a
    /// measurement yields `Center`.
    pub fn head_pose(&self, frame: &Frame) -> PoseLabel {
        if frame.is_empty() {
            return PoseLabel::Center;
        }

        let prepared = self.strategy.prepare(frame);
        let set = match self.landmarks.landmarks(&prepared) {
            Ok(Some(set)) => set,
            Ok(None) => return PoseLabel::Center,
            Err(e) => {
                log::warn!("Landmark model failed, reporting center pose: {e}");
                return PoseLabel::Center;
            }
        };

        let Some(offset) = set.horizontal_offset(self.strategy.landmark_scheme()) else {
            log::warn!(
                "Landmark set has {} points, too few for pose; reporting center",
                set.len()
            );
            return PoseLabel::Center;
        };

        let pose = classify(offset, &self.strategy.pose_thresholds());
        log::debug!("Pose offset {offset:.4} → {pose}");
        pose
    }

    /// Canonical thumbnail of `bbox`. See [`RegionEncoder::encode`].
    pub fn extract_region(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<FaceThumbnail, RegionError> {
        self.encoder.encode(frame, bbox)
    }

    pub fn report(&self, frame: &Frame) -> Result<DetectionReport, DetectionError> {
        let bbox = self.detect(frame)?;
        Ok(DetectionReport::from_box(bbox.as_ref()))
    }
}
