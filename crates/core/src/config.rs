use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detection_strategy::{
    DetectionStrategy, EnhancedStrategy, Sensitivity, StandardStrategy, DEFAULT_MIN_CONFIDENCE,
    DEFAULT_SENSITIVITY,
};
use crate::detection::domain::head_pose::{PoseThresholds, DEFAULT_POSE_THRESHOLD};
use crate::shared::constants::{APP_DIR_NAME, CANONICAL_FACE_SIZE, THUMBNAIL_JPEG_QUALITY};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Standard,
    Enhanced,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Standard => write!(f, "standard"),
            StrategyKind::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// Extractor settings, read from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub strategy: StrategyKind,
    /// Enhanced strategy only.
    pub sensitivity: f64,
    /// Standard strategy only.
    pub min_confidence: f64,
    /// Standard strategy only.
    pub left_threshold: f64,
    /// Standard strategy only.
    pub right_threshold: f64,
    pub canonical_size: u32,
    pub jpeg_quality: u8,
    pub detector_path: Option<PathBuf>,
    pub detector_url: Option<String>,
    pub landmark_path: Option<PathBuf>,
    pub landmark_url: Option<String>,
    /// Directory shipped alongside the binary with pre-fetched models.
    pub bundled_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Standard,
            sensitivity: DEFAULT_SENSITIVITY,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            left_threshold: DEFAULT_POSE_THRESHOLD,
            right_threshold: DEFAULT_POSE_THRESHOLD,
            canonical_size: CANONICAL_FACE_SIZE,
            jpeg_quality: THUMBNAIL_JPEG_QUALITY,
            detector_path: None,
            detector_url: None,
            landmark_path: None,
            landmark_url: None,
            bundled_dir: None,
        }
    }
}

impl ExtractorConfig {
    /// `<config dir>/facegate/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    /// Reads an explicitly requested config file. Any failure is reported.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reads the per-user config file, falling back to defaults when it is
    /// absent or unusable.
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config: {e}");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("sensitivity", self.sensitivity)?;
        check_unit("min_confidence", self.min_confidence)?;
        check_unit("left_threshold", self.left_threshold)?;
        check_unit("right_threshold", self.right_threshold)?;
        if self.canonical_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "canonical_size",
                expected: "positive",
                value: self.canonical_size.to_string(),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::OutOfRange {
                field: "jpeg_quality",
                expected: "between 1 and 100",
                value: self.jpeg_quality.to_string(),
            });
        }
        Ok(())
    }

    pub fn build_strategy(&self) -> Box<dyn DetectionStrategy> {
        match self.strategy {
            StrategyKind::Standard => Box::new(StandardStrategy::new(
                self.min_confidence,
                PoseThresholds {
                    left: self.left_threshold,
                    right: self.right_threshold,
                },
            )),
            StrategyKind::Enhanced => {
                Box::new(EnhancedStrategy::new(Sensitivity::new(self.sensitivity)))
            }
        }
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "between 0 and 1",
            value: value.to_string(),
        })
    }
}
