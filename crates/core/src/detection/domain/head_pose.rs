//! Coarse horizontal head pose from a landmark offset.
//!
//! Thresholds are absolute offsets in normalized frame units, not scaled by
//! face size: a small or distant face crosses them with less rotation than
//! a large, close one.

use serde::Serialize;

/// Direction the head is turned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseLabel {
    Left,
    Right,
    Center,
}

impl PoseLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoseLabel::Left => "left",
            PoseLabel::Right => "right",
            PoseLabel::Center => "center",
        }
    }

    /// True for a deliberate turn, which the client treats as a gesture.
    pub fn is_turned(&self) -> bool {
        !matches!(self, PoseLabel::Center)
    }
}

impl std::fmt::Display for PoseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Magnitudes of the left and right offset thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseThresholds {
    pub left: f64,
    pub right: f64,
}

pub const DEFAULT_POSE_THRESHOLD: f64 = 0.05;

impl PoseThresholds {
    pub fn symmetric(threshold: f64) -> Self {
        Self {
            left: threshold,
            right: threshold,
        }
    }
}

impl Default for PoseThresholds {
    fn default() -> Self {
        Self::symmetric(DEFAULT_POSE_THRESHOLD)
    }
}

/// `offset < -left` → left, `offset > right` → right, otherwise center.
pub fn classify(offset: f64, thresholds: &PoseThresholds) -> PoseLabel {
    if offset < -thresholds.left {
        PoseLabel::Left
    } else if offset > thresholds.right {
        PoseLabel::Right
    } else {
        PoseLabel::Center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0.0, PoseLabel::Center)]
    #[case::right(0.10, PoseLabel::Right)]
    #[case::left(-0.10, PoseLabel::Left)]
    #[case::just_inside_right(0.049, PoseLabel::Center)]
    #[case::just_inside_left(-0.049, PoseLabel::Center)]
    #[case::on_right_threshold(0.05, PoseLabel::Center)]
    #[case::on_left_threshold(-0.05, PoseLabel::Center)]
    fn test_classify_default_thresholds(#[case] offset: f64, #[case] expected: PoseLabel) {
        assert_eq!(classify(offset, &PoseThresholds::default()), expected);
    }

    #[test]
    fn test_classify_asymmetric_thresholds() {
        let t = PoseThresholds {
            left: 0.02,
            right: 0.08,
        };
        assert_eq!(classify(-0.03, &t), PoseLabel::Left);
        assert_eq!(classify(0.03, &t), PoseLabel::Center);
        assert_eq!(classify(0.09, &t), PoseLabel::Right);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PoseLabel::Left).unwrap(), "\"left\"");
        assert_eq!(PoseLabel::Center.to_string(), "center");
    }

    #[test]
    fn test_is_turned() {
        assert!(PoseLabel::Left.is_turned());
        assert!(PoseLabel::Right.is_turned());
        assert!(!PoseLabel::Center.is_turned());
    }
}
