//! Face-mesh landmarks in normalized frame coordinates.
//!
//! Indices follow the 468-point MediaPipe face mesh. Only a handful of
//! points are ever read: the nose tip, the inner eye corners and the outer
//! mouth corners.

/// Number of points in a full face mesh.
pub const MESH_POINTS: usize = 468;

pub const NOSE_TIP: usize = 1;
pub const LEFT_EYE_INNER: usize = 133;
pub const RIGHT_EYE_INNER: usize = 362;
pub const LEFT_MOUTH_CORNER: usize = 61;
pub const RIGHT_MOUTH_CORNER: usize = 291;

/// Which landmarks define the face's horizontal center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandmarkScheme {
    /// Inner eye corners only.
    EyeInner,
    /// Inner eye corners and outer mouth corners.
    EyeInnerAndMouth,
}

impl LandmarkScheme {
    pub fn indices(&self) -> &'static [usize] {
        match self {
            LandmarkScheme::EyeInner => &[LEFT_EYE_INNER, RIGHT_EYE_INNER],
            LandmarkScheme::EyeInnerAndMouth => &[
                LEFT_EYE_INNER,
                RIGHT_EYE_INNER,
                LEFT_MOUTH_CORNER,
                RIGHT_MOUTH_CORNER,
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    /// `(x, y)` in `[0, 1]`, relative to frame width/height.
    points: Vec<(f64, f64)>,
}

impl LandmarkSet {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        self.points.get(index).copied()
    }

    /// Mean x of the scheme's landmarks, or `None` if any is missing.
    pub fn center_x(&self, scheme: LandmarkScheme) -> Option<f64> {
        let indices = scheme.indices();
        let mut sum = 0.0;
        for &i in indices {
            sum += self.get(i)?.0;
        }
        Some(sum / indices.len() as f64)
    }

    /// `nose.x - center_x(scheme)`. Positive when the nose sits right of center.
    pub fn horizontal_offset(&self, scheme: LandmarkScheme) -> Option<f64> {
        let nose = self.get(NOSE_TIP)?;
        Some(nose.0 - self.center_x(scheme)?)
    }
}
