use serde::Serialize;

/// A rectangle in pixel coordinates believed to contain a face.
///
/// Detectors hand back raw, possibly out-of-frame boxes. Anything returned
/// to callers of the extractor has gone through [`BoundingBox::clamp_to`],
/// so it lies inside the frame and has positive area.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Detector score in `[0, 1]`, when the detector reports one.
    pub confidence: Option<f64>,
}

/// Wire shape of a box: `{x, y, w, h}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoxJson {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Builds a box from corner coordinates, truncating like the detector
    /// adapters do when converting model output to pixels.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1.floor() as i32;
        let y = y1.floor() as i32;
        Self::new(x, y, (x2 - x1) as i32, (y2 - y1) as i32)
    }

    /// Score used for ranking candidates; unscored boxes count as certain
    /// and non-finite scores count as zero.
    pub fn score(&self) -> f64 {
        match self.confidence {
            Some(c) if c.is_finite() => c,
            Some(_) => 0.0,
            None => 1.0,
        }
    }

    /// False when the detector reported a NaN or infinite score.
    pub fn has_valid_score(&self) -> bool {
        self.confidence.map_or(true, f64::is_finite)
    }

    pub fn area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Grows the box by `factor` of its width/height on every side.
    ///
    /// The result is not clamped; call [`BoundingBox::clamp_to`] afterwards.
    pub fn expand(&self, factor: f64) -> BoundingBox {
        if factor <= 0.0 {
            return self.clone();
        }
        let dx = self.width as f64 * factor;
        let dy = self.height as f64 * factor;
        BoundingBox {
            x: (self.x as f64 - dx) as i32,
            y: (self.y as f64 - dy) as i32,
            width: (self.width as f64 * (1.0 + 2.0 * factor)).round() as i32,
            height: (self.height as f64 * (1.0 + 2.0 * factor)).round() as i32,
            confidence: self.confidence,
        }
    }

    /// Intersects the box with `[0, frame_width) × [0, frame_height)`.
    ///
    /// Returns `None` when nothing of positive area remains.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<BoundingBox> {
        let fw = i64::from(frame_width);
        let fh = i64::from(frame_height);
        let x1 = i64::from(self.x).max(0);
        let y1 = i64::from(self.y).max(0);
        let x2 = (i64::from(self.x) + i64::from(self.width)).min(fw);
        let y2 = (i64::from(self.y) + i64::from(self.height)).min(fh);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(BoundingBox {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1) as i32,
            height: (y2 - y1) as i32,
            confidence: self.confidence,
        })
    }

    pub fn to_json(&self) -> BoxJson {
        BoxJson {
            x: self.x,
            y: self.y,
            w: self.width,
            h: self.height,
        }
    }
}

/// Picks the highest-scoring candidate; the first one wins ties.
/// Candidates with a non-finite score are never picked.
pub fn select_best(candidates: &[BoundingBox]) -> Option<&BoundingBox> {
    candidates
        .iter()
        .filter(|c| c.has_valid_score())
        .fold(None, |best, candidate| match best {
            Some(b) if candidate.score() <= b.score() => Some(b),
            _ => Some(candidate),
        })
}
