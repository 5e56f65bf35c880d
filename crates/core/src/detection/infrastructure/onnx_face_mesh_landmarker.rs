/// Face-mesh landmark model using ONNX Runtime via `ort`.
///
/// Runs in two stages: a [`FaceDetector`] locates the face, then the mesh
/// model regresses 468 points inside a square crop around it.
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::math::sigmoid;
use super::onnx_session::{inference_err, input_shape, load_session, Session};
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::detection::domain::landmark_set::{LandmarkSet, MESH_POINTS};
use crate::shared::bounding_box::{select_best, BoundingBox};
use crate::shared::frame::Frame;

/// Mesh input resolution when the model does not declare one.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// The crop is this many times the detected box, around its centre.
const ROI_SCALE: f64 = 1.5;

/// Face-presence probability below which the mesh is discarded.
const PRESENCE_THRESHOLD: f32 = 0.5;

/// Memory layout of the mesh input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    Nchw,
    Nhwc,
}

/// Square crop in frame pixels, already clamped to the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Roi {
    x: f64,
    y: f64,
    size_x: f64,
    size_y: f64,
}

pub struct OnnxFaceMeshLandmarker {
    session: Mutex<Session>,
    locator: Arc<dyn FaceDetector>,
    input_size: u32,
    layout: Layout,
}

impl OnnxFaceMeshLandmarker {
    /// Load a face-mesh ONNX model.
    ///
    /// The input resolution and layout are read from the model's input
    /// shape: `[1, 3, H, W]` is NCHW, anything else is treated as NHWC.
    /// Falls back to 192 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, locator: Arc<dyn FaceDetector>) -> Result<Self, DetectionError> {
        let session = load_session(model_path)?;
        let (input_size, layout) = input_shape(&session)
            .map(|shape| layout_from_shape(&shape))
            .unwrap_or((DEFAULT_INPUT_SIZE, Layout::Nhwc));

        log::info!(
            "Loaded face-mesh model from {} ({}x{} {:?})",
            model_path.display(),
            input_size,
            input_size,
            layout
        );
        Ok(Self {
            session: Mutex::new(session),
            locator,
            input_size,
            layout,
        })
    }

    fn infer(&self, tensor: ndarray::Array4<f32>) -> Result<(Vec<f32>, Option<f32>), DetectionError> {
        let input_value = ort::value::Tensor::from_array(tensor).map_err(inference_err)?;

        let mut session = self.session.lock().map_err(|_| DetectionError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(inference_err)?;

        // Face-mesh outputs:
        // - landmarks: 468 × (x, y, z) in input pixels, any leading shape
        // - face flag (optional): single presence logit
        if outputs.len() < 1 {
            return Err(DetectionError::UnexpectedOutput(
                "face-mesh model produced no outputs".into(),
            ));
        }

        let points = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;
        let points = points
            .as_slice()
            .ok_or_else(|| DetectionError::UnexpectedOutput("landmarks not contiguous".into()))?
            .to_vec();

        let presence = if outputs.len() > 1 {
            let flag = outputs[1]
                .try_extract_array::<f32>()
                .map_err(inference_err)?;
            flag.iter().next().copied()
        } else {
            None
        };

        Ok((points, presence))
    }
}

impl LandmarkModel for OnnxFaceMeshLandmarker {
    fn landmarks(&self, frame: &Frame) -> Result<Option<LandmarkSet>, DetectionError> {
        if frame.is_empty() {
            return Ok(None);
        }

        let candidates = self.locator.detect(frame)?;
        let Some(face) = select_best(&candidates) else {
            return Ok(None);
        };
        let Some(roi) = square_roi(face, frame.width(), frame.height()) else {
            return Ok(None);
        };

        let tensor = sample_roi(frame, &roi, self.input_size, self.layout);
        let (raw, presence) = self.infer(tensor)?;

        if let Some(logit) = presence {
            let p = sigmoid(logit);
            if p < PRESENCE_THRESHOLD {
                log::debug!("Face mesh: presence {p:.3} below threshold");
                return Ok(None);
            }
        }

        if raw.len() < MESH_POINTS * 3 {
            return Err(DetectionError::UnexpectedOutput(format!(
                "expected {} landmark values, got {}",
                MESH_POINTS * 3,
                raw.len()
            )));
        }

        Ok(Some(map_points(
            &raw,
            &roi,
            self.input_size,
            frame.width(),
            frame.height(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

fn layout_from_shape(shape: &[i64]) -> (u32, Layout) {
    if shape.len() < 4 {
        return (DEFAULT_INPUT_SIZE, Layout::Nhwc);
    }
    let (layout, height) = if shape[1] == 3 {
        (Layout::Nchw, shape[2])
    } else {
        (Layout::Nhwc, shape[1])
    };
    let size = if height > 0 {
        height as u32
    } else {
        DEFAULT_INPUT_SIZE
    };
    (size, layout)
}

/// Square crop `ROI_SCALE` times the larger box side, centred on the box.
///
/// Returns `None` when nothing of the crop lies inside the frame.
fn square_roi(face: &BoundingBox, fw: u32, fh: u32) -> Option<Roi> {
    let (cx, cy) = face.center();
    let side = face.width.max(face.height) as f64 * ROI_SCALE;
    if side <= 0.0 {
        return None;
    }

    let x1 = (cx - side / 2.0).max(0.0);
    let y1 = (cy - side / 2.0).max(0.0);
    let x2 = (cx + side / 2.0).min(fw as f64);
    let y2 = (cy + side / 2.0).min(fh as f64);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(Roi {
        x: x1,
        y: y1,
        size_x: x2 - x1,
        size_y: y2 - y1,
    })
}

/// Nearest-neighbour sample of the crop into a `[0, 1]` float tensor.
fn sample_roi(frame: &Frame, roi: &Roi, size: u32, layout: Layout) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let max_x = frame.width() as usize - 1;
    let max_y = frame.height() as usize - 1;
    let s = size as usize;

    let mut tensor = match layout {
        Layout::Nchw => ndarray::Array4::<f32>::zeros((1, 3, s, s)),
        Layout::Nhwc => ndarray::Array4::<f32>::zeros((1, s, s, 3)),
    };

    for y in 0..s {
        let src_y = ((roi.y + (y as f64 + 0.5) * roi.size_y / s as f64) as usize).min(max_y);
        for x in 0..s {
            let src_x = ((roi.x + (x as f64 + 0.5) * roi.size_x / s as f64) as usize).min(max_x);
            for c in 0..3 {
                let v = src[[src_y, src_x, c]] as f32 / 255.0;
                match layout {
                    Layout::Nchw => tensor[[0, c, y, x]] = v,
                    Layout::Nhwc => tensor[[0, y, x, c]] = v,
                }
            }
        }
    }

    tensor
}

/// Converts mesh points from input pixels to frame-normalized coordinates.
fn map_points(raw: &[f32], roi: &Roi, size: u32, fw: u32, fh: u32) -> LandmarkSet {
    let s = size as f64;
    let points = raw
        .chunks_exact(3)
        .take(MESH_POINTS)
        .map(|p| {
            let x = roi.x + p[0] as f64 / s * roi.size_x;
            let y = roi.y + p[1] as f64 / s * roi.size_y;
            (x / fw as f64, y / fh as f64)
        })
        .collect();
    LandmarkSet::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::nhwc(vec![1, 192, 192, 3], 192, Layout::Nhwc)]
    #[case::nchw(vec![1, 3, 256, 256], 256, Layout::Nchw)]
    #[case::dynamic(vec![1, -1, -1, 3], DEFAULT_INPUT_SIZE, Layout::Nhwc)]
    #[case::short(vec![1, 192], DEFAULT_INPUT_SIZE, Layout::Nhwc)]
    fn test_layout_from_shape(
        #[case] shape: Vec<i64>,
        #[case] size: u32,
        #[case] layout: Layout,
    ) {
        assert_eq!(layout_from_shape(&shape), (size, layout));
    }

    #[test]
    fn test_square_roi_inside_frame() {
        let face = BoundingBox::new(100, 100, 40, 40);
        let roi = square_roi(&face, 640, 480).unwrap();
        // 60px square around (120, 120)
        assert_relative_eq!(roi.x, 90.0);
        assert_relative_eq!(roi.y, 90.0);
        assert_relative_eq!(roi.size_x, 60.0);
        assert_relative_eq!(roi.size_y, 60.0);
    }

    #[test]
    fn test_square_roi_uses_longer_side() {
        let face = BoundingBox::new(100, 100, 40, 80);
        let roi = square_roi(&face, 640, 480).unwrap();
        assert_relative_eq!(roi.size_x, 120.0);
        assert_relative_eq!(roi.size_y, 120.0);
    }

    #[test]
    fn test_square_roi_clamped_at_border() {
        let face = BoundingBox::new(-10, -10, 40, 40);
        let roi = square_roi(&face, 100, 100).unwrap();
        assert_relative_eq!(roi.x, 0.0);
        assert_relative_eq!(roi.y, 0.0);
        // centre 10, half side 30 → right edge at 40
        assert_relative_eq!(roi.size_x, 40.0);
    }

    #[test]
    fn test_square_roi_outside_frame() {
        let face = BoundingBox::new(500, 500, 20, 20);
        assert!(square_roi(&face, 100, 100).is_none());
        assert!(square_roi(&BoundingBox::new(10, 10, 0, 0), 100, 100).is_none());
    }

    #[test]
    fn test_sample_roi_layouts() {
        let frame = Frame::new(vec![255u8; 20 * 10 * 3], 20, 10);
        let roi = Roi {
            x: 0.0,
            y: 0.0,
            size_x: 10.0,
            size_y: 10.0,
        };
        let nhwc = sample_roi(&frame, &roi, 8, Layout::Nhwc);
        assert_eq!(nhwc.shape(), &[1, 8, 8, 3]);
        assert!((nhwc[[0, 7, 7, 2]] - 1.0).abs() < 1e-6);

        let nchw = sample_roi(&frame, &roi, 8, Layout::Nchw);
        assert_eq!(nchw.shape(), &[1, 3, 8, 8]);
    }

    #[test]
    fn test_map_points_back_to_frame() {
        let roi = Roi {
            x: 100.0,
            y: 50.0,
            size_x: 200.0,
            size_y: 200.0,
        };
        let mut raw = vec![0.0f32; MESH_POINTS * 3];
        // Point 0 at the centre of the mesh input
        raw[0] = 96.0;
        raw[1] = 96.0;
        let set = map_points(&raw, &roi, 192, 400, 300);

        assert_eq!(set.len(), MESH_POINTS);
        let (x, y) = set.get(0).unwrap();
        assert_relative_eq!(x, 200.0 / 400.0, epsilon = 1e-9);
        assert_relative_eq!(y, 150.0 / 300.0, epsilon = 1e-9);
        // Point 1 at the crop's top-left corner
        let (x, y) = set.get(1).unwrap();
        assert_relative_eq!(x, 0.25, epsilon = 1e-9);
        assert_relative_eq!(y, 50.0 / 300.0, epsilon = 1e-9);
    }
}
