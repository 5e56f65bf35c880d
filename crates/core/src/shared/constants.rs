pub const DETECTOR_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const FACE_MESH_MODEL_NAME: &str = "face_mesh.onnx";

/// Side length of stored face thumbnails.
pub const CANONICAL_FACE_SIZE: u32 = 200;

/// JPEG quality for stored face thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 90;

pub const THUMBNAIL_MIME: &str = "image/jpeg";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Name used for cache and config directories.
pub const APP_DIR_NAME: &str = "facegate";
