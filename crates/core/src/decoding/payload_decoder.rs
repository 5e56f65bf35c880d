//! Turns transport payloads (base64 strings, optionally `data:` URIs) into
//! RGB frames.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("no image data provided")]
    EmptyPayload,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error("failed to decode image: {0}")]
    Image(String),
    #[error("image dimensions are zero")]
    ZeroDimensions,
}

/// Formats accepted from webcam clients.
const SUPPORTED_FORMATS: &[image::ImageFormat] = &[
    image::ImageFormat::Jpeg,
    image::ImageFormat::Png,
    image::ImageFormat::WebP,
    image::ImageFormat::Bmp,
    image::ImageFormat::Gif,
];

/// Removes a `data:<mime>;base64,` header if present.
pub fn strip_data_uri(payload: &str) -> &str {
    let trimmed = payload.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, body)) = trimmed.split_once(',') {
            return body.trim();
        }
    }
    trimmed
}

/// Decodes a base64 image payload into a frame.
pub fn decode_payload(payload: &str) -> Result<Frame, DecodeError> {
    let body = strip_data_uri(payload);
    if body.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    // Encoders such as base64(1) and MIME wrap lines at 76 columns.
    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = match STANDARD.decode(&body) {
        Ok(bytes) => bytes,
        // Some clients drop the trailing '=' padding.
        Err(_) => STANDARD_NO_PAD.decode(body.trim_end_matches('='))?,
    };
    decode_bytes(&bytes)
}

/// Decodes encoded image bytes (JPEG, PNG, WebP, BMP, GIF) into an RGB frame.
pub fn decode_bytes(bytes: &[u8]) -> Result<Frame, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnsupportedFormat)?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(DecodeError::UnsupportedFormat);
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::Image(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(DecodeError::ZeroDimensions);
    }

    log::debug!(
        "Decoded {:?} frame {}x{}",
        format,
        decoded.width(),
        decoded.height()
    );
    Ok(Frame::from_rgb_image(decoded.to_rgb8()))
}
