use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageEncoder;
use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{CANONICAL_FACE_SIZE, THUMBNAIL_JPEG_QUALITY, THUMBNAIL_MIME};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("face region has no area inside the frame")]
    EmptyRegion,
    #[error("frame buffer does not match its dimensions")]
    InvalidFrame,
    #[error("failed to encode face thumbnail: {0}")]
    Encode(String),
}

/// Encoded face crop, ready to store or send back to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceThumbnail {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl FaceThumbnail {
    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:image/jpeg;base64,...` for previews.
    pub fn to_data_uri(&self) -> String {
        format!("data:{THUMBNAIL_MIME};base64,{}", STANDARD.encode(&self.data))
    }
}

/// Crops a face out of a frame into a fixed-size JPEG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionEncoder {
    size: u32,
    quality: u8,
}

impl RegionEncoder {
    pub fn new(size: u32, quality: u8) -> Self {
        Self { size, quality }
    }

    /// Clamp, crop, resize to `size × size` and encode.
    ///
    /// The aspect ratio of the crop is not preserved.
    pub fn encode(&self, frame: &Frame, bbox: &BoundingBox) -> Result<FaceThumbnail, RegionError> {
        let region = bbox
            .clamp_to(frame.width(), frame.height())
            .ok_or(RegionError::EmptyRegion)?;

        let img = frame.to_rgb_image().ok_or(RegionError::InvalidFrame)?;
        let crop = image::imageops::crop_imm(
            &img,
            region.x as u32,
            region.y as u32,
            region.width as u32,
            region.height as u32,
        )
        .to_image();
        let resized = image::imageops::resize(&crop, self.size, self.size, FilterType::Triangle);

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.quality)
            .write_image(
                resized.as_raw(),
                resized.width(),
                resized.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| RegionError::Encode(e.to_string()))?;

        log::debug!(
            "Encoded {}x{} face region at ({}, {}) into {} bytes",
            region.width,
            region.height,
            region.x,
            region.y,
            buffer.len()
        );
        Ok(FaceThumbnail {
            data: buffer,
            width: resized.width(),
            height: resized.height(),
        })
    }
}

impl Default for RegionEncoder {
    fn default() -> Self {
        Self::new(CANONICAL_FACE_SIZE, THUMBNAIL_JPEG_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128]);
            }
        }
        Frame::new(data, width, height)
    }

    fn decode_jpeg(bytes: &[u8]) -> image::DynamicImage {
        image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg).unwrap()
    }

    #[rstest]
    #[case::small_face(BoundingBox::new(10, 10, 20, 30))]
    #[case::large_face(BoundingBox::new(0, 0, 600, 400))]
    #[case::wide_face(BoundingBox::new(50, 100, 300, 40))]
    #[case::partly_outside(BoundingBox::new(-40, -40, 120, 120))]
    fn test_output_is_canonical_size(#[case] bbox: BoundingBox) {
        let frame = gradient_frame(640, 480);
        let thumb = RegionEncoder::default().encode(&frame, &bbox).unwrap();

        assert_eq!((thumb.width, thumb.height), (200, 200));
        let decoded = decode_jpeg(&thumb.data);
        assert_eq!((decoded.width(), decoded.height()), (200, 200));
    }

    #[test]
    fn test_custom_size() {
        let frame = gradient_frame(100, 100);
        let thumb = RegionEncoder::new(64, 80)
            .encode(&frame, &BoundingBox::new(10, 10, 50, 50))
            .unwrap();
        assert_eq!((thumb.width, thumb.height), (64, 64));
    }

    #[rstest]
    #[case::zero_area(BoundingBox::new(10, 10, 0, 0))]
    #[case::outside(BoundingBox::new(500, 500, 20, 20))]
    fn test_empty_region(#[case] bbox: BoundingBox) {
        let frame = gradient_frame(100, 100);
        assert!(matches!(
            RegionEncoder::default().encode(&frame, &bbox),
            Err(RegionError::EmptyRegion)
        ));
    }

    #[test]
    fn test_output_is_jpeg() {
        let frame = gradient_frame(100, 100);
        let thumb = RegionEncoder::default()
            .encode(&frame, &BoundingBox::new(0, 0, 100, 100))
            .unwrap();
        assert_eq!(&thumb.data[..2], &[0xFF, 0xD8]);
        assert_eq!(thumb.len(), thumb.data.len());
        assert!(!thumb.is_empty());
    }

    #[test]
    fn test_data_uri_round_trips() {
        let thumb = FaceThumbnail {
            data: vec![0xFF, 0xD8, 0xFF],
            width: 1,
            height: 1,
        };
        let uri = thumb.to_data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let body = uri.split_once(',').unwrap().1;
        assert_eq!(STANDARD.decode(body).unwrap(), thumb.data);
    }
}
