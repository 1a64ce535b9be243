use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::capture::domain::image_encoder::ImageEncoder;
use crate::shared::frame::Frame;

/// Browser canvases encode JPEG at 0.92 by default; match it.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Encodes frames as baseline JPEG with the `image` crate.
pub struct JpegImageEncoder {
    quality: u8,
}

impl JpegImageEncoder {
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Default for JpegImageEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for JpegImageEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, self.quality);
        encoder.encode(
            frame.data(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}
