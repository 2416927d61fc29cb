// SPDX-License-Identifier: GPL-3.0-only

//! Gallery encoding
//!
//! Turns a [`DecodedImage`] into the bytes written to the media store, using
//! the format and quality chosen in [`crate::config`].

use super::codec::DecodedImage;
use crate::config::{PhotoOutputFormat, PhotoQuality};
use crate::errors::WriteError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encoded bytes plus what the media store needs to describe them
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: PhotoOutputFormat,
    pub width: u32,
    pub height: u32,
}

/// Encoder configured with an output format and JPEG quality
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder {
    format: PhotoOutputFormat,
    quality: PhotoQuality,
}

impl PhotoEncoder {
    /// JPEG at the default quality preset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(format: PhotoOutputFormat, quality: PhotoQuality) -> Self {
        Self { format, quality }
    }

    pub fn format(&self) -> PhotoOutputFormat {
        self.format
    }

    /// Encode `image`; CPU-bound, so callers run it on the blocking pool
    pub fn encode(&self, image: &DecodedImage) -> Result<EncodedImage, WriteError> {
        let mut data = Vec::new();
        match self.format {
            PhotoOutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(image.pixels().clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut data, self.quality.jpeg_quality())
                    .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                    .map_err(|e| WriteError::EncodingFailed(format!("JPEG: {}", e)))?;
            }
            PhotoOutputFormat::Png => {
                image
                    .pixels()
                    .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                    .map_err(|e| WriteError::EncodingFailed(format!("PNG: {}", e)))?;
            }
        }

        debug!(bytes = data.len(), format = ?self.format, "Photo encoded");

        Ok(EncodedImage {
            data,
            format: self.format,
            width: image.width(),
            height: image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_default_encoder_writes_jpeg() {
        let image = DecodedImage::new(RgbaImage::new(16, 8));
        let encoded = PhotoEncoder::new().encode(&image).unwrap();
        assert_eq!(encoded.format, PhotoOutputFormat::Jpeg);
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        assert_eq!((encoded.width, encoded.height), (16, 8));
    }

    #[test]
    fn test_configured_png_keeps_alpha() {
        let mut pixels = RgbaImage::new(4, 4);
        pixels.put_pixel(1, 2, image::Rgba([10, 20, 30, 40]));
        let encoder = PhotoEncoder::with_settings(PhotoOutputFormat::Png, PhotoQuality::Low);
        let encoded = encoder.encode(&DecodedImage::new(pixels)).unwrap();

        assert_eq!(encoded.format.mime_type(), "image/png");
        let decoded = image::load_from_memory(&encoded.data).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 2).0, [10, 20, 30, 40]);
    }

    #[test]
    fn test_quality_preset_changes_jpeg_size() {
        let mut pixels = RgbaImage::new(64, 64);
        for (x, y, p) in pixels.enumerate_pixels_mut() {
            *p = image::Rgba([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8, 255]);
        }
        let image = DecodedImage::new(pixels);
        let low = PhotoEncoder::with_settings(PhotoOutputFormat::Jpeg, PhotoQuality::Low)
            .encode(&image)
            .unwrap();
        let max = PhotoEncoder::with_settings(PhotoOutputFormat::Jpeg, PhotoQuality::Maximum)
            .encode(&image)
            .unwrap();
        assert!(low.data.len() < max.data.len());
    }
}
