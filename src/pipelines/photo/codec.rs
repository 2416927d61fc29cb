// SPDX-License-Identifier: GPL-3.0-only

//! Frame decoding
//!
//! Turns a captured [`CameraFrame`] into an upright [`DecodedImage`]:
//! - Compressed frames are decoded with the `image` crate
//! - Raw RGBA/RGB frames are wrapped directly
//! - Undecodable frames degrade to a blank bitmap of the declared size
//! - Sensor rotation is applied last
//!
//! The source frame is released as soon as its pixels have been read,
//! whether decoding succeeded or not.

use crate::backends::camera::types::{CameraFrame, PixelFormat, SensorRotation};
use crate::constants::MAX_FRAME_PIXELS;
use crate::errors::DecodeError;
use image::{RgbImage, RgbaImage, imageops};
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable decoded bitmap
///
/// Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: Arc<RgbaImage>,
}

impl DecodedImage {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the RGBA pixels
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Address of the pixel buffer (identity check for zero-copy paths)
    pub fn buffer_ptr(&self) -> *const u8 {
        self.pixels.as_raw().as_ptr()
    }
}

/// Frame codec
pub struct FrameCodec;

impl FrameCodec {
    /// Decode and orient a captured frame
    ///
    /// Never fails: decode trouble is logged and replaced with a blank bitmap.
    pub fn decode(frame: CameraFrame) -> DecodedImage {
        let width = frame.width;
        let height = frame.height;
        let rotation = frame.rotation;

        let decoded = Self::decode_primary_plane(&frame);
        frame.release();

        let image = match decoded {
            Ok(image) => {
                debug!(
                    width = image.width(),
                    height = image.height(),
                    "Frame decoded"
                );
                image
            }
            Err(e) => {
                warn!(error = %e, width, height, "Frame decode failed, using blank image");
                Self::blank(width, height)
            }
        };

        Self::rotate(DecodedImage::new(image), rotation)
    }

    /// Decode the primary plane of a frame without applying rotation
    pub fn decode_primary_plane(frame: &CameraFrame) -> Result<RgbaImage, DecodeError> {
        let data = frame.primary_plane().ok_or(DecodeError::MissingPlane)?;

        match frame.format {
            PixelFormat::Jpeg => image::load_from_memory(data)
                .map(|img| img.to_rgba8())
                .map_err(|e| DecodeError::Undecodable(e.to_string())),
            PixelFormat::Rgba8 => {
                let raw = Self::packed_slice(data, frame.width, frame.height, 4)?;
                RgbaImage::from_raw(frame.width, frame.height, raw.to_vec()).ok_or(
                    DecodeError::BufferTooSmall {
                        expected: raw.len(),
                        actual: data.len(),
                    },
                )
            }
            PixelFormat::Rgb8 => {
                let raw = Self::packed_slice(data, frame.width, frame.height, 3)?;
                RgbImage::from_raw(frame.width, frame.height, raw.to_vec())
                    .map(|rgb| image::DynamicImage::ImageRgb8(rgb).to_rgba8())
                    .ok_or(DecodeError::BufferTooSmall {
                        expected: raw.len(),
                        actual: data.len(),
                    })
            }
        }
    }

    /// Rotate a decoded image clockwise
    ///
    /// A zero rotation returns the input as-is, sharing its pixel buffer.
    pub fn rotate(image: DecodedImage, rotation: SensorRotation) -> DecodedImage {
        let rotated = match rotation {
            SensorRotation::None => return image,
            SensorRotation::Rotate90 => imageops::rotate90(image.pixels()),
            SensorRotation::Rotate180 => imageops::rotate180(image.pixels()),
            SensorRotation::Rotate270 => imageops::rotate270(image.pixels()),
        };
        debug!(%rotation, "Applied sensor rotation");
        DecodedImage::new(rotated)
    }

    /// Blank (transparent black) bitmap of the given size
    fn blank(width: u32, height: u32) -> RgbaImage {
        if (width as u64) * (height as u64) > MAX_FRAME_PIXELS {
            let e = DecodeError::DimensionsTooLarge { width, height };
            warn!(error = %e, "Cannot allocate fallback image, using 1x1");
            return RgbaImage::new(1, 1);
        }
        RgbaImage::new(width, height)
    }

    /// Slice of exactly width*height*bpp bytes from a packed buffer
    fn packed_slice(data: &[u8], width: u32, height: u32, bpp: u64) -> Result<&[u8], DecodeError> {
        let pixels = (width as u64) * (height as u64);
        if pixels > MAX_FRAME_PIXELS {
            return Err(DecodeError::DimensionsTooLarge { width, height });
        }
        let expected = (pixels * bpp) as usize;
        data.get(..expected).ok_or(DecodeError::BufferTooSmall {
            expected,
            actual: data.len(),
        })
    }
}
