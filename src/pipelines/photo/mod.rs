// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline
//!
//! ```text
//! CameraFrame → FrameCodec (decode + rotate) → PhotoEncoder → GalleryWriter
//! ```
//!
//! - [`codec`]: frame decode with blank fallback, sensor rotation
//! - [`encoding`]: JPEG/PNG encoding for the gallery

pub mod codec;
pub mod encoding;

pub use codec::{DecodedImage, FrameCodec};
pub use encoding::{EncodedImage, PhotoEncoder};
