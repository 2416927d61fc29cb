// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Application directory name (config dir and gallery folder)
pub const APP_DIR_NAME: &str = "pocket-camera";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Minimum free space required before a photo is written (5 MiB)
pub const MIN_FREE_SPACE_BYTES: u64 = 5 * 1024 * 1024;

/// How long the "photo saved" state is shown before returning to ready
pub const PHOTO_SAVED_DISPLAY_MS: u64 = 2000;

/// Upper bound for decoded frame size in pixels (fallback allocations included)
pub const MAX_FRAME_PIXELS: u64 = 100_000_000;

/// URI scheme prefix for gallery records
pub const GALLERY_URI_PREFIX: &str = "media://gallery/";

/// Filename prefix for saved photos
pub const PHOTO_FILE_PREFIX: &str = "IMG_";

/// Timestamp format used in photo filenames
pub const PHOTO_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Test pattern defaults
pub mod test_pattern {
    /// Default test pattern width
    pub const WIDTH: u32 = 640;
    /// Default test pattern height
    pub const HEIGHT: u32 = 480;
    /// JPEG quality used when synthesizing frames
    pub const JPEG_QUALITY: u8 = 90;
}
