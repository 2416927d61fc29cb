// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use pocket_camera::backends::camera::SensorRotation;
use pocket_camera::config::{PhotoOutputFormat, PhotoQuality};
use pocket_camera::constants::{
    GALLERY_URI_PREFIX, MIN_FREE_SPACE_BYTES, PHOTO_FILE_PREFIX, PHOTO_SAVED_DISPLAY_MS,
};
use pocket_camera::storage::photo_file_name;

#[test]
fn test_thresholds() {
    assert_eq!(MIN_FREE_SPACE_BYTES, 5 * 1024 * 1024);
    assert_eq!(PHOTO_SAVED_DISPLAY_MS, 2000);
}

#[test]
fn test_photo_file_name_format() {
    // IMG_YYYYMMDD_HHMMSS.jpg
    let name = photo_file_name(PhotoOutputFormat::Jpeg);
    assert!(name.starts_with(PHOTO_FILE_PREFIX));
    assert!(name.ends_with(".jpg"));
    assert_eq!(name.len(), "IMG_20240101_120000.jpg".len());
}

#[test]
fn test_gallery_uri_prefix() {
    assert!(GALLERY_URI_PREFIX.ends_with('/'));
}

#[test]
fn test_rotation_degrees() {
    // Only quarter turns are valid sensor orientations
    for rotation in SensorRotation::ALL {
        assert_eq!(
            SensorRotation::from_degrees(rotation.degrees() as i32),
            Some(rotation)
        );
    }
    assert_eq!(SensorRotation::from_degrees(45), None);
    // Negative and wrapped angles normalize
    assert_eq!(
        SensorRotation::from_degrees(-90),
        Some(SensorRotation::Rotate270)
    );
    assert_eq!(
        SensorRotation::from_degrees(450),
        Some(SensorRotation::Rotate90)
    );
}

#[test]
fn test_jpeg_quality_ordering() {
    // Presets are ordered from lowest to highest quality
    let qualities = [
        PhotoQuality::Low,
        PhotoQuality::Medium,
        PhotoQuality::High,
        PhotoQuality::Maximum,
    ];
    let mut prev = 0u8;
    for quality in qualities {
        assert!(quality.jpeg_quality() > prev);
        prev = quality.jpeg_quality();
    }
}
