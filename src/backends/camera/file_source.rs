// SPDX-License-Identifier: GPL-3.0-only

//! File source camera backend
//!
//! Serves an image file from disk as the sensor output. Every capture reads
//! the file again, so the source can be swapped while the camera is bound.

use super::types::*;
use super::CameraBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Camera backed by a still image on disk
pub struct FileSourceBackend {
    path: PathBuf,
    rotation: SensorRotation,
    binding: Option<DisplayTarget>,
}

impl FileSourceBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation: SensorRotation::None,
            binding: None,
        }
    }

    /// Rotation reported with every frame
    pub fn with_rotation(mut self, rotation: SensorRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CameraBackend for FileSourceBackend {
    fn name(&self) -> &str {
        "file-source"
    }

    fn bind(&mut self, target: &DisplayTarget, use_cases: &[UseCase]) -> BackendResult<()> {
        if !self.path.is_file() {
            return Err(BackendError::DeviceNotFound(format!(
                "{} is not a file",
                self.path.display()
            )));
        }

        info!(
            path = %self.path.display(),
            display_id = target.id,
            ?use_cases,
            "File source bound"
        );
        self.binding = Some(*target);
        Ok(())
    }

    fn unbind(&mut self) {
        if self.binding.take().is_some() {
            debug!(path = %self.path.display(), "File source unbound");
        }
    }

    fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn capture_frame(&mut self) -> BackendResult<CameraFrame> {
        if self.binding.is_none() {
            return Err(BackendError::NotBound);
        }

        let data = std::fs::read(&self.path)?;

        // Declared size comes from the header; the codec falls back to a
        // blank image of this size if the body turns out to be corrupt.
        let (width, height) = match image::image_dimensions(&self.path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read image header");
                (0, 0)
            }
        };

        debug!(width, height, bytes = data.len(), "File source frame captured");

        Ok(CameraFrame::new(
            width,
            height,
            PixelFormat::Jpeg,
            self.rotation,
            vec![Arc::from(data)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_missing_file_fails() {
        let mut backend = FileSourceBackend::new("/nonexistent/photo.jpg");
        let result = backend.bind(&DisplayTarget::new(1, 640, 480), &[UseCase::Preview]);
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
        assert!(!backend.is_bound());
    }

    #[test]
    fn test_capture_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.png");
        image::RgbaImage::new(12, 7).save(&path).unwrap();

        let mut backend = FileSourceBackend::new(&path).with_rotation(SensorRotation::Rotate180);
        backend
            .bind(&DisplayTarget::new(1, 640, 480), &[UseCase::ImageCapture])
            .unwrap();

        let frame = backend.capture_frame().unwrap();
        assert_eq!((frame.width, frame.height), (12, 7));
        assert_eq!(frame.rotation, SensorRotation::Rotate180);
        assert!(frame.primary_plane().is_some_and(|plane| !plane.is_empty()));
    }
}
