// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera backend
//!
//! Produces JPEG-compressed gradient frames. Used when no real sensor is
//! attached (CLI demo mode) and as the hardware stand-in for tests: bind and
//! capture failures, corrupt frames and capture latency can all be injected.

use super::types::*;
use super::CameraBackend;
use crate::constants::test_pattern::{HEIGHT, JPEG_QUALITY, WIDTH};
use image::{Rgb, RgbImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Shared counters exposing what a backend has been asked to do
#[derive(Debug, Default)]
pub struct BackendProbe {
    binds: AtomicUsize,
    unbinds: AtomicUsize,
    captures: AtomicUsize,
    outstanding_frames: AtomicUsize,
}

impl BackendProbe {
    /// Successful bind calls
    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    /// Unbind calls that released an active binding
    pub fn unbinds(&self) -> usize {
        self.unbinds.load(Ordering::SeqCst)
    }

    /// Capture requests issued to the hardware
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Frames handed out and not yet released
    pub fn outstanding_frames(&self) -> usize {
        self.outstanding_frames.load(Ordering::SeqCst)
    }
}

/// Synthetic gradient camera
pub struct TestPatternBackend {
    width: u32,
    height: u32,
    rotation: SensorRotation,
    capture_delay: Option<Duration>,
    bind_failure: Option<String>,
    capture_failure: Option<String>,
    corrupt_frames: bool,
    binding: Option<DisplayTarget>,
    probe: Arc<BackendProbe>,
}

impl TestPatternBackend {
    pub fn new() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            rotation: SensorRotation::None,
            capture_delay: None,
            bind_failure: None,
            capture_failure: None,
            corrupt_frames: false,
            binding: None,
            probe: Arc::new(BackendProbe::default()),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_rotation(mut self, rotation: SensorRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Simulate hardware latency for each capture
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = Some(delay);
        self
    }

    /// Make every bind attempt fail
    pub fn failing_bind(mut self, reason: impl Into<String>) -> Self {
        self.bind_failure = Some(reason.into());
        self
    }

    /// Make every capture request fail
    pub fn failing_capture(mut self, reason: impl Into<String>) -> Self {
        self.capture_failure = Some(reason.into());
        self
    }

    /// Emit frames whose compressed data cannot be decoded
    pub fn corrupt_frames(mut self) -> Self {
        self.corrupt_frames = true;
        self
    }

    /// Counters shared with this backend
    pub fn probe(&self) -> Arc<BackendProbe> {
        Arc::clone(&self.probe)
    }

    /// Render the gradient and compress it to JPEG
    fn render_jpeg(&self) -> BackendResult<Vec<u8>> {
        let (w, h) = (self.width.max(1), self.height.max(1));
        let image = RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([
                (x * 255 / w) as u8,
                (y * 255 / h) as u8,
                ((x + y) * 255 / (w + h)) as u8,
            ])
        });

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::CaptureFailed(format!("JPEG encoding failed: {}", e)))?;
        Ok(buffer)
    }
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for TestPatternBackend {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn bind(&mut self, target: &DisplayTarget, use_cases: &[UseCase]) -> BackendResult<()> {
        if let Some(reason) = &self.bind_failure {
            return Err(BackendError::BindFailed(reason.clone()));
        }

        info!(display_id = target.id, ?use_cases, "Test pattern bound");
        self.binding = Some(*target);
        self.probe.binds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unbind(&mut self) {
        if self.binding.take().is_some() {
            self.probe.unbinds.fetch_add(1, Ordering::SeqCst);
            debug!("Test pattern unbound");
        }
    }

    fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn capture_frame(&mut self) -> BackendResult<CameraFrame> {
        if self.binding.is_none() {
            return Err(BackendError::NotBound);
        }
        self.probe.captures.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.capture_delay {
            std::thread::sleep(delay);
        }

        if let Some(reason) = &self.capture_failure {
            return Err(BackendError::CaptureFailed(reason.clone()));
        }

        let data = if self.corrupt_frames {
            vec![0xFF, 0xD8, 0xFF, 0x00, 0xDE, 0xAD]
        } else {
            self.render_jpeg()?
        };

        let probe = Arc::clone(&self.probe);
        probe.outstanding_frames.fetch_add(1, Ordering::SeqCst);

        debug!(
            width = self.width,
            height = self.height,
            rotation = %self.rotation,
            bytes = data.len(),
            "Test pattern frame captured"
        );

        Ok(CameraFrame::new(
            self.width,
            self.height,
            PixelFormat::Jpeg,
            self.rotation,
            vec![Arc::from(data)],
        )
        .with_release_hook(move || {
            probe.outstanding_frames.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}
