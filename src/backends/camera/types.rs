// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use std::sync::Arc;
use std::time::Instant;

/// Sensor rotation in degrees (clockwise)
///
/// Camera sensors may be physically mounted at various angles relative to the
/// display. Frames carry the rotation needed to present them upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// All rotations, in ascending degree order
    pub const ALL: [SensorRotation; 4] = [
        SensorRotation::None,
        SensorRotation::Rotate90,
        SensorRotation::Rotate180,
        SensorRotation::Rotate270,
    ];

    /// Create rotation from an integer degree value.
    ///
    /// Returns `None` for values that are not a multiple of 90 once
    /// normalised to 0-360.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(SensorRotation::None),
            90 => Some(SensorRotation::Rotate90),
            180 => Some(SensorRotation::Rotate180),
            270 => Some(SensorRotation::Rotate270),
            _ => None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, SensorRotation::Rotate90 | SensorRotation::Rotate270)
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Pixel layout of a frame's primary plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Compressed still image (JPEG, or any format the decoder recognises)
    Jpeg,
    /// Tightly packed RGBA, 4 bytes per pixel
    Rgba8,
    /// Tightly packed RGB, 3 bytes per pixel
    Rgb8,
}

/// Hook run when a frame's underlying buffer is handed back to the hardware
type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A single captured frame
///
/// The frame owns its planes until [`CameraFrame::release`] is called. If a
/// frame is dropped without an explicit release the hook still runs, so the
/// backend always gets its buffer back exactly once.
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel layout of the primary plane
    pub format: PixelFormat,
    /// Clockwise rotation needed to display the frame upright
    pub rotation: SensorRotation,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
    planes: Vec<Arc<[u8]>>,
    release_hook: Option<ReleaseHook>,
}

impl CameraFrame {
    /// Create a frame from its planes (primary plane first)
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        rotation: SensorRotation,
        planes: Vec<Arc<[u8]>>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            rotation,
            captured_at: Instant::now(),
            planes,
            release_hook: None,
        }
    }

    /// Attach a hook that runs when the frame is released
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release_hook = Some(Box::new(hook));
        self
    }

    /// The primary plane, if the frame has one
    pub fn primary_plane(&self) -> Option<&[u8]> {
        self.planes.first().map(|plane| plane.as_ref())
    }

    /// Hand the underlying buffer back to the hardware
    pub fn release(mut self) {
        self.run_release_hook();
    }

    fn run_release_hook(&mut self) {
        self.planes.clear();
        if let Some(hook) = self.release_hook.take() {
            hook();
        }
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        self.run_release_hook();
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("rotation", &self.rotation)
            .field("planes", &self.planes.len())
            .finish()
    }
}

/// Display/lifecycle the camera binding is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTarget {
    /// Identifier of the owning display context
    pub id: u64,
    /// Preview surface width
    pub surface_width: u32,
    /// Preview surface height
    pub surface_height: u32,
}

impl DisplayTarget {
    pub fn new(id: u64, surface_width: u32, surface_height: u32) -> Self {
        Self {
            id,
            surface_width,
            surface_height,
        }
    }
}

/// Use-cases bound to the camera device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    /// Live preview rendered to the display surface
    Preview,
    /// Still image capture
    ImageCapture,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// No camera device present
    DeviceNotFound(String),
    /// Device exists but cannot be bound
    BindFailed(String),
    /// Operation requires a binding
    NotBound,
    /// Hardware capture failed
    CaptureFailed(String),
    /// I/O error
    IoError(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::BindFailed(msg) => write!(f, "Bind failed: {}", msg),
            BackendError::NotBound => write!(f, "Camera not bound"),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
