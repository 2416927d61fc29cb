// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture core

use crate::app::state::{CaptureEvent, CaptureState};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera binding errors
    Camera(CameraError),
    /// Hardware capture errors
    Capture(CaptureError),
    /// Pre-write storage checks
    Storage(StorageError),
    /// Gallery write failures
    Write(WriteError),
    /// Rejected state machine transition
    Transition(TransitionError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera device errors (binding and availability)
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Camera permission has not been granted
    PermissionDenied,
    /// No camera device is available
    Unavailable(String),
    /// Binding the preview/capture use-cases failed
    BindFailed(String),
}

/// Hardware capture errors
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// Session has no active binding
    NotBound,
    /// A capture request is already outstanding
    Busy,
    /// The hardware reported a failure
    Hardware(String),
    /// The capture callback never resolved
    CallbackDropped,
}

/// Frame decoding errors
///
/// These never leave the frame codec: decoding falls back to a blank bitmap.
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// Frame carries no planes
    MissingPlane,
    /// Compressed data could not be decoded
    Undecodable(String),
    /// Raw buffer shorter than the declared dimensions require
    BufferTooSmall { expected: usize, actual: usize },
    /// Declared dimensions are too large to allocate
    DimensionsTooLarge { width: u32, height: u32 },
}

/// Storage errors checked before a write is attempted
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Free space is below the configured threshold
    InsufficientSpace { available: u64, required: u64 },
    /// Free space could not be determined
    Unavailable(String),
}

/// Gallery write failures (reported as a `None` record)
#[derive(Debug, Clone)]
pub enum WriteError {
    /// Image could not be encoded
    EncodingFailed(String),
    /// Media store rejected the new entry
    EntryRejected(String),
    /// Write stream could not be opened
    StreamOpenFailed(String),
    /// Writing or flushing the stream failed
    WriteFailed(String),
    /// Publishing the pending entry failed
    PublishFailed(String),
    /// The gallery writer returned no record (cause already logged)
    NoRecord,
}

/// Rejected state machine transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// A capture was requested while the machine was not ready
    NotReady(CaptureState),
    /// The event is not valid in the current state
    Invalid {
        state: CaptureState,
        event: &'static str,
    },
}

impl TransitionError {
    pub(crate) fn invalid(state: CaptureState, event: &CaptureEvent) -> Self {
        TransitionError::Invalid {
            state,
            event: event.name(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Write(e) => write!(f, "Save failed: {}", e),
            AppError::Transition(e) => write!(f, "{}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Camera permission not granted"),
            CameraError::Unavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::BindFailed(msg) => write!(f, "Failed to bind camera: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NotBound => write!(f, "Camera is not bound"),
            CaptureError::Busy => write!(f, "A capture is already in progress"),
            CaptureError::Hardware(msg) => write!(f, "Capture failed: {}", msg),
            CaptureError::CallbackDropped => write!(f, "Capture callback never completed"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingPlane => write!(f, "Frame has no image plane"),
            DecodeError::Undecodable(msg) => write!(f, "Undecodable frame: {}", msg),
            DecodeError::BufferTooSmall { expected, actual } => write!(
                f,
                "Frame buffer too small: expected {} bytes, got {}",
                expected, actual
            ),
            DecodeError::DimensionsTooLarge { width, height } => {
                write!(f, "Frame dimensions too large: {}x{}", width, height)
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InsufficientSpace {
                available,
                required,
            } => write!(
                f,
                "Not enough free space: {} bytes available, {} required",
                available, required
            ),
            StorageError::Unavailable(msg) => write!(f, "Cannot query free space: {}", msg),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            WriteError::EntryRejected(msg) => write!(f, "Media store rejected entry: {}", msg),
            WriteError::StreamOpenFailed(msg) => write!(f, "Cannot open output stream: {}", msg),
            WriteError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            WriteError::PublishFailed(msg) => write!(f, "Cannot publish entry: {}", msg),
            WriteError::NoRecord => write!(f, "Photo could not be saved to the gallery"),
        }
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::NotReady(state) => {
                write!(f, "Camera not ready (currently {})", state)
            }
            TransitionError::Invalid { state, event } => {
                write!(f, "Event '{}' not allowed in state {}", event, state)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for StorageError {}
impl std::error::Error for WriteError {}
impl std::error::Error for TransitionError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<WriteError> for AppError {
    fn from(err: WriteError) -> Self {
        AppError::Write(err)
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Transition(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

impl From<crate::backends::camera::BackendError> for CameraError {
    fn from(err: crate::backends::camera::BackendError) -> Self {
        use crate::backends::camera::BackendError;
        match err {
            BackendError::DeviceNotFound(msg) => CameraError::Unavailable(msg),
            other => CameraError::BindFailed(other.to_string()),
        }
    }
}

impl From<crate::backends::camera::BackendError> for CaptureError {
    fn from(err: crate::backends::camera::BackendError) -> Self {
        use crate::backends::camera::BackendError;
        match err {
            BackendError::NotBound => CaptureError::NotBound,
            BackendError::CaptureFailed(msg) => CaptureError::Hardware(msg),
            other => CaptureError::Hardware(other.to_string()),
        }
    }
}
