// SPDX-License-Identifier: GPL-3.0-only

//! Pocket Camera - still photo capture core
//!
//! Binds a camera to a display, captures a single frame on request,
//! decodes and rotates it, then writes it to the gallery while a small
//! state machine reports progress to the UI layer.
//!
//! # Architecture
//!
//! - [`app`]: capture controller and state machine
//! - [`backends`]: camera backends and the capture session
//! - [`pipelines`]: frame decode and photo encoding
//! - [`storage`]: media store and gallery writer
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! let controller = CameraController::new(Box::new(TestPatternBackend::new()), &Config::default());
//! controller.initialize(DisplayTarget::new(1, 640, 480), PermissionStatus::Granted).await?;
//! let record = controller.take_picture().await?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{CameraController, CaptureEvent, CaptureSnapshot, CaptureState, PermissionStatus};
pub use backends::camera::{CaptureSession, DisplayTarget};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use storage::{GalleryRecord, GalleryWriter};
