// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! Ties the capture session, the gallery writer and the state machine
//! together. The UI layer drives it with `initialize`, `take_picture`,
//! `retry` and `release`, and observes it through watch channels:
//!
//! - [`CameraController::subscribe`]: state, last error message, last photo
//! - [`CameraController::advice`]: advisory text (reserved, never populated)

mod camera_ops;
mod capture;
pub mod state;

pub use state::{CaptureEvent, CaptureSnapshot, CaptureState, CaptureStateMachine};

use crate::backends::camera::{CameraBackend, CaptureSession};
use crate::config::Config;
use crate::errors::TransitionError;
use crate::pipelines::photo::encoding::PhotoEncoder;
use crate::storage::{DirectoryMediaStore, GalleryRecord, GalleryWriter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Camera permission as reported by the permission layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Capture controller
///
/// Cheap to clone; clones share the same session and state machine.
#[derive(Clone)]
pub struct CameraController {
    machine: Arc<Mutex<CaptureStateMachine>>,
    session: CaptureSession,
    writer: GalleryWriter,
    snapshot_tx: Arc<watch::Sender<CaptureSnapshot>>,
    advice_tx: Arc<watch::Sender<Option<String>>>,
    saved_display: Duration,
}

impl CameraController {
    /// Create a controller writing into the configured gallery directory
    pub fn new(backend: Box<dyn CameraBackend>, config: &Config) -> Self {
        let store = Arc::new(DirectoryMediaStore::new(config.gallery_dir()));
        let encoder = PhotoEncoder::with_settings(config.photo_output_format, config.photo_quality);
        let writer = GalleryWriter::new(store, encoder, config.min_free_space_bytes);

        Self::with_parts(
            CaptureSession::new(backend),
            writer,
            config.photo_saved_display(),
        )
    }

    /// Create a controller from already-built parts
    pub fn with_parts(
        session: CaptureSession,
        writer: GalleryWriter,
        saved_display: Duration,
    ) -> Self {
        info!(
            gallery = %writer.location().display(),
            saved_display_ms = saved_display.as_millis() as u64,
            "Creating camera controller"
        );

        let (snapshot_tx, _) = watch::channel(CaptureSnapshot::default());
        let (advice_tx, _) = watch::channel(None);

        Self {
            machine: Arc::new(Mutex::new(CaptureStateMachine::new())),
            session,
            writer,
            snapshot_tx: Arc::new(snapshot_tx),
            advice_tx: Arc::new(advice_tx),
            saved_display,
        }
    }

    fn machine(&self) -> MutexGuard<'_, CaptureStateMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an event and publish the resulting snapshot
    pub(crate) fn apply(&self, event: CaptureEvent) -> Result<CaptureState, TransitionError> {
        self.apply_tracked(event).map(|(state, _)| state)
    }

    /// Like [`CameraController::apply`], also returning the saved-photo
    /// generation observed under the same lock
    pub(crate) fn apply_tracked(
        &self,
        event: CaptureEvent,
    ) -> Result<(CaptureState, u64), TransitionError> {
        let mut machine = self.machine();
        let state = machine.apply(event)?;
        self.snapshot_tx.send_replace(machine.snapshot().clone());
        Ok((state, machine.saved_generation()))
    }

    /// Current state
    pub fn state(&self) -> CaptureState {
        self.machine().state()
    }

    /// Current snapshot (state, message, last photo)
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.machine().snapshot().clone()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Advisory text channel (reserved for photo advice, never populated)
    pub fn advice(&self) -> watch::Receiver<Option<String>> {
        self.advice_tx.subscribe()
    }

    /// The capture session
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// The gallery writer
    pub fn gallery(&self) -> &GalleryWriter {
        &self.writer
    }

    /// Most recent photo in the gallery
    pub async fn latest_photo(&self) -> Option<GalleryRecord> {
        self.writer.latest().await
    }
}
