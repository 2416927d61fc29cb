// SPDX-License-Identifier: GPL-3.0-only

//! Capture session
//!
//! The session is the exclusive owner of the camera binding:
//! - `initialize` rebinds preview + capture use-cases (last caller wins)
//! - `capture` issues one hardware request and resolves it through a oneshot
//! - `release` unbinds; it is idempotent and also runs when the last handle drops

use super::CameraBackend;
use super::types::*;
use crate::errors::{CameraError, CaptureError};
use crate::pipelines::photo::codec::{DecodedImage, FrameCodec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Use-cases bound on every initialization
const SESSION_USE_CASES: [UseCase; 2] = [UseCase::Preview, UseCase::ImageCapture];

/// State shared by every session handle
///
/// Lock order is `backend` then `binding`. The binding lock is only ever
/// held briefly, so status queries never wait on hardware.
struct SessionInner {
    backend: Mutex<Box<dyn CameraBackend>>,
    binding: Mutex<Option<DisplayTarget>>,
    backend_name: String,
    in_flight: AtomicBool,
}

impl SessionInner {
    fn backend(&self) -> MutexGuard<'_, Box<dyn CameraBackend>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn binding(&self) -> MutexGuard<'_, Option<DisplayTarget>> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unbind with the backend lock already held
    fn unbind(&self, backend: &mut dyn CameraBackend) -> bool {
        let Some(target) = self.binding().take() else {
            return false;
        };
        backend.unbind();
        info!(display_id = target.id, backend = %self.backend_name, "Camera unbound");
        true
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let binding = self
            .binding
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(target) = binding {
            self.backend
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .unbind();
            info!(display_id = target.id, backend = %self.backend_name, "Camera unbound on drop");
        }
    }
}

/// Clears the in-flight flag when a capture completes or is abandoned
struct InFlightGuard(Arc<SessionInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Camera capture session
///
/// Cheap to clone; all clones share one binding. `initialize` and `release`
/// wait for an in-flight hardware request to finish; status queries
/// (`is_bound`, `display`, `is_capturing`) never do.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<SessionInner>,
}

impl CaptureSession {
    /// Create a session owning the given backend
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        let backend_name = backend.name().to_string();
        info!(backend = %backend_name, "Creating capture session");
        Self {
            inner: Arc::new(SessionInner {
                backend: Mutex::new(backend),
                binding: Mutex::new(None),
                backend_name,
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Bind preview and capture use-cases to `target`
    ///
    /// Any previous binding is released first, whoever made it.
    pub fn initialize(&self, target: &DisplayTarget) -> Result<(), CameraError> {
        let mut backend = self.inner.backend();

        if self.inner.unbind(&mut **backend) {
            debug!("Released previous binding before rebinding");
        }

        backend.bind(target, &SESSION_USE_CASES).map_err(|e| {
            error!(error = %e, display_id = target.id, "Camera bind failed");
            CameraError::from(e)
        })?;

        *self.inner.binding() = Some(*target);
        info!(
            display_id = target.id,
            surface_width = target.surface_width,
            surface_height = target.surface_height,
            backend = %self.inner.backend_name,
            "Camera bound"
        );
        Ok(())
    }

    /// Capture and decode one photo
    ///
    /// The hardware request runs on the blocking pool. Overlapping calls are
    /// rejected with [`CaptureError::Busy`].
    pub async fn capture(&self) -> Result<DecodedImage, CaptureError> {
        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Capture rejected: another capture is in flight");
            return Err(CaptureError::Busy);
        }
        let _in_flight = InFlightGuard(Arc::clone(&self.inner));

        if !self.is_bound() {
            return Err(CaptureError::NotBound);
        }

        let (sender, receiver) = oneshot::channel();
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let frame = {
                let mut backend = inner.backend();
                if inner.binding().is_none() {
                    Err(BackendError::NotBound)
                } else {
                    backend.capture_frame()
                }
            };

            let outcome = match frame {
                Ok(frame) => {
                    debug!(
                        width = frame.width,
                        height = frame.height,
                        format = ?frame.format,
                        "Frame captured"
                    );
                    Ok(FrameCodec::decode(frame))
                }
                Err(e) => {
                    error!(error = %e, "Hardware capture failed");
                    Err(CaptureError::from(e))
                }
            };

            if sender.send(outcome).is_err() {
                debug!("Capture result dropped: requester went away");
            }
        });

        receiver.await.map_err(|_| CaptureError::CallbackDropped)?
    }

    /// Release the camera binding. Safe to call repeatedly or when never bound.
    pub fn release(&self) {
        let mut backend = self.inner.backend();
        if !self.inner.unbind(&mut **backend) {
            debug!("Release requested on unbound session");
        }
    }

    /// Check if a binding is active
    pub fn is_bound(&self) -> bool {
        self.inner.binding().is_some()
    }

    /// Check if a capture is outstanding
    pub fn is_capturing(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Display the camera is currently bound to
    pub fn display(&self) -> Option<DisplayTarget> {
        *self.inner.binding()
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &str {
        &self.inner.backend_name
    }
}
