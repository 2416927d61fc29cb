// SPDX-License-Identifier: GPL-3.0-only

//! Camera binding operations (initialize, retry, release)

use super::{CameraController, PermissionStatus};
use crate::app::state::CaptureEvent;
use crate::backends::camera::DisplayTarget;
use crate::errors::{AppError, AppResult, CameraError};
use tracing::{error, info, warn};

impl CameraController {
    /// Bind the camera to a display
    ///
    /// Only valid from `Idle`. Denied permission never reaches the device;
    /// its message is published and the state stays `Idle`.
    pub async fn initialize(
        &self,
        target: DisplayTarget,
        permission: PermissionStatus,
    ) -> AppResult<()> {
        if permission == PermissionStatus::Denied {
            let e = CameraError::PermissionDenied;
            warn!(error = %e, "Camera initialization blocked");
            self.apply(CaptureEvent::PermissionDenied(e.to_string()))?;
            return Err(e.into());
        }

        self.apply(CaptureEvent::Initialize)?;
        self.spawn_bind(target).await
    }

    /// Retry binding after a device error
    pub async fn retry(&self, target: DisplayTarget) -> AppResult<()> {
        self.apply(CaptureEvent::Retry)?;
        info!(display_id = target.id, "Retrying camera initialization");
        self.spawn_bind(target).await
    }

    /// Release the camera when the owning display context ends
    ///
    /// Rejected while initializing or while a capture is in flight.
    pub fn release(&self) -> AppResult<()> {
        self.apply(CaptureEvent::Release)?;
        self.session.release();
        Ok(())
    }

    /// Bind on a detached task so `Initializing` always reaches `Ready` or
    /// `Error`, even if the caller stops waiting.
    async fn spawn_bind(&self, target: DisplayTarget) -> AppResult<()> {
        let controller = self.clone();
        match tokio::spawn(async move { controller.bind_device(target).await }).await {
            Ok(result) => result,
            Err(e) => {
                let e = CameraError::BindFailed(format!("bind task failed: {}", e));
                error!(error = %e, "Camera initialization aborted");
                self.apply(CaptureEvent::DeviceError(e.to_string()))?;
                Err(AppError::Camera(e))
            }
        }
    }

    /// Run the bind off the async executor and report the outcome
    async fn bind_device(&self, target: DisplayTarget) -> AppResult<()> {
        let session = self.session.clone();
        let result = tokio::task::spawn_blocking(move || session.initialize(&target))
            .await
            .unwrap_or_else(|e| Err(CameraError::BindFailed(format!("bind task failed: {}", e))));

        match result {
            Ok(()) => {
                self.apply(CaptureEvent::DeviceReady)?;
                info!(display_id = target.id, "Camera ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, display_id = target.id, "Camera initialization failed");
                self.apply(CaptureEvent::DeviceError(e.to_string()))?;
                Err(e.into())
            }
        }
    }
}
