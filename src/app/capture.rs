// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture handler
//!
//! Capture → decode → free-space check → gallery write, with every outcome
//! reported to the state machine. Once accepted, a capture runs on its own
//! task and always reaches `PhotoSaved` or `Ready`.

use super::CameraController;
use crate::app::state::{CaptureEvent, CaptureState};
use crate::errors::{AppError, AppResult, WriteError};
use crate::storage::GalleryRecord;
use std::time::Duration;
use tracing::{debug, error, info, warn};

impl CameraController {
    /// Take a photo and save it to the gallery
    ///
    /// Only accepted in `Ready`; otherwise fails with a not-ready error and
    /// leaves the state untouched. Dropping the returned future does not
    /// cancel the capture.
    pub async fn take_picture(&self) -> AppResult<GalleryRecord> {
        self.apply(CaptureEvent::Capture)?;
        info!("Capturing photo...");

        let controller = self.clone();
        match tokio::spawn(async move { controller.run_capture().await }).await {
            Ok(result) => result,
            Err(e) => {
                let message = format!("capture task failed: {}", e);
                error!(error = %message, "Capture aborted");
                self.settle_aborted_capture(&message);
                Err(AppError::Other(message))
            }
        }
    }

    async fn run_capture(&self) -> AppResult<GalleryRecord> {
        let image = match self.session.capture().await {
            Ok(image) => image,
            Err(e) => {
                error!(error = %e, "Capture failed");
                self.apply(CaptureEvent::CaptureFailed(e.to_string()))?;
                return Err(e.into());
            }
        };

        self.apply(CaptureEvent::FrameDecoded)?;
        debug!(width = image.width(), height = image.height(), "Saving photo");

        if let Err(e) = self.writer.check_free_space() {
            warn!(error = %e, "Skipping save");
            self.apply(CaptureEvent::WriteFailed(e.to_string()))?;
            return Err(e.into());
        }

        let Some(record) = self.writer.save_async(image).await else {
            let e = WriteError::NoRecord;
            self.apply(CaptureEvent::WriteFailed(e.to_string()))?;
            return Err(AppError::Write(e));
        };

        let (_, generation) = self.apply_tracked(CaptureEvent::WriteSucceeded(record.clone()))?;
        self.delay_event(self.saved_display, CaptureEvent::ResumeTimeout(generation));

        Ok(record)
    }

    /// Move a capture whose task died back to `Ready`
    fn settle_aborted_capture(&self, message: &str) {
        let event = match self.state() {
            CaptureState::Taking => CaptureEvent::CaptureFailed(message.to_string()),
            CaptureState::Saving => CaptureEvent::WriteFailed(message.to_string()),
            _ => return,
        };
        if let Err(e) = self.apply(event) {
            debug!(error = %e, "Aborted capture already settled");
        }
    }

    /// Apply an event after a delay
    ///
    /// Rejections are expected here (the machine may have moved on) and are
    /// only logged.
    pub(crate) fn delay_event(&self, delay: Duration, event: CaptureEvent) {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let name = event.name();
            match controller.apply(event) {
                Ok(state) => debug!(event = name, %state, "Delayed event applied"),
                Err(e) => debug!(event = name, error = %e, "Delayed event dropped"),
            }
        });
    }

    /// Check if a new capture would be accepted right now
    pub fn can_capture(&self) -> bool {
        self.state() == CaptureState::Ready
    }
}
