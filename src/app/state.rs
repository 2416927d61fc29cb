// SPDX-License-Identifier: GPL-3.0-only

//! Capture state machine
//!
//! ```text
//! Idle --initialize--> Initializing
//! Idle --permissionDenied--> Idle
//! Initializing --deviceReady--> Ready
//! Initializing --deviceError--> Error
//! Ready --capture--> Taking
//! Taking --frameDecoded--> Saving
//! Taking --captureFailed--> Ready
//! Saving --writeSucceeded--> PhotoSaved
//! Saving --writeFailed--> Ready
//! PhotoSaved --resumeTimeout(current save)--> Ready
//! Error --retry--> Initializing
//! Idle|Ready|PhotoSaved|Error --release--> Idle
//! ```
//!
//! Rejected events leave the machine untouched.

use crate::errors::TransitionError;
use crate::storage::GalleryRecord;
use std::fmt;
use tracing::{debug, warn};

/// Capture pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// Camera not bound
    #[default]
    Idle,
    /// Binding the camera
    Initializing,
    /// Bound and accepting captures
    Ready,
    /// Hardware capture and decode in progress
    Taking,
    /// Writing the photo to the gallery
    Saving,
    /// Photo written; returns to ready after a short delay
    PhotoSaved,
    /// Camera could not be bound
    Error,
}

impl CaptureState {
    /// Check if a capture is currently in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, CaptureState::Taking | CaptureState::Saving)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle => "Idle",
            CaptureState::Initializing => "Initializing",
            CaptureState::Ready => "Ready",
            CaptureState::Taking => "Taking",
            CaptureState::Saving => "Saving",
            CaptureState::PhotoSaved => "PhotoSaved",
            CaptureState::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Initialize,
    /// Camera permission missing; records the message without binding
    PermissionDenied(String),
    DeviceReady,
    DeviceError(String),
    Capture,
    FrameDecoded,
    CaptureFailed(String),
    WriteSucceeded(GalleryRecord),
    WriteFailed(String),
    /// Ends the `PhotoSaved` period started by the save with this generation
    ResumeTimeout(u64),
    Retry,
    Release,
}

impl CaptureEvent {
    /// Short event name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            CaptureEvent::Initialize => "initialize",
            CaptureEvent::PermissionDenied(_) => "permissionDenied",
            CaptureEvent::DeviceReady => "deviceReady",
            CaptureEvent::DeviceError(_) => "deviceError",
            CaptureEvent::Capture => "capture",
            CaptureEvent::FrameDecoded => "frameDecoded",
            CaptureEvent::CaptureFailed(_) => "captureFailed",
            CaptureEvent::WriteSucceeded(_) => "writeSucceeded",
            CaptureEvent::WriteFailed(_) => "writeFailed",
            CaptureEvent::ResumeTimeout(_) => "resumeTimeout",
            CaptureEvent::Retry => "retry",
            CaptureEvent::Release => "release",
        }
    }
}

/// Observable view of the machine, published to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    /// Most recent user-facing error message
    pub message: Option<String>,
    /// Most recently saved photo
    pub last_record: Option<GalleryRecord>,
}

/// State machine with an explicit transition table
#[derive(Debug, Default)]
pub struct CaptureStateMachine {
    snapshot: CaptureSnapshot,
    /// Bumped on every successful save; a resume timeout only ends the
    /// `PhotoSaved` period carrying the same value
    saved_generation: u64,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.snapshot.state
    }

    pub fn snapshot(&self) -> &CaptureSnapshot {
        &self.snapshot
    }

    /// Generation of the most recent successful save
    pub fn saved_generation(&self) -> u64 {
        self.saved_generation
    }

    /// Apply an event
    ///
    /// On success returns the new state. A rejected event changes nothing.
    pub fn apply(&mut self, event: CaptureEvent) -> Result<CaptureState, TransitionError> {
        use CaptureEvent as E;
        use CaptureState as S;

        let from = self.snapshot.state;
        let (to, message) = match (from, event) {
            (S::Idle, E::Initialize) => (S::Initializing, None),
            (S::Idle, E::PermissionDenied(msg)) => (S::Idle, Some(msg)),
            (S::Initializing, E::DeviceReady) => (S::Ready, None),
            (S::Initializing, E::DeviceError(msg)) => (S::Error, Some(msg)),
            (S::Ready, E::Capture) => (S::Taking, None),
            (_, E::Capture) => {
                warn!(state = %from, "Capture rejected: not ready");
                return Err(TransitionError::NotReady(from));
            }
            (S::Taking, E::FrameDecoded) => (S::Saving, None),
            (S::Taking, E::CaptureFailed(msg)) => (S::Ready, Some(msg)),
            (S::Saving, E::WriteSucceeded(record)) => {
                self.snapshot.last_record = Some(record);
                self.saved_generation += 1;
                (S::PhotoSaved, None)
            }
            (S::Saving, E::WriteFailed(msg)) => (S::Ready, Some(msg)),
            (S::PhotoSaved, E::ResumeTimeout(generation))
                if generation == self.saved_generation =>
            {
                (S::Ready, None)
            }
            (S::Error, E::Retry) => (S::Initializing, None),
            (S::Idle | S::Ready | S::PhotoSaved | S::Error, E::Release) => (S::Idle, None),
            (state, event) => {
                debug!(%state, event = event.name(), "Transition rejected");
                return Err(TransitionError::invalid(state, &event));
            }
        };

        // A new attempt clears the previous message; failures set it.
        match message {
            Some(msg) => self.snapshot.message = Some(msg),
            None if matches!(to, S::Initializing | S::Taking) => self.snapshot.message = None,
            None => {}
        }

        self.snapshot.state = to;
        debug!(from = %from, to = %to, "State transition");
        Ok(to)
    }
}
