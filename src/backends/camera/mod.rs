// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraController   │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← Exclusive binding owner, one capture in flight
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//! ┌──────────┐ ┌──────────┐
//! │TestPatt. │ │FileSource│
//! └──────────┘ └──────────┘
//! ```

pub mod file_source;
pub mod session;
pub mod test_pattern;
pub mod types;

pub use file_source::FileSourceBackend;
pub use session::CaptureSession;
pub use test_pattern::{BackendProbe, TestPatternBackend};
pub use types::*;

/// Camera backend trait
///
/// Calls are made from a blocking context; implementations may block while
/// waiting on hardware.
pub trait CameraBackend: Send {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Bind the given use-cases to a display lifecycle
    fn bind(&mut self, target: &DisplayTarget, use_cases: &[UseCase]) -> BackendResult<()>;

    /// Release the device binding. Must be safe to call when unbound.
    fn unbind(&mut self);

    /// Check if a binding is active
    fn is_bound(&self) -> bool;

    /// Issue a single hardware capture request and wait for its frame
    fn capture_frame(&mut self) -> BackendResult<CameraFrame>;
}
