// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          CameraController           │
//! └──────────────────┬──────────────────┘
//!                    │
//! ┌──────────────────┴──────────────────┐
//! │            CaptureSession           │
//! │  ┌──────────────┐ ┌──────────────┐  │
//! │  │ Test pattern │ │ File source  │  │
//! │  └──────────────┘ └──────────────┘  │
//! └─────────────────────────────────────┘
//! ```
//!
//! - [`camera`]: camera backends, frame types and the capture session

pub mod camera;
