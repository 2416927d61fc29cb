// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! Heavy work (decode, rotate, encode) runs on the blocking pool so the
//! async side never stalls on pixel crunching.
//!
//! - [`photo`]: still photo decode and encoding

pub mod photo;
