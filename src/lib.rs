// SPDX-License-Identifier: MPL-2.0

//! avcam - capture session management for camera applications
//!
//! This library orchestrates a hardware capture pipeline: it configures
//! camera and microphone inputs plus movie/still outputs, drives the session
//! lifecycle state machine, records movies to unique temporary files, and
//! hands finished media to a photo library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: The session lifecycle state machine and its serial worker
//! - [`backends`]: Capture backend abstraction and the simulated backend
//! - [`services`]: Authorization, background-execution and photo library seams
//! - [`preview`]: The passive preview surface bound to a session
//! - [`storage`]: Directory-backed photo library
//! - [`config`]: User configuration handling
//!
//! All session mutations run on one serial worker in submission order; the
//! UI layer reads published state snapshots that may lag hardware state by a
//! scheduling hop.

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod preview;
pub mod services;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use preview::PreviewSurface;
pub use session::{CaptureSessionManager, SessionServices, SetupResult, UiSnapshot, UserAlert};
