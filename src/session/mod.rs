// SPDX-License-Identifier: MPL-2.0

//! Capture session lifecycle
//!
//! The session is driven by a single serial worker that owns all hardware
//! state; the manager is the cloneable handle the rest of the application
//! uses. State flows one way: commands and backend events in, published
//! [`UiSnapshot`]s out.
//!
//! Lifecycle: `Unconfigured → Configuring → {Running ↔ Interrupted} →
//! Stopped`, with `CameraNotAuthorized` and `SessionConfigurationFailed` as
//! terminal setup results.

pub mod manager;
pub mod recording;
pub mod state;
pub mod worker;

pub use manager::CaptureSessionManager;
pub use recording::RecordingSession;
pub use state::{RecordingState, SessionState, SetupResult, UiSnapshot, UserAlert};
pub use worker::SessionServices;
