// SPDX-License-Identifier: MPL-2.0

//! External collaborator seams
//!
//! The session manager depends on three host services, each behind a trait:
//!
//! - [`authorization`]: media access prompts (camera/microphone permission)
//! - [`background`]: short-lived background-execution tokens
//! - [`photo_library`]: the save(data|file) contract for captured media

pub mod authorization;
pub mod background;
pub mod photo_library;

pub use authorization::{AccessStatus, AlwaysAuthorized, AuthorizationService};
pub use background::{BackgroundExecutor, NoBackgrounding, TaskId};
pub use photo_library::PhotoLibrary;
