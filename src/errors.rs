// SPDX-License-Identifier: MPL-2.0
// Error types prepared for future unified error handling
#![allow(dead_code)]

//! Error types for the capture session crate

use std::fmt;
use std::path::PathBuf;

/// Result type alias for session-level operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by the session manager
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Camera access was denied by the user
    AuthorizationDenied,
    /// The session could not be configured (missing input/output)
    ConfigurationFailed(String),
    /// The session reported a runtime error
    Runtime(String),
    /// Exclusive device-configuration lock could not be acquired
    DeviceLockFailed(String),
    /// Backend-level error
    Backend(BackendError),
    /// Saving to the photo library failed
    Save(SaveError),
}

/// Errors reported by a capture backend
#[derive(Debug, Clone)]
pub enum BackendError {
    /// No device matching the requested media kind was found
    DeviceNotFound(String),
    /// The session refused the input
    CannotAddInput(String),
    /// The session refused the output
    CannotAddOutput(String),
    /// Input/output mutation attempted outside a configuration transaction
    NotConfiguring,
    /// Device configuration lock could not be acquired
    LockFailed(String),
    /// Recording could not be started or stopped
    Recording(String),
    /// Still image capture failed
    StillCapture(String),
    /// Any other backend failure
    Other(String),
}

/// Errors from the photo library save contract
#[derive(Debug, Clone)]
pub enum SaveError {
    /// The library denied write access
    NotAuthorized,
    /// The source file was missing or unreadable
    SourceMissing(PathBuf),
    /// Filesystem error while writing
    Io(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AuthorizationDenied => write!(f, "Camera access denied"),
            SessionError::ConfigurationFailed(msg) => {
                write!(f, "Session configuration failed: {}", msg)
            }
            SessionError::Runtime(msg) => write!(f, "Session runtime error: {}", msg),
            SessionError::DeviceLockFailed(msg) => {
                write!(f, "Could not lock device for configuration: {}", msg)
            }
            SessionError::Backend(e) => write!(f, "Backend error: {}", e),
            SessionError::Save(e) => write!(f, "Save error: {}", e),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::CannotAddInput(msg) => write!(f, "Cannot add input: {}", msg),
            BackendError::CannotAddOutput(msg) => write!(f, "Cannot add output: {}", msg),
            BackendError::NotConfiguring => {
                write!(f, "Mutation outside begin/commit configuration")
            }
            BackendError::LockFailed(msg) => write!(f, "Device lock failed: {}", msg),
            BackendError::Recording(msg) => write!(f, "Recording error: {}", msg),
            BackendError::StillCapture(msg) => write!(f, "Still capture error: {}", msg),
            BackendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::NotAuthorized => write!(f, "Photo library access not authorized"),
            SaveError::SourceMissing(path) => {
                write!(f, "Source file missing: {}", path.display())
            }
            SaveError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}
impl std::error::Error for BackendError {}
impl std::error::Error for SaveError {}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        SessionError::Backend(err)
    }
}

impl From<SaveError> for SessionError {
    fn from(err: SaveError) -> Self {
        SessionError::Save(err)
    }
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        SaveError::Io(err.to_string())
    }
}
