// SPDX-License-Identifier: MPL-2.0

//! Capture backend abstraction
//!
//! A backend wraps the platform capture service: device enumeration, the
//! session configuration transaction, recording and still sinks, and the
//! device-configuration lock. All asynchronous callbacks are delivered as
//! [`BackendEvent`] values over a channel handed to the backend at
//! construction.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ CaptureSessionManager│  ← Lifecycle state machine, UI snapshots
//! └──────────┬───────────┘
//!            │ (serial session worker, FIFO)
//!            ▼
//! ┌──────────────────────┐
//! │ CaptureBackend Trait │  ← Common interface
//! └──────────┬───────────┘
//!            │
//!            ▼
//!      ┌───────────┐
//!      │ Simulated │  ← Concrete implementation (in-memory devices)
//!      └───────────┘
//! ```

pub mod sim;
pub mod types;

pub use types::*;

use crate::errors::BackendResult;
use std::path::Path;

/// Complete capture backend trait
///
/// The session worker is the only caller; implementations are driven from a
/// single task and never concurrently.
pub trait CaptureBackend: Send + 'static {
    // ===== Enumeration =====

    /// Enumerate devices producing the given media kind
    fn devices(&self, kind: MediaKind) -> Vec<DeviceDescriptor>;

    // ===== Configuration transaction =====

    /// Open a configuration transaction.
    ///
    /// Input/output mutations are only legal between `begin_configuration`
    /// and `commit_configuration`; the hardware pipeline observes the
    /// committed state atomically.
    fn begin_configuration(&mut self);

    /// Commit the open configuration transaction
    fn commit_configuration(&mut self);

    /// Whether the session would accept this device as an input
    fn can_add_input(&self, device: &DeviceDescriptor) -> bool;

    /// Attach a device as an input
    ///
    /// # Returns
    /// * `Ok(InputId)` - Handle for later removal
    /// * `Err(BackendError)` - The session refused the input, or no
    ///   transaction is open
    fn add_input(&mut self, device: &DeviceDescriptor) -> BackendResult<InputId>;

    /// Detach an input
    fn remove_input(&mut self, input: InputId) -> BackendResult<()>;

    /// Whether the session would accept an output of this kind
    fn can_add_output(&self, kind: OutputKind) -> bool;

    /// Attach an output (sink) of the given kind
    fn add_output(&mut self, kind: OutputKind) -> BackendResult<()>;

    /// Enable video stabilization on the movie output connection, if the
    /// device supports it
    fn set_stabilization(&mut self, enabled: bool);

    /// Apply a video orientation to an output connection
    fn set_output_orientation(&mut self, kind: OutputKind, orientation: VideoOrientation);

    // ===== Running =====

    /// Start the session.
    ///
    /// Returns whether the session is running afterwards. A failed start is
    /// also communicated via a [`BackendEvent::RuntimeError`], matching the
    /// platform contract.
    fn start_running(&mut self) -> bool;

    /// Stop the session
    fn stop_running(&mut self);

    /// Whether the session is currently running
    fn is_running(&self) -> bool;

    // ===== Recording =====

    /// Start recording to the given path.
    ///
    /// Once accepted, the sink always produces a `RecordingStarted` event and
    /// eventually exactly one `RecordingFinished` event for this path; there
    /// is no cancellation.
    fn start_recording(&mut self, path: &Path) -> BackendResult<()>;

    /// Request that the active recording stop.
    ///
    /// Completion is signaled solely by the `RecordingFinished` event.
    fn stop_recording(&mut self);

    // ===== Still capture =====

    /// Capture a still image asynchronously.
    ///
    /// The encoded JPEG bytes (or the failure) arrive as a
    /// [`BackendEvent::StillCaptured`] event.
    fn capture_still(&mut self) -> BackendResult<()>;

    // ===== Device configuration =====

    /// Capabilities of the current video device
    fn capabilities(&self) -> DeviceCapabilities;

    /// Acquire the exclusive device-configuration lock.
    ///
    /// Failure is recoverable; callers log and skip the operation.
    fn lock_device_for_configuration(&mut self) -> BackendResult<()>;

    /// Release the device-configuration lock
    fn unlock_device(&mut self);

    /// Set the focus mode and point of interest (requires the lock)
    fn set_focus(&mut self, mode: FocusMode, point: PointOfInterest);

    /// Set the exposure mode and point of interest (requires the lock)
    fn set_exposure(&mut self, mode: ExposureMode, point: PointOfInterest);

    /// Set the flash mode, if the device has a flash
    fn set_flash(&mut self, mode: FlashMode);

    /// Enable or disable subject-area-change monitoring on the current
    /// video device
    fn set_subject_area_monitoring(&mut self, enabled: bool);
}
