// SPDX-License-Identifier: MPL-2.0

//! Shared types for capture backends

use crate::errors::BackendError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of media a device produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// Video (camera) devices
    Video,
    /// Audio (microphone) devices
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Physical mounting position of a camera device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DevicePosition {
    /// Position unknown or not applicable (e.g., microphones)
    #[default]
    Unspecified,
    /// Front-facing (user-facing) camera
    Front,
    /// Back-facing (world-facing) camera
    Back,
}

impl DevicePosition {
    /// Position preferred when toggling away from this one.
    ///
    /// Unspecified and Front both map to Back; Back maps to Front.
    pub fn toggled(self) -> DevicePosition {
        match self {
            DevicePosition::Unspecified | DevicePosition::Front => DevicePosition::Back,
            DevicePosition::Back => DevicePosition::Front,
        }
    }
}

impl std::fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevicePosition::Unspecified => write!(f, "unspecified"),
            DevicePosition::Front => write!(f, "front"),
            DevicePosition::Back => write!(f, "back"),
        }
    }
}

/// A capture device as reported by backend enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Stable backend-specific identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Media kind the device produces
    pub kind: MediaKind,
    /// Mounting position (Unspecified for audio devices)
    pub position: DevicePosition,
}

/// Identifier for an input attached to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputId(pub u64);

/// Kind of output (sink) attached to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Movie file writer
    MovieFile,
    /// Still-image encoder (JPEG)
    StillImage,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputKind::MovieFile => write!(f, "movie file"),
            OutputKind::StillImage => write!(f, "still image"),
        }
    }
}

/// Video orientation applied to output connections before capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Focus mode applied via the device-configuration lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Focus is fixed
    Locked,
    /// Single autofocus operation at the point of interest
    Auto,
    /// Continuous autofocus
    ContinuousAuto,
}

/// Exposure mode applied via the device-configuration lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    /// Exposure is fixed
    Locked,
    /// Single auto-exposure operation at the point of interest
    Auto,
    /// Continuous auto-exposure
    ContinuousAuto,
}

/// Flash mode for a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    Off,
    On,
    Auto,
}

/// Normalized point of interest in device coordinates (0.0..=1.0 on both axes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOfInterest {
    pub x: f32,
    pub y: f32,
}

impl PointOfInterest {
    /// Center of the frame
    pub fn center() -> Self {
        let (x, y) = crate::constants::CENTER_POINT;
        Self { x, y }
    }
}

/// What the current video device supports.
///
/// Focus and exposure are independent: a device may support point-of-interest
/// focus without point-of-interest exposure, and vice versa.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceCapabilities {
    pub focus_point_of_interest: bool,
    pub exposure_point_of_interest: bool,
    pub flash: bool,
    pub stabilization: bool,
}

/// Why the session was interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionReason {
    /// Another client took the audio device (e.g., music playback started)
    AudioDeviceInUseByAnotherClient,
    /// Another client took the video device
    VideoDeviceInUseByAnotherClient,
    /// The video device is claimed by another foreground app (multi-app layout)
    VideoDeviceNotAvailableWithMultipleForegroundApps,
}

impl InterruptionReason {
    /// Whether the user may attempt to resume the session while interrupted.
    ///
    /// Device-in-use interruptions are resumable (resuming reclaims the
    /// device); multi-app unavailability is not, and clears only when the
    /// interruption ends.
    pub fn is_resumable(self) -> bool {
        !matches!(
            self,
            InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps
        )
    }
}

impl std::fmt::Display for InterruptionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterruptionReason::AudioDeviceInUseByAnotherClient => {
                write!(f, "audio device in use by another client")
            }
            InterruptionReason::VideoDeviceInUseByAnotherClient => {
                write!(f, "video device in use by another client")
            }
            InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps => {
                write!(f, "video device not available with multiple foreground apps")
            }
        }
    }
}

/// Cause attached to a session runtime error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorCause {
    /// The media services backing the session were reset; the session may be
    /// restarted automatically if it had been running
    MediaServicesReset,
    /// Any other runtime failure
    Other(String),
}

impl std::fmt::Display for RuntimeErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeErrorCause::MediaServicesReset => write!(f, "media services were reset"),
            RuntimeErrorCause::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Asynchronous events a backend delivers to the session worker.
///
/// One tagged union over a channel, keyed by variant; backends never deliver
/// callbacks by name or by opaque context pointer.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// The session hit a runtime error
    RuntimeError(RuntimeErrorCause),
    /// The session was interrupted
    Interrupted(InterruptionReason),
    /// The interruption ended and the session resumed on its own
    InterruptionEnded,
    /// The monitored device observed a significant subject-area change
    SubjectAreaChanged,
    /// The movie sink began writing the file
    RecordingStarted { path: PathBuf },
    /// The movie sink finished; sole authority for "recording has finished"
    RecordingFinished {
        path: PathBuf,
        result: Result<(), BackendError>,
    },
    /// Still capture completed with encoded JPEG bytes, or failed
    StillCaptured {
        result: Result<Vec<u8>, BackendError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_toggle() {
        assert_eq!(DevicePosition::Unspecified.toggled(), DevicePosition::Back);
        assert_eq!(DevicePosition::Front.toggled(), DevicePosition::Back);
        assert_eq!(DevicePosition::Back.toggled(), DevicePosition::Front);
    }

    #[test]
    fn multi_app_interruption_is_not_resumable() {
        assert!(InterruptionReason::AudioDeviceInUseByAnotherClient.is_resumable());
        assert!(InterruptionReason::VideoDeviceInUseByAnotherClient.is_resumable());
        assert!(
            !InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps.is_resumable()
        );
    }
}
