// SPDX-License-Identifier: MPL-2.0

//! Session lifecycle state and published UI snapshots

/// Outcome of session setup.
///
/// The two failure variants are terminal: once set, every later session
/// operation becomes a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupResult {
    /// Configuration succeeded (or has not failed yet)
    #[default]
    Success,
    /// The user denied camera access
    CameraNotAuthorized,
    /// A required input or output could not be attached
    SessionConfigurationFailed,
}

impl SetupResult {
    pub fn is_success(self) -> bool {
        self == SetupResult::Success
    }
}

/// Session lifecycle state machine:
/// `Unconfigured → Configuring → {Running ↔ Interrupted} → Stopped`.
///
/// The terminal setup failures are reachable only from `Configuring` and are
/// tracked in [`SetupResult`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unconfigured,
    /// Inside the begin/commit configuration transaction; the only state in
    /// which inputs and outputs may be mutated
    Configuring,
    Running,
    Interrupted,
    Stopped,
}

impl SessionState {
    /// Whether the lifecycle permits moving to `next`
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Unconfigured, Configuring)
                | (Configuring, Running)
                | (Configuring, Stopped)
                | (Running, Interrupted)
                | (Running, Stopped)
                | (Running, Running)
                | (Interrupted, Running)
                | (Interrupted, Stopped)
                | (Stopped, Running)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unconfigured => "unconfigured",
            SessionState::Configuring => "configuring",
            SessionState::Running => "running",
            SessionState::Interrupted => "interrupted",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// Movie recording state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// User-facing conditions the UI layer should present.
///
/// Presentation itself (alerts, buttons) is not this crate's concern; these
/// are the inputs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAlert {
    /// Camera permission denied; direct the user to settings
    CameraNotAuthorized,
    /// Unable to capture media
    ConfigurationFailed,
    /// Resuming the interrupted session failed
    UnableToResume,
}

/// State snapshot published to the UI after every worker transition.
///
/// The UI thread only ever reads these; they may lag true hardware state by
/// one scheduling hop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    pub session_state: SessionState,
    pub setup_result: SetupResult,
    /// Whether the last start attempt left the session running
    pub session_running: bool,
    /// Whether a recording is in progress
    pub recording: bool,
    /// Record button affordance
    pub record_enabled: bool,
    /// Still-capture button affordance
    pub still_enabled: bool,
    /// Camera-switch button affordance (requires more than one camera)
    pub camera_switch_enabled: bool,
    /// "Tap to resume" affordance
    pub resume_visible: bool,
    /// "Camera unavailable" indicator
    pub camera_unavailable: bool,
    /// Latest alert-worthy condition, if any
    pub alert: Option<UserAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        use SessionState::*;
        assert!(Unconfigured.can_transition_to(Configuring));
        assert!(Configuring.can_transition_to(Running));
        assert!(Running.can_transition_to(Interrupted));
        assert!(Interrupted.can_transition_to(Running));
        assert!(Running.can_transition_to(Stopped));
        assert!(Stopped.can_transition_to(Running));

        assert!(!Unconfigured.can_transition_to(Running));
        assert!(!Stopped.can_transition_to(Configuring));
        assert!(!Interrupted.can_transition_to(Configuring));
    }

    #[test]
    fn default_snapshot_disables_controls() {
        let snapshot = UiSnapshot::default();
        assert!(!snapshot.record_enabled);
        assert!(!snapshot.still_enabled);
        assert!(!snapshot.camera_switch_enabled);
        assert!(!snapshot.resume_visible);
        assert!(!snapshot.camera_unavailable);
    }
}
