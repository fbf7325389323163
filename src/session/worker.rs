// SPDX-License-Identifier: MPL-2.0

//! The serial session worker
//!
//! One tokio task owns the backend and all session state. Commands from the
//! UI layer and events from the backend land in a single FIFO queue and are
//! processed one at a time, in submission order; the worker is the only
//! writer of session, input and output state. After every transition it
//! publishes a [`UiSnapshot`] over a watch channel, so UI state may lag
//! hardware state by one scheduling hop.

use super::recording::RecordingSession;
use super::state::{RecordingState, SessionState, SetupResult, UiSnapshot, UserAlert};
use crate::backends::{
    BackendEvent, CaptureBackend, DeviceDescriptor, DevicePosition, ExposureMode, FlashMode,
    FocusMode, InputId, InterruptionReason, MediaKind, OutputKind, PointOfInterest,
    RuntimeErrorCause, VideoOrientation,
};
use crate::config::Config;
use crate::services::{AccessStatus, AuthorizationService, BackgroundExecutor, PhotoLibrary};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

/// User-initiated operations, submitted in FIFO order
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Initialize,
    Start,
    Stop,
    ToggleRecording,
    ChangeCamera,
    CaptureStill,
    Focus {
        focus_mode: FocusMode,
        exposure_mode: ExposureMode,
        point: PointOfInterest,
        monitor_subject_area: bool,
    },
    ResumeInterrupted,
    /// FIFO barrier: acknowledged once every previously submitted message
    /// has been processed
    Flush(oneshot::Sender<()>),
}

/// Everything the worker dequeues: commands and backend events share one
/// queue, so their relative order is the order they occurred
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Command(SessionCommand),
    Event(BackendEvent),
}

/// Collaborator services handed to the worker at construction
pub struct SessionServices {
    pub authorization: Box<dyn AuthorizationService>,
    pub background: Box<dyn BackgroundExecutor>,
    pub library: Box<dyn PhotoLibrary>,
}

impl Default for SessionServices {
    fn default() -> Self {
        Self {
            authorization: Box::new(crate::services::AlwaysAuthorized),
            background: Box::new(crate::services::NoBackgrounding),
            library: Box::new(crate::storage::DirectoryLibrary::at_default_dirs()),
        }
    }
}

pub(crate) struct SessionWorker {
    backend: Box<dyn CaptureBackend>,
    services: SessionServices,
    config: Config,
    preview_orientation: Arc<Mutex<VideoOrientation>>,

    rx: mpsc::UnboundedReceiver<WorkerMessage>,
    snapshots: watch::Sender<UiSnapshot>,
    snapshot: UiSnapshot,

    state: SessionState,
    setup_result: SetupResult,
    /// Whether the last start attempt left the session running; gates the
    /// media-services-reset auto-restart
    session_running: bool,
    /// Whether lifecycle notifications are being handled (attached by
    /// `start`, detached by `stop`)
    events_attached: bool,
    video_input: Option<(InputId, DeviceDescriptor)>,
    recording_state: RecordingState,
    recording: Option<RecordingSession>,
}

impl SessionWorker {
    pub(crate) fn new(
        backend: Box<dyn CaptureBackend>,
        services: SessionServices,
        config: Config,
        preview_orientation: Arc<Mutex<VideoOrientation>>,
        rx: mpsc::UnboundedReceiver<WorkerMessage>,
        snapshots: watch::Sender<UiSnapshot>,
    ) -> Self {
        Self {
            backend,
            services,
            config,
            preview_orientation,
            rx,
            snapshots,
            snapshot: UiSnapshot::default(),
            state: SessionState::Unconfigured,
            setup_result: SetupResult::Success,
            session_running: false,
            events_attached: false,
            video_input: None,
            recording_state: RecordingState::Idle,
            recording: None,
        }
    }

    /// Drain the queue until every sender is gone
    pub(crate) async fn run(mut self) {
        debug!("session worker started");
        while let Some(message) = self.rx.recv().await {
            match message {
                WorkerMessage::Command(command) => self.handle_command(command).await,
                WorkerMessage::Event(event) => self.handle_event(event).await,
            }
            self.publish();
        }
        debug!("session worker exiting");
    }

    fn publish(&mut self) {
        self.snapshot.session_state = self.state;
        self.snapshot.setup_result = self.setup_result;
        self.snapshot.session_running = self.session_running;
        self.snapshot.recording = self.recording_state == RecordingState::Recording;
        self.snapshots.send_replace(self.snapshot.clone());
    }

    fn transition(&mut self, next: SessionState) {
        if self.state.can_transition_to(next) {
            debug!(from = %self.state, to = %next, "session state transition");
            self.state = next;
        } else {
            warn!(from = %self.state, to = %next, "illegal session state transition ignored");
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        // Terminal setup results absorb everything except the barrier.
        if !self.setup_result.is_success() {
            match command {
                SessionCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
                SessionCommand::Start => self.surface_setup_failure(),
                other => debug!(command = ?other, "ignored after terminal setup result"),
            }
            return;
        }

        match command {
            SessionCommand::Initialize => self.initialize().await,
            SessionCommand::Start => self.start(),
            SessionCommand::Stop => self.stop(),
            SessionCommand::ToggleRecording => self.toggle_recording(),
            SessionCommand::ChangeCamera => self.change_camera(),
            SessionCommand::CaptureStill => self.capture_still(),
            SessionCommand::Focus {
                focus_mode,
                exposure_mode,
                point,
                monitor_subject_area,
            } => self.focus(focus_mode, exposure_mode, point, monitor_subject_area),
            SessionCommand::ResumeInterrupted => self.resume_interrupted(),
            SessionCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    // ===== Setup =====

    async fn initialize(&mut self) {
        if self.state != SessionState::Unconfigured {
            warn!(state = %self.state, "initialize called on a configured session");
            return;
        }

        // Video access is required, audio access optional. While the prompt
        // is unresolved nothing else runs: awaiting here suspends the whole
        // FIFO queue.
        match self.services.authorization.status(MediaKind::Video) {
            AccessStatus::Authorized => {
                debug!("camera access previously granted");
            }
            AccessStatus::NotDetermined => {
                info!("requesting camera access");
                let granted = self
                    .services
                    .authorization
                    .request_access(MediaKind::Video)
                    .await;
                if !granted {
                    self.setup_result = SetupResult::CameraNotAuthorized;
                }
            }
            AccessStatus::Denied => {
                self.setup_result = SetupResult::CameraNotAuthorized;
            }
        }

        if self.setup_result == SetupResult::CameraNotAuthorized {
            info!("camera not authorized, session setup aborted");
            return;
        }

        self.configure_session();
    }

    /// Attach inputs and outputs inside a single configuration transaction
    fn configure_session(&mut self) {
        self.transition(SessionState::Configuring);
        self.backend.begin_configuration();

        // Video input: preferred position, falling back to the first camera.
        let video_device = self.pick_camera(self.config.preferred_position);
        match video_device {
            Some(device) if self.backend.can_add_input(&device) => {
                match self.backend.add_input(&device) {
                    Ok(id) => {
                        info!(device = %device.name, "video input configured");
                        self.video_input = Some((id, device));
                    }
                    Err(e) => {
                        error!(error = %e, "could not add video device input to the session");
                        self.setup_result = SetupResult::SessionConfigurationFailed;
                    }
                }
            }
            Some(device) => {
                error!(device = %device.name, "session refused the video device input");
                self.setup_result = SetupResult::SessionConfigurationFailed;
            }
            None => {
                error!("no video capture device available");
                self.setup_result = SetupResult::SessionConfigurationFailed;
            }
        }

        // Audio input is best-effort: failure is logged, not fatal.
        if self.config.enable_audio {
            match self.backend.devices(MediaKind::Audio).into_iter().next() {
                Some(device) if self.backend.can_add_input(&device) => {
                    if let Err(e) = self.backend.add_input(&device) {
                        warn!(error = %e, "could not add audio device input to the session");
                    }
                }
                _ => warn!("could not add audio device input to the session"),
            }
        }

        // Outputs only make sense with a video input attached; skipping them
        // keeps the committed configuration free of orphaned sinks.
        if self.video_input.is_some() {
            if self.backend.can_add_output(OutputKind::MovieFile) {
                match self.backend.add_output(OutputKind::MovieFile) {
                    Ok(()) => {
                        if self.backend.capabilities().stabilization {
                            self.backend.set_stabilization(true);
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "could not add movie file output to the session");
                        self.setup_result = SetupResult::SessionConfigurationFailed;
                    }
                }
            } else {
                error!("could not add movie file output to the session");
                self.setup_result = SetupResult::SessionConfigurationFailed;
            }

            if self.backend.can_add_output(OutputKind::StillImage) {
                if let Err(e) = self.backend.add_output(OutputKind::StillImage) {
                    error!(error = %e, "could not add still image output to the session");
                    self.setup_result = SetupResult::SessionConfigurationFailed;
                }
            } else {
                error!("could not add still image output to the session");
                self.setup_result = SetupResult::SessionConfigurationFailed;
            }
        }

        self.backend.commit_configuration();
    }

    fn pick_camera(&self, preferred: DevicePosition) -> Option<DeviceDescriptor> {
        let devices = self.backend.devices(MediaKind::Video);
        devices
            .iter()
            .find(|d| d.position == preferred)
            .cloned()
            .or_else(|| devices.into_iter().next())
    }

    fn surface_setup_failure(&mut self) {
        self.snapshot.alert = Some(match self.setup_result {
            SetupResult::CameraNotAuthorized => UserAlert::CameraNotAuthorized,
            _ => UserAlert::ConfigurationFailed,
        });
    }

    // ===== Running =====

    fn start(&mut self) {
        self.events_attached = true;
        let started = self.backend.start_running();
        self.session_running = started && self.backend.is_running();
        if self.session_running {
            self.transition(SessionState::Running);
        }
        self.update_control_affordances();
    }

    fn stop(&mut self) {
        self.backend.stop_running();
        self.events_attached = false;
        self.session_running = false;
        self.transition(SessionState::Stopped);
        self.update_control_affordances();
    }

    /// Controls are enabled if and only if the session is running
    fn update_control_affordances(&mut self) {
        let running = self.session_running;
        self.snapshot.record_enabled = running && self.recording_state == RecordingState::Idle;
        self.snapshot.still_enabled = running;
        self.snapshot.camera_switch_enabled =
            running && self.backend.devices(MediaKind::Video).len() > 1;
    }

    // ===== Recording =====

    fn toggle_recording(&mut self) {
        match self.recording_state {
            RecordingState::Idle => self.start_recording(),
            RecordingState::Recording => {
                // Completion is signaled solely by the finish callback; the
                // stop affordance stays disabled until it arrives.
                info!("stopping movie recording");
                self.snapshot.record_enabled = false;
                self.backend.stop_recording();
            }
        }
    }

    fn start_recording(&mut self) {
        if !self.session_running {
            warn!("toggle_recording ignored, session not running");
            return;
        }
        if self.recording.is_some() {
            warn!("recording already in progress");
            return;
        }

        // Background token first: the finish callback may arrive after the
        // app leaves the foreground. `None` just means the host has no
        // backgrounding; recording proceeds regardless.
        let session = RecordingSession::begin(self.services.background.as_ref());

        // Orientation follows the preview at the moment recording starts.
        let orientation = *self.preview_orientation.lock().unwrap();
        self.backend
            .set_output_orientation(OutputKind::MovieFile, orientation);

        // Flash off for movie recording.
        self.backend.set_flash(FlashMode::Off);

        info!(path = %session.path().display(), "starting movie recording");
        self.snapshot.record_enabled = false;
        self.snapshot.camera_switch_enabled = false;

        match self.backend.start_recording(session.path()) {
            Ok(()) => {
                self.recording = Some(session);
                self.recording_state = RecordingState::Recording;
            }
            Err(e) => {
                error!(error = %e, "could not start recording");
                session.cleanup(self.services.background.as_ref());
                self.update_control_affordances();
            }
        }
    }

    async fn recording_finished(
        &mut self,
        path: std::path::PathBuf,
        result: Result<(), crate::errors::BackendError>,
    ) {
        self.recording_state = RecordingState::Idle;
        let Some(session) = self.recording.take() else {
            warn!(path = %path.display(), "finish callback without an active recording");
            return;
        };
        if session.path() != path {
            warn!(
                expected = %session.path().display(),
                got = %path.display(),
                "finish callback for an unexpected path"
            );
        }

        match result {
            Ok(()) => {
                if self.services.library.request_authorization().await {
                    match self.services.library.save_video(&path, true) {
                        Ok(dest) => info!(path = %dest.display(), "movie saved to photo library"),
                        Err(e) => error!(error = %e, "could not save movie to photo library"),
                    }
                } else {
                    warn!("photo library access not authorized, discarding movie");
                }
            }
            Err(e) => error!(error = %e, "movie file finishing error"),
        }

        // Whatever happened above, the temporary file is removed and the
        // background token released exactly once.
        session.cleanup(self.services.background.as_ref());
        self.update_control_affordances();
    }

    // ===== Camera switch =====

    fn change_camera(&mut self) {
        let Some((current_id, current_device)) = self.video_input.clone() else {
            warn!("change_camera ignored, no video input");
            return;
        };

        self.snapshot.record_enabled = false;
        self.snapshot.still_enabled = false;
        self.snapshot.camera_switch_enabled = false;

        let preferred = current_device.position.toggled();
        let Some(new_device) = self.pick_camera(preferred) else {
            warn!("no camera to switch to");
            self.update_control_affordances();
            return;
        };

        info!(from = %current_device.name, to = %new_device.name, "changing camera");

        // Front and back cameras cannot be attached simultaneously, so the
        // current input is removed first; if the new input is refused the
        // original is restored, leaving the session with a video input
        // either way.
        self.backend.begin_configuration();
        if let Err(e) = self.backend.remove_input(current_id) {
            error!(error = %e, "could not remove current video input");
        }

        if self.backend.can_add_input(&new_device) {
            match self.backend.add_input(&new_device) {
                Ok(id) => {
                    self.backend.set_flash(FlashMode::Auto);
                    self.video_input = Some((id, new_device));
                }
                Err(e) => {
                    warn!(error = %e, "could not add new video input, restoring previous");
                    self.restore_video_input(&current_device);
                }
            }
        } else {
            warn!(device = %new_device.name, "session refused new video input, restoring previous");
            self.restore_video_input(&current_device);
        }

        if self.backend.capabilities().stabilization {
            self.backend.set_stabilization(true);
        }
        self.backend.commit_configuration();

        self.update_control_affordances();
    }

    fn restore_video_input(&mut self, device: &DeviceDescriptor) {
        match self.backend.add_input(device) {
            Ok(id) => self.video_input = Some((id, device.clone())),
            Err(e) => {
                // Session left without video; configuration is unusable.
                error!(error = %e, "could not restore original video input");
                self.video_input = None;
                self.setup_result = SetupResult::SessionConfigurationFailed;
            }
        }
    }

    // ===== Still capture =====

    fn capture_still(&mut self) {
        let orientation = *self.preview_orientation.lock().unwrap();
        self.backend
            .set_output_orientation(OutputKind::StillImage, orientation);
        self.backend.set_flash(FlashMode::Auto);

        if let Err(e) = self.backend.capture_still() {
            error!(error = %e, "could not capture still image");
        }
    }

    async fn still_captured(&mut self, result: Result<Vec<u8>, crate::errors::BackendError>) {
        match result {
            Ok(bytes) => {
                if self.services.library.request_authorization().await {
                    match self.services.library.save_image(&bytes) {
                        Ok(dest) => info!(path = %dest.display(), "photo saved to photo library"),
                        Err(e) => {
                            error!(error = %e, "error occurred while saving image to photo library")
                        }
                    }
                } else {
                    warn!("photo library access not authorized, discarding photo");
                }
            }
            Err(e) => error!(error = %e, "could not capture still image"),
        }
    }

    // ===== Focus =====

    fn focus(
        &mut self,
        focus_mode: FocusMode,
        exposure_mode: ExposureMode,
        point: PointOfInterest,
        monitor_subject_area: bool,
    ) {
        if self.video_input.is_none() {
            warn!("focus ignored, no video input");
            return;
        }

        // The lock is exclusive; failing to acquire it skips the operation.
        if let Err(e) = self.backend.lock_device_for_configuration() {
            warn!(error = %e, "could not lock device for configuration");
            return;
        }

        // Focus and exposure support are independent capabilities.
        let capabilities = self.backend.capabilities();
        if capabilities.focus_point_of_interest {
            self.backend.set_focus(focus_mode, point);
        }
        if capabilities.exposure_point_of_interest {
            self.backend.set_exposure(exposure_mode, point);
        }
        self.backend.set_subject_area_monitoring(monitor_subject_area);
        self.backend.unlock_device();
    }

    // ===== Resume =====

    fn resume_interrupted(&mut self) {
        // The session might fail to start running, e.g. if the device is
        // still claimed elsewhere; that failure also arrives as a runtime
        // error, which does not auto-restart while we are resuming manually.
        let started = self.backend.start_running();
        self.session_running = started && self.backend.is_running();
        if self.session_running {
            self.transition(SessionState::Running);
            self.snapshot.resume_visible = false;
            self.snapshot.alert = None;
        } else {
            warn!("unable to resume interrupted session");
            self.snapshot.alert = Some(UserAlert::UnableToResume);
        }
        self.update_control_affordances();
    }

    // ===== Backend events =====

    async fn handle_event(&mut self, event: BackendEvent) {
        // Recording completion is always honored so the token and temp file
        // are never leaked; lifecycle notifications are only handled while
        // attached (between start and stop).
        match event {
            BackendEvent::RecordingStarted { path } => {
                info!(path = %path.display(), "recording started");
                self.snapshot.record_enabled = true;
            }
            BackendEvent::RecordingFinished { path, result } => {
                self.recording_finished(path, result).await;
            }
            BackendEvent::StillCaptured { result } => {
                self.still_captured(result).await;
            }
            BackendEvent::RuntimeError(cause) if self.events_attached => {
                self.runtime_error(cause);
            }
            BackendEvent::Interrupted(reason) if self.events_attached => {
                self.interrupted(reason);
            }
            BackendEvent::InterruptionEnded if self.events_attached => {
                self.interruption_ended();
            }
            BackendEvent::SubjectAreaChanged if self.events_attached => {
                // Refocus at the center of the frame, without monitoring.
                self.focus(
                    FocusMode::ContinuousAuto,
                    ExposureMode::ContinuousAuto,
                    PointOfInterest::center(),
                    false,
                );
            }
            other => debug!(event = ?other, "backend event ignored while detached"),
        }
    }

    fn runtime_error(&mut self, cause: RuntimeErrorCause) {
        error!(cause = %cause, "capture session runtime error");

        // Restart automatically only if media services were reset and the
        // last start succeeded; restarting after an error that preceded any
        // successful start would loop. Every other error hands control to
        // the user via the resume affordance. The error stopped the session,
        // so whenever no restart happens `session_running` is refreshed from
        // the backend before the affordances are recomputed.
        if cause == RuntimeErrorCause::MediaServicesReset && self.session_running {
            let started = self.backend.start_running();
            self.session_running = started && self.backend.is_running();
            if self.session_running {
                info!("session restarted after media services reset");
                self.transition(SessionState::Running);
            } else {
                self.snapshot.resume_visible = true;
            }
        } else {
            self.session_running = self.backend.is_running();
            self.snapshot.resume_visible = true;
        }
        self.update_control_affordances();
    }

    fn interrupted(&mut self, reason: InterruptionReason) {
        info!(reason = %reason, "capture session was interrupted");
        self.transition(SessionState::Interrupted);

        // The interruption stopped the session; controls are only valid
        // while running, so they go dark until it resumes.
        self.session_running = self.backend.is_running();

        if reason.is_resumable() {
            // Resuming will reclaim the device from the other client.
            self.snapshot.resume_visible = true;
        } else {
            // Claimed by another foreground app; nothing to do until the
            // interruption ends on its own.
            self.snapshot.camera_unavailable = true;
        }
        self.update_control_affordances();
    }

    fn interruption_ended(&mut self) {
        info!("capture session interruption ended");
        self.snapshot.resume_visible = false;
        self.snapshot.camera_unavailable = false;
        self.session_running = self.backend.is_running();
        self.transition(SessionState::Running);
        self.update_control_affordances();
    }
}
