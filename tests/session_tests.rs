// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture session lifecycle
//!
//! Scenario tests driving a [`CaptureSessionManager`] over the simulated
//! backend with fake services. Published snapshots lag worker state by one
//! scheduling hop, so assertions go through the flush barrier or wait on the
//! snapshot channel.

use avcam::backends::sim::{SimControl, SimulatedBackend};
use avcam::backends::{
    ExposureMode, FlashMode, FocusMode, InterruptionReason, MediaKind, PointOfInterest,
    RuntimeErrorCause,
};
use avcam::services::background::CountingExecutor;
use avcam::services::{AccessStatus, AlwaysAuthorized, AuthorizationService};
use avcam::session::SessionState;
use avcam::storage::DirectoryLibrary;
use avcam::{CaptureSessionManager, Config, SessionServices, SetupResult, UiSnapshot, UserAlert};
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

struct Harness {
    session: CaptureSessionManager,
    control: SimControl,
    background: CountingExecutor,
    pictures: PathBuf,
    videos: PathBuf,
    _dir: tempfile::TempDir,
}

fn harness_with_auth(authorization: Box<dyn AuthorizationService>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let pictures = dir.path().join("pictures");
    let videos = dir.path().join("videos");
    let background = CountingExecutor::new();

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (backend, control) = SimulatedBackend::new(events_tx);

    let services = SessionServices {
        authorization,
        background: Box::new(background.clone()),
        library: Box::new(DirectoryLibrary::new(pictures.clone(), videos.clone())),
    };
    let session =
        CaptureSessionManager::new(Box::new(backend), events_rx, Config::default(), services);

    Harness {
        session,
        control,
        background,
        pictures,
        videos,
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with_auth(Box::new(AlwaysAuthorized))
}

impl Harness {
    async fn initialize_and_start(&self) {
        self.session.initialize();
        self.session.start();
        self.session.flush().await;
    }
}

/// Wait until a published snapshot satisfies the predicate
async fn wait_for_snapshot(
    session: &CaptureSessionManager,
    what: &str,
    predicate: impl FnMut(&UiSnapshot) -> bool,
) -> UiSnapshot {
    let mut rx = session.snapshots();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
        .expect("session worker dropped");
    snapshot.clone()
}

/// Poll a backend-side condition until it holds
async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

// ===== Authorization fakes =====

struct StaticAuth {
    status: AccessStatus,
    grant: bool,
}

impl AuthorizationService for StaticAuth {
    fn status(&self, _kind: MediaKind) -> AccessStatus {
        self.status
    }

    fn request_access(&self, _kind: MediaKind) -> BoxFuture<'static, bool> {
        let grant = self.grant;
        Box::pin(async move { grant })
    }
}

/// Prompt that stays unresolved until the test resolves it
struct PendingPrompt {
    resolver: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
}

impl AuthorizationService for PendingPrompt {
    fn status(&self, _kind: MediaKind) -> AccessStatus {
        AccessStatus::NotDetermined
    }

    fn request_access(&self, _kind: MediaKind) -> BoxFuture<'static, bool> {
        let (tx, rx) = oneshot::channel();
        *self.resolver.lock().unwrap() = Some(tx);
        Box::pin(async move { rx.await.unwrap_or(false) })
    }
}

// ===== Setup =====

#[tokio::test]
async fn setup_commits_inputs_and_outputs_in_one_transaction() {
    let h = harness();
    h.session.initialize();
    h.session.flush().await;

    let committed = h.control.snapshots();
    assert_eq!(committed.len(), 1, "setup uses a single transaction");
    assert!(committed[0].has_input_kind(MediaKind::Video));
    assert!(committed[0].has_input_kind(MediaKind::Audio));
    assert_eq!(committed[0].outputs.len(), 2);
    assert!(h.control.stabilization());
    assert!(h.session.snapshot().setup_result.is_success());
}

#[tokio::test]
async fn no_outputs_committed_without_a_video_input() {
    let h = harness();
    h.control.refuse_input("cam-back");
    h.control.refuse_input("cam-front");

    h.session.initialize();
    h.session.flush().await;
    assert_eq!(
        h.session.snapshot().setup_result,
        SetupResult::SessionConfigurationFailed
    );

    let committed = h.control.snapshots();
    assert_eq!(committed.len(), 1);
    assert!(!committed[0].has_input_kind(MediaKind::Video));
    assert!(committed[0].outputs.is_empty(), "no sink without its source");

    // A later start surfaces the failure instead of running.
    h.session.start();
    h.session.flush().await;
    assert_eq!(
        h.session.snapshot().alert,
        Some(UserAlert::ConfigurationFailed)
    );
    assert!(!h.control.is_running());
}

#[tokio::test]
async fn denied_authorization_skips_configuration() {
    let h = harness_with_auth(Box::new(StaticAuth {
        status: AccessStatus::Denied,
        grant: false,
    }));
    h.session.initialize();
    h.session.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.setup_result, SetupResult::CameraNotAuthorized);
    assert_eq!(h.control.begin_count(), 0, "no transaction was opened");

    h.session.start();
    h.session.flush().await;
    assert_eq!(
        h.session.snapshot().alert,
        Some(UserAlert::CameraNotAuthorized)
    );
    assert!(!h.control.is_running());
}

#[tokio::test]
async fn refused_prompt_is_terminal() {
    let h = harness_with_auth(Box::new(StaticAuth {
        status: AccessStatus::NotDetermined,
        grant: false,
    }));
    h.session.initialize();
    h.session.flush().await;
    assert_eq!(
        h.session.snapshot().setup_result,
        SetupResult::CameraNotAuthorized
    );
    assert_eq!(h.control.begin_count(), 0);

    // Terminal: later operations are absorbed.
    h.session.change_camera();
    h.session.capture_still();
    h.session.flush().await;
    assert_eq!(h.control.begin_count(), 0);
}

#[tokio::test]
async fn pending_prompt_suspends_queued_operations() {
    let resolver = Arc::new(Mutex::new(None));
    let h = harness_with_auth(Box::new(PendingPrompt {
        resolver: Arc::clone(&resolver),
    }));

    h.session.initialize();
    h.session.start();
    eventually("prompt to be issued", || resolver.lock().unwrap().is_some()).await;

    // Everything queued behind the prompt waits for its resolution.
    let flush = h.session.flush();
    tokio::pin!(flush);
    let raced = tokio::time::timeout(Duration::from_millis(100), flush.as_mut()).await;
    assert!(raced.is_err(), "queue should be suspended behind the prompt");
    assert_eq!(h.control.begin_count(), 0);

    resolver.lock().unwrap().take().unwrap().send(true).unwrap();
    flush.await;

    let snapshot = h.session.snapshot();
    assert!(snapshot.session_running);
    assert_eq!(snapshot.session_state, SessionState::Running);
    assert!(h.control.is_running());
}

// ===== Running =====

#[tokio::test]
async fn start_enables_controls_and_stop_disables_them() {
    let h = harness();
    h.initialize_and_start().await;

    let snapshot = h.session.snapshot();
    assert!(snapshot.session_running);
    assert!(snapshot.record_enabled);
    assert!(snapshot.still_enabled);
    assert!(snapshot.camera_switch_enabled, "two cameras are available");

    h.session.stop();
    h.session.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.session_state, SessionState::Stopped);
    assert!(!snapshot.session_running);
    assert!(!snapshot.record_enabled);
    assert!(!snapshot.still_enabled);
    assert!(!h.control.is_running());
}

#[tokio::test]
async fn lifecycle_events_are_ignored_after_stop() {
    let h = harness();
    h.initialize_and_start().await;
    h.session.stop();
    h.session.flush().await;

    h.control.inject_runtime_error(RuntimeErrorCause::Other("late failure".into()));
    h.control.trigger_subject_area_change();
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.session.flush().await;

    assert!(!h.session.snapshot().resume_visible);
    assert!(h.control.focus().is_none());
}

// ===== Recording =====

#[tokio::test]
async fn recording_saves_movie_and_releases_background_token() {
    let h = harness();
    h.initialize_and_start().await;

    h.session.toggle_recording();
    h.session.flush().await;
    assert_eq!(h.background.active(), 1, "token held while recording");

    let snapshot = wait_for_snapshot(&h.session, "recording to start", |s| {
        s.recording && s.record_enabled
    })
    .await;
    assert!(
        !snapshot.camera_switch_enabled,
        "camera switch is disabled while recording"
    );

    h.session.toggle_recording();
    wait_for_snapshot(&h.session, "recording to finish", |s| {
        !s.recording && s.record_enabled
    })
    .await;

    assert_eq!(h.background.active(), 0, "token released after the save");
    assert_eq!(h.background.issued(), 1);

    let saved: Vec<_> = std::fs::read_dir(&h.videos)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].extension().unwrap(), "mov");

    let temp = h.control.recording_paths();
    assert_eq!(temp.len(), 1);
    assert!(!temp[0].exists(), "temporary movie was moved into the library");
}

#[tokio::test]
async fn consecutive_recordings_use_unique_temporary_paths() {
    let h = harness();
    h.initialize_and_start().await;

    for _ in 0..2 {
        h.session.toggle_recording();
        wait_for_snapshot(&h.session, "recording to start", |s| s.recording).await;
        h.session.toggle_recording();
        wait_for_snapshot(&h.session, "recording to finish", |s| {
            !s.recording && s.record_enabled
        })
        .await;
    }

    let paths = h.control.recording_paths();
    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);
    for path in &paths {
        assert_eq!(path.extension().unwrap(), "mov");
    }
    assert_eq!(h.background.issued(), 2);
    assert_eq!(h.background.active(), 0);
}

#[tokio::test]
async fn failed_recording_still_releases_the_token() {
    let h = harness();
    h.initialize_and_start().await;
    h.control.fail_recording(Some("disk full"));

    h.session.toggle_recording();
    wait_for_snapshot(&h.session, "recording to start", |s| s.recording).await;
    h.session.toggle_recording();
    wait_for_snapshot(&h.session, "recording to finish", |s| {
        !s.recording && s.record_enabled
    })
    .await;

    assert_eq!(h.background.active(), 0);
    // The failed movie never reaches the library.
    let saved = std::fs::read_dir(&h.videos)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(saved, 0);
}

#[tokio::test]
async fn recording_ignored_while_not_running() {
    let h = harness();
    h.session.initialize();
    h.session.toggle_recording();
    h.session.flush().await;

    assert!(!h.session.snapshot().recording);
    assert_eq!(h.background.issued(), 0);
    assert!(h.control.recording_paths().is_empty());
}

#[tokio::test]
async fn recording_sets_movie_orientation_and_disables_flash() {
    use avcam::backends::{OutputKind, VideoOrientation};

    let h = harness();
    h.initialize_and_start().await;
    h.session
        .preview()
        .set_video_orientation(VideoOrientation::LandscapeRight);

    h.session.toggle_recording();
    h.session.flush().await;

    assert_eq!(
        h.control.output_orientation(OutputKind::MovieFile),
        Some(VideoOrientation::LandscapeRight)
    );
    assert_eq!(h.control.flash(), FlashMode::Off);
}

// ===== Camera switch =====

#[tokio::test]
async fn change_camera_toggles_position() {
    let h = harness();
    h.initialize_and_start().await;

    let camera = |control: &SimControl| {
        control
            .current_inputs()
            .into_iter()
            .find(|d| d.kind == MediaKind::Video)
            .expect("a video input is attached")
    };
    assert_eq!(camera(&h.control).id, "cam-back");

    h.session.change_camera();
    h.session.flush().await;
    assert_eq!(camera(&h.control).id, "cam-front");
    assert_eq!(h.control.flash(), FlashMode::Auto);
    assert!(h.control.stabilization());

    let snapshot = h.session.snapshot();
    assert!(snapshot.record_enabled);
    assert!(snapshot.still_enabled);
    assert!(snapshot.camera_switch_enabled);

    // And back again.
    h.session.change_camera();
    h.session.flush().await;
    assert_eq!(camera(&h.control).id, "cam-back");
}

#[tokio::test]
async fn change_camera_restores_input_when_new_device_is_refused() {
    let h = harness();
    h.initialize_and_start().await;
    h.control.refuse_input("cam-front");

    h.session.change_camera();
    h.session.flush().await;

    let video: Vec<_> = h
        .control
        .current_inputs()
        .into_iter()
        .filter(|d| d.kind == MediaKind::Video)
        .collect();
    assert_eq!(video.len(), 1, "the session keeps exactly one video input");
    assert_eq!(video[0].id, "cam-back");

    let snapshot = h.session.snapshot();
    assert!(snapshot.setup_result.is_success());
    assert!(snapshot.record_enabled, "controls come back after the switch");
}

// ===== Still capture =====

#[tokio::test]
async fn still_capture_saves_a_jpeg() {
    let h = harness();
    h.initialize_and_start().await;

    h.session.capture_still();
    h.session.flush().await;
    assert_eq!(h.control.flash(), FlashMode::Auto);

    eventually("photo to appear in the library", || {
        std::fs::read_dir(&h.pictures)
            .map(|entries| entries.count() == 1)
            .unwrap_or(false)
    })
    .await;

    let photo = std::fs::read_dir(&h.pictures)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    assert_eq!(photo.extension().unwrap(), "jpg");
    let bytes = std::fs::read(&photo).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
}

#[tokio::test]
async fn failed_still_capture_saves_nothing() {
    let h = harness();
    h.initialize_and_start().await;
    h.control.fail_still_capture(Some("sensor fault"));

    h.session.capture_still();
    h.session.flush().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let saved = std::fs::read_dir(&h.pictures)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(saved, 0);
}

// ===== Focus =====

#[tokio::test]
async fn focus_applies_under_the_device_lock() {
    let h = harness();
    h.initialize_and_start().await;

    let point = PointOfInterest { x: 0.25, y: 0.75 };
    h.session
        .focus(FocusMode::Auto, ExposureMode::Auto, point, true);
    h.session.flush().await;

    assert_eq!(h.control.focus(), Some((FocusMode::Auto, point)));
    assert_eq!(h.control.exposure(), Some((ExposureMode::Auto, point)));
    assert!(h.control.subject_area_monitoring());
    assert!(!h.control.is_device_locked(), "lock released afterwards");
}

#[tokio::test]
async fn focus_lock_failure_is_recoverable() {
    let h = harness();
    h.initialize_and_start().await;

    h.control.fail_device_lock(true);
    let point = PointOfInterest { x: 0.1, y: 0.9 };
    h.session
        .focus(FocusMode::Auto, ExposureMode::Auto, point, true);
    h.session.flush().await;
    assert!(h.control.focus().is_none(), "skipped without the lock");
    assert!(!h.control.subject_area_monitoring());

    // The session keeps working once the lock can be acquired again.
    h.control.fail_device_lock(false);
    h.session
        .focus(FocusMode::Auto, ExposureMode::Auto, point, true);
    h.session.flush().await;
    assert_eq!(h.control.focus(), Some((FocusMode::Auto, point)));
}

#[tokio::test]
async fn subject_area_change_refocuses_at_center() {
    let h = harness();
    h.initialize_and_start().await;

    h.session.focus(
        FocusMode::Auto,
        ExposureMode::Auto,
        PointOfInterest { x: 0.2, y: 0.2 },
        true,
    );
    h.session.flush().await;

    h.control.trigger_subject_area_change();
    eventually("refocus at the frame center", || {
        h.control.focus()
            == Some((FocusMode::ContinuousAuto, PointOfInterest::center()))
    })
    .await;
    assert!(
        !h.control.subject_area_monitoring(),
        "monitoring is switched off by the recentering"
    );
}

// ===== Runtime errors =====

#[tokio::test]
async fn media_services_reset_restarts_a_running_session() {
    let h = harness();
    h.initialize_and_start().await;
    assert!(h.control.is_running());

    h.control.inject_runtime_error(RuntimeErrorCause::MediaServicesReset);
    eventually("session to restart", || h.control.is_running()).await;

    h.session.flush().await;
    let snapshot = h.session.snapshot();
    assert!(snapshot.session_running);
    assert!(!snapshot.resume_visible, "no user action needed");
}

#[tokio::test]
async fn runtime_error_before_a_successful_start_defers_to_user() {
    let h = harness();
    h.control.fail_start(true);
    h.session.initialize();
    h.session.start();
    h.session.flush().await;
    assert!(!h.session.snapshot().session_running);

    // The failed start reported a runtime error; without a prior successful
    // start there is no auto-restart, only the resume affordance.
    let snapshot =
        wait_for_snapshot(&h.session, "resume affordance", |s| s.resume_visible).await;
    assert!(!snapshot.session_running);
    assert!(!h.control.is_running());
}

#[tokio::test]
async fn runtime_error_without_restart_clears_session_running() {
    let h = harness();
    h.initialize_and_start().await;

    h.control
        .inject_runtime_error(RuntimeErrorCause::Other("pipeline stall".into()));
    let snapshot =
        wait_for_snapshot(&h.session, "resume affordance", |s| s.resume_visible).await;
    assert!(!snapshot.session_running, "the backend is stopped");
    assert!(!snapshot.record_enabled);
    assert!(!snapshot.still_enabled);
    assert!(!snapshot.camera_switch_enabled);
}

#[tokio::test]
async fn other_runtime_errors_offer_resume() {
    let h = harness();
    h.initialize_and_start().await;

    h.control
        .inject_runtime_error(RuntimeErrorCause::Other("pipeline stall".into()));
    wait_for_snapshot(&h.session, "resume affordance", |s| s.resume_visible).await;
    assert!(!h.control.is_running(), "no automatic restart");

    h.session.resume_interrupted();
    h.session.flush().await;
    let snapshot = h.session.snapshot();
    assert!(snapshot.session_running);
    assert!(!snapshot.resume_visible);
    assert!(h.control.is_running());
}

#[tokio::test]
async fn failed_resume_raises_an_alert() {
    let h = harness();
    h.initialize_and_start().await;

    h.control
        .inject_runtime_error(RuntimeErrorCause::Other("pipeline stall".into()));
    wait_for_snapshot(&h.session, "resume affordance", |s| s.resume_visible).await;

    h.control.fail_start(true);
    h.session.resume_interrupted();
    h.session.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.alert, Some(UserAlert::UnableToResume));
    assert!(snapshot.resume_visible, "the affordance stays available");
    assert!(!snapshot.session_running);
}

// ===== Interruptions =====

#[tokio::test]
async fn device_in_use_interruption_is_resumable() {
    let h = harness();
    h.initialize_and_start().await;

    h.control
        .inject_interruption(InterruptionReason::VideoDeviceInUseByAnotherClient);
    let snapshot =
        wait_for_snapshot(&h.session, "resume affordance", |s| s.resume_visible).await;
    assert_eq!(snapshot.session_state, SessionState::Interrupted);
    assert!(!snapshot.camera_unavailable);

    h.control.end_interruption();
    let snapshot = wait_for_snapshot(&h.session, "interruption to end", |s| {
        !s.resume_visible
    })
    .await;
    assert_eq!(snapshot.session_state, SessionState::Running);
}

#[tokio::test]
async fn interrupted_snapshot_disables_controls() {
    let h = harness();
    h.initialize_and_start().await;

    h.control
        .inject_interruption(InterruptionReason::VideoDeviceInUseByAnotherClient);
    let snapshot = wait_for_snapshot(&h.session, "interruption", |s| {
        s.session_state == SessionState::Interrupted
    })
    .await;
    assert!(!snapshot.session_running);
    assert!(!snapshot.record_enabled, "controls are only valid while running");
    assert!(!snapshot.still_enabled);
    assert!(!snapshot.camera_switch_enabled);

    // Tapping record while interrupted must not reach the movie sink.
    h.session.toggle_recording();
    h.session.flush().await;
    assert!(h.control.recording_paths().is_empty());
    assert_eq!(h.background.issued(), 0);

    // Controls come back once the interruption ends.
    h.control.end_interruption();
    let snapshot =
        wait_for_snapshot(&h.session, "controls to return", |s| s.record_enabled).await;
    assert!(snapshot.session_running);
    assert!(snapshot.still_enabled);
}

#[tokio::test]
async fn multi_app_interruption_shows_camera_unavailable() {
    let h = harness();
    h.initialize_and_start().await;

    h.control.inject_interruption(
        InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps,
    );
    let snapshot = wait_for_snapshot(&h.session, "camera unavailable indicator", |s| {
        s.camera_unavailable
    })
    .await;
    assert!(!snapshot.resume_visible, "not resumable by the user");

    h.control.end_interruption();
    let snapshot = wait_for_snapshot(&h.session, "interruption to end", |s| {
        !s.camera_unavailable
    })
    .await;
    assert_eq!(snapshot.session_state, SessionState::Running);
}
