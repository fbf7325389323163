// SPDX-License-Identifier: MPL-2.0

//! Capture session manager
//!
//! The manager spawns the serial session worker, forwards backend events
//! into its queue, and exposes the lifecycle operations. It is cheap to
//! clone and every clone talks to the same worker; dropping the last clone
//! shuts the worker down.

use super::state::UiSnapshot;
use super::worker::{SessionCommand, SessionServices, SessionWorker, WorkerMessage};
use crate::backends::{
    BackendEvent, CaptureBackend, ExposureMode, FocusMode, PointOfInterest, VideoOrientation,
};
use crate::config::Config;
use crate::preview::PreviewSurface;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

/// Handle to a running capture session worker
#[derive(Clone)]
pub struct CaptureSessionManager {
    tx: mpsc::UnboundedSender<WorkerMessage>,
    snapshots: watch::Receiver<UiSnapshot>,
    preview_orientation: Arc<Mutex<VideoOrientation>>,
}

impl CaptureSessionManager {
    /// Spawn the session worker for a backend.
    ///
    /// `events` must be the receiving side of the channel the backend was
    /// constructed with; the manager forwards it into the worker's FIFO
    /// queue. Must be called from within a tokio runtime.
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        events: mpsc::UnboundedReceiver<BackendEvent>,
        config: Config,
        services: SessionServices,
    ) -> Self {
        info!("creating capture session manager");

        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(UiSnapshot::default());
        let preview_orientation = Arc::new(Mutex::new(VideoOrientation::default()));

        // Backend events merge into the same FIFO queue as commands. The
        // forwarder holds only a weak sender: the worker (which owns the
        // backend and with it the event channel) must not be kept alive by
        // its own event path once every manager clone is gone.
        let event_tx = tx.downgrade();
        tokio::spawn(async move {
            let mut events = events;
            while let Some(event) = events.recv().await {
                let Some(queue) = event_tx.upgrade() else {
                    break;
                };
                if queue.send(WorkerMessage::Event(event)).is_err() {
                    break;
                }
            }
        });

        let worker = SessionWorker::new(
            backend,
            services,
            config,
            Arc::clone(&preview_orientation),
            rx,
            snapshot_tx,
        );
        tokio::spawn(worker.run());

        Self {
            tx,
            snapshots: snapshot_rx,
            preview_orientation,
        }
    }

    fn submit(&self, command: SessionCommand) {
        // A closed channel means the worker is gone; commands become no-ops,
        // mirroring a torn-down session.
        let _ = self.tx.send(WorkerMessage::Command(command));
    }

    /// Check authorization and configure inputs and outputs.
    ///
    /// All configuration happens inside one begin/commit transaction on the
    /// worker. If the permission prompt is pending, every queued operation
    /// waits for its resolution.
    pub fn initialize(&self) {
        self.submit(SessionCommand::Initialize);
    }

    /// Start the session and begin handling lifecycle notifications.
    ///
    /// No-op unless setup succeeded; setup failures surface as alerts in the
    /// published snapshot instead.
    pub fn start(&self) {
        self.submit(SessionCommand::Start);
    }

    /// Stop the session and detach notification handling. Idempotent.
    pub fn stop(&self) {
        self.submit(SessionCommand::Stop);
    }

    /// Start a movie recording, or request that the active one stop.
    ///
    /// Completion is signaled by the movie sink, not by this call; watch the
    /// snapshots for `recording` flipping back to false.
    pub fn toggle_recording(&self) {
        self.submit(SessionCommand::ToggleRecording);
    }

    /// Toggle between the front and back camera
    pub fn change_camera(&self) {
        self.submit(SessionCommand::ChangeCamera);
    }

    /// Capture a still image and hand it to the photo library
    pub fn capture_still(&self) {
        self.submit(SessionCommand::CaptureStill);
    }

    /// Apply focus and exposure at a device point of interest
    pub fn focus(
        &self,
        focus_mode: FocusMode,
        exposure_mode: ExposureMode,
        point: PointOfInterest,
        monitor_subject_area: bool,
    ) {
        self.submit(SessionCommand::Focus {
            focus_mode,
            exposure_mode,
            point,
            monitor_subject_area,
        });
    }

    /// Try to resume a session interrupted by another client
    pub fn resume_interrupted(&self) {
        self.submit(SessionCommand::ResumeInterrupted);
    }

    /// Wait until every operation submitted before this call has been
    /// processed (FIFO barrier)
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.submit(SessionCommand::Flush(ack_tx));
        // Worker gone also means everything before it was processed.
        let _ = ack_rx.await;
    }

    /// Subscribe to published state snapshots
    pub fn snapshots(&self) -> watch::Receiver<UiSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published state snapshot
    pub fn snapshot(&self) -> UiSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Bind a preview surface to this session
    pub fn preview(&self) -> PreviewSurface {
        PreviewSurface::bind(self.clone(), Arc::clone(&self.preview_orientation))
    }
}

impl std::fmt::Debug for CaptureSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshots.borrow();
        f.debug_struct("CaptureSessionManager")
            .field("session_state", &snapshot.session_state)
            .field("session_running", &snapshot.session_running)
            .field("recording", &snapshot.recording)
            .finish()
    }
}
