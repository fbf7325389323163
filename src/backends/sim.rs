// SPDX-License-Identifier: MPL-2.0

//! Simulated capture backend
//!
//! An in-memory backend with a front camera, a back camera and a microphone.
//! It enforces the configuration-transaction contract, records every committed
//! configuration for inspection, and synthesizes media: recordings become
//! small placeholder movie files, still captures become JPEG-encoded gradient
//! frames.
//!
//! A cloneable [`SimControl`] handle injects faults and lifecycle events
//! (interruptions, runtime errors, lock failures, input refusals), which is
//! how the demo CLI and the tests exercise the session state machine.

use super::{
    BackendEvent, CaptureBackend, DeviceCapabilities, DeviceDescriptor, DevicePosition,
    ExposureMode, FlashMode, FocusMode, InputId, InterruptionReason, MediaKind, OutputKind,
    PointOfInterest, RuntimeErrorCause, VideoOrientation,
};
use crate::errors::{BackendError, BackendResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// One committed configuration, as the hardware pipeline would observe it
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Devices attached as inputs at commit time
    pub inputs: Vec<DeviceDescriptor>,
    /// Outputs attached at commit time
    pub outputs: Vec<OutputKind>,
}

impl ConfigSnapshot {
    /// Whether any input of the given media kind is present
    pub fn has_input_kind(&self, kind: MediaKind) -> bool {
        self.inputs.iter().any(|d| d.kind == kind)
    }
}

/// Fault-injection switches shared with [`SimControl`]
#[derive(Debug, Default)]
struct Faults {
    /// Device ids the session will refuse as inputs
    refuse_inputs: HashSet<String>,
    /// Next `lock_device_for_configuration` call fails
    fail_lock: bool,
    /// `start_running` fails (and emits a runtime error)
    fail_start: bool,
    /// Recordings finish with this error instead of succeeding
    recording_error: Option<String>,
    /// Still captures fail with this error
    still_error: Option<String>,
}

#[derive(Debug)]
struct SimShared {
    devices: Vec<DeviceDescriptor>,
    faults: Faults,
    capabilities: DeviceCapabilities,

    // Transaction state
    configuring: bool,
    begin_count: u64,
    inputs: HashMap<InputId, DeviceDescriptor>,
    outputs: Vec<OutputKind>,
    next_input_id: u64,
    snapshots: Vec<ConfigSnapshot>,

    // Runtime state
    running: bool,
    recording: Option<PathBuf>,
    recording_paths: Vec<PathBuf>,
    device_locked: bool,
    stabilization: bool,
    subject_area_monitoring: bool,
    flash: FlashMode,
    focus: Option<(FocusMode, PointOfInterest)>,
    exposure: Option<(ExposureMode, PointOfInterest)>,
    orientations: HashMap<OutputKind, VideoOrientation>,
}

impl Default for SimShared {
    fn default() -> Self {
        Self {
            devices: default_devices(),
            faults: Faults::default(),
            capabilities: DeviceCapabilities {
                focus_point_of_interest: true,
                exposure_point_of_interest: true,
                flash: true,
                stabilization: true,
            },
            configuring: false,
            begin_count: 0,
            inputs: HashMap::new(),
            outputs: Vec::new(),
            next_input_id: 1,
            snapshots: Vec::new(),
            running: false,
            recording: None,
            recording_paths: Vec::new(),
            device_locked: false,
            stabilization: false,
            subject_area_monitoring: false,
            flash: FlashMode::Off,
            focus: None,
            exposure: None,
            orientations: HashMap::new(),
        }
    }
}

fn default_devices() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor {
            id: "cam-back".into(),
            name: "Back Camera".into(),
            kind: MediaKind::Video,
            position: DevicePosition::Back,
        },
        DeviceDescriptor {
            id: "cam-front".into(),
            name: "Front Camera".into(),
            kind: MediaKind::Video,
            position: DevicePosition::Front,
        },
        DeviceDescriptor {
            id: "mic-0".into(),
            name: "Built-in Microphone".into(),
            kind: MediaKind::Audio,
            position: DevicePosition::Unspecified,
        },
    ]
}

/// Simulated backend instance, owned by the session worker
pub struct SimulatedBackend {
    shared: Arc<Mutex<SimShared>>,
    events: UnboundedSender<BackendEvent>,
}

impl SimulatedBackend {
    /// Create a backend and its control handle.
    ///
    /// Backend events (including those injected via the control handle) are
    /// delivered through `events`.
    pub fn new(events: UnboundedSender<BackendEvent>) -> (Self, SimControl) {
        let shared = Arc::new(Mutex::new(SimShared::default()));
        let control = SimControl {
            shared: Arc::clone(&shared),
            events: events.clone(),
        };
        (Self { shared, events }, control)
    }

    fn emit(&self, event: BackendEvent) {
        // Receiver gone means the session worker shut down; nothing to do.
        let _ = self.events.send(event);
    }
}

impl CaptureBackend for SimulatedBackend {
    fn devices(&self, kind: MediaKind) -> Vec<DeviceDescriptor> {
        self.shared
            .lock()
            .unwrap()
            .devices
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }

    fn begin_configuration(&mut self) {
        let mut state = self.shared.lock().unwrap();
        debug!("begin configuration");
        state.configuring = true;
        state.begin_count += 1;
    }

    fn commit_configuration(&mut self) {
        let mut state = self.shared.lock().unwrap();
        state.configuring = false;
        let snapshot = ConfigSnapshot {
            inputs: state.inputs.values().cloned().collect(),
            outputs: state.outputs.clone(),
        };
        debug!(
            inputs = snapshot.inputs.len(),
            outputs = snapshot.outputs.len(),
            "commit configuration"
        );
        state.snapshots.push(snapshot);
    }

    fn can_add_input(&self, device: &DeviceDescriptor) -> bool {
        let state = self.shared.lock().unwrap();
        if state.faults.refuse_inputs.contains(&device.id) {
            return false;
        }
        // Front and back camera cannot be attached simultaneously.
        if device.kind == MediaKind::Video
            && state.inputs.values().any(|d| d.kind == MediaKind::Video)
        {
            return false;
        }
        true
    }

    fn add_input(&mut self, device: &DeviceDescriptor) -> BackendResult<InputId> {
        if !self.can_add_input(device) {
            return Err(BackendError::CannotAddInput(device.name.clone()));
        }
        let mut state = self.shared.lock().unwrap();
        if !state.configuring {
            return Err(BackendError::NotConfiguring);
        }
        let id = InputId(state.next_input_id);
        state.next_input_id += 1;
        state.inputs.insert(id, device.clone());
        info!(device = %device.name, "input attached");
        Ok(id)
    }

    fn remove_input(&mut self, input: InputId) -> BackendResult<()> {
        let mut state = self.shared.lock().unwrap();
        if !state.configuring {
            return Err(BackendError::NotConfiguring);
        }
        match state.inputs.remove(&input) {
            Some(device) => {
                info!(device = %device.name, "input detached");
                Ok(())
            }
            None => Err(BackendError::Other(format!("unknown input {:?}", input))),
        }
    }

    fn can_add_output(&self, kind: OutputKind) -> bool {
        !self.shared.lock().unwrap().outputs.contains(&kind)
    }

    fn add_output(&mut self, kind: OutputKind) -> BackendResult<()> {
        let mut state = self.shared.lock().unwrap();
        if !state.configuring {
            return Err(BackendError::NotConfiguring);
        }
        if state.outputs.contains(&kind) {
            return Err(BackendError::CannotAddOutput(kind.to_string()));
        }
        state.outputs.push(kind);
        info!(output = %kind, "output attached");
        Ok(())
    }

    fn set_stabilization(&mut self, enabled: bool) {
        let mut state = self.shared.lock().unwrap();
        if state.capabilities.stabilization {
            state.stabilization = enabled;
        }
    }

    fn set_output_orientation(&mut self, kind: OutputKind, orientation: VideoOrientation) {
        self.shared
            .lock()
            .unwrap()
            .orientations
            .insert(kind, orientation);
    }

    fn start_running(&mut self) -> bool {
        let fail = {
            let mut state = self.shared.lock().unwrap();
            if state.faults.fail_start {
                false
            } else {
                state.running = true;
                true
            }
        };
        if !fail {
            warn!("simulated session failed to start");
            self.emit(BackendEvent::RuntimeError(RuntimeErrorCause::Other(
                "session failed to start".into(),
            )));
            return false;
        }
        info!("simulated session running");
        true
    }

    fn stop_running(&mut self) {
        let mut state = self.shared.lock().unwrap();
        state.running = false;
        info!("simulated session stopped");
    }

    fn is_running(&self) -> bool {
        self.shared.lock().unwrap().running
    }

    fn start_recording(&mut self, path: &Path) -> BackendResult<()> {
        {
            let mut state = self.shared.lock().unwrap();
            if state.recording.is_some() {
                return Err(BackendError::Recording("already recording".into()));
            }
            if !state.outputs.contains(&OutputKind::MovieFile) {
                return Err(BackendError::Recording("no movie file output".into()));
            }
            state.recording = Some(path.to_path_buf());
            state.recording_paths.push(path.to_path_buf());
        }
        info!(path = %path.display(), "simulated recording started");
        self.emit(BackendEvent::RecordingStarted {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn stop_recording(&mut self) {
        let (path, error) = {
            let mut state = self.shared.lock().unwrap();
            (state.recording.take(), state.faults.recording_error.clone())
        };
        let Some(path) = path else {
            warn!("stop_recording called while not recording");
            return;
        };
        let result = match error {
            Some(msg) => Err(BackendError::Recording(msg)),
            None => {
                // Placeholder movie payload; a real backend finalizes the
                // container here.
                std::fs::write(&path, b"avcam simulated movie")
                    .map_err(|e| BackendError::Recording(e.to_string()))
            }
        };
        info!(path = %path.display(), ok = result.is_ok(), "simulated recording finished");
        self.emit(BackendEvent::RecordingFinished { path, result });
    }

    fn capture_still(&mut self) -> BackendResult<()> {
        let (has_output, error) = {
            let state = self.shared.lock().unwrap();
            (
                state.outputs.contains(&OutputKind::StillImage),
                state.faults.still_error.clone(),
            )
        };
        if !has_output {
            return Err(BackendError::StillCapture("no still image output".into()));
        }
        let result = match error {
            Some(msg) => Err(BackendError::StillCapture(msg)),
            None => encode_test_frame().map_err(BackendError::StillCapture),
        };
        self.emit(BackendEvent::StillCaptured { result });
        Ok(())
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.shared.lock().unwrap().capabilities
    }

    fn lock_device_for_configuration(&mut self) -> BackendResult<()> {
        let mut state = self.shared.lock().unwrap();
        if state.faults.fail_lock {
            return Err(BackendError::LockFailed("device busy".into()));
        }
        if state.device_locked {
            return Err(BackendError::LockFailed("already locked".into()));
        }
        state.device_locked = true;
        Ok(())
    }

    fn unlock_device(&mut self) {
        self.shared.lock().unwrap().device_locked = false;
    }

    fn set_focus(&mut self, mode: FocusMode, point: PointOfInterest) {
        let mut state = self.shared.lock().unwrap();
        debug_assert!(state.device_locked, "focus requires the configuration lock");
        state.focus = Some((mode, point));
    }

    fn set_exposure(&mut self, mode: ExposureMode, point: PointOfInterest) {
        let mut state = self.shared.lock().unwrap();
        debug_assert!(
            state.device_locked,
            "exposure requires the configuration lock"
        );
        state.exposure = Some((mode, point));
    }

    fn set_flash(&mut self, mode: FlashMode) {
        let mut state = self.shared.lock().unwrap();
        if state.capabilities.flash {
            state.flash = mode;
        }
    }

    fn set_subject_area_monitoring(&mut self, enabled: bool) {
        self.shared.lock().unwrap().subject_area_monitoring = enabled;
    }
}

/// Synthesize a small gradient frame and JPEG-encode it
fn encode_test_frame() -> Result<Vec<u8>, String> {
    let width = 64u32;
    let height = 64u32;
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) * 255 / (width + height)) as u8,
        ])
    });
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 85);
    img.write_with_encoder(encoder)
        .map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Control handle for injecting faults and lifecycle events into a
/// [`SimulatedBackend`]
#[derive(Clone)]
pub struct SimControl {
    shared: Arc<Mutex<SimShared>>,
    events: UnboundedSender<BackendEvent>,
}

impl SimControl {
    /// Replace the enumerable device set (call before session setup)
    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        self.shared.lock().unwrap().devices = devices;
    }

    /// Override the reported device capabilities
    pub fn set_capabilities(&self, capabilities: DeviceCapabilities) {
        self.shared.lock().unwrap().capabilities = capabilities;
    }

    /// Make the session refuse this device id as an input
    pub fn refuse_input(&self, device_id: &str) {
        self.shared
            .lock()
            .unwrap()
            .faults
            .refuse_inputs
            .insert(device_id.to_string());
    }

    /// Accept a previously refused device id again
    pub fn allow_input(&self, device_id: &str) {
        self.shared
            .lock()
            .unwrap()
            .faults
            .refuse_inputs
            .remove(device_id);
    }

    /// Make `lock_device_for_configuration` fail
    pub fn fail_device_lock(&self, fail: bool) {
        self.shared.lock().unwrap().faults.fail_lock = fail;
    }

    /// Make `start_running` fail
    pub fn fail_start(&self, fail: bool) {
        self.shared.lock().unwrap().faults.fail_start = fail;
    }

    /// Make recordings finish with an error
    pub fn fail_recording(&self, message: Option<&str>) {
        self.shared.lock().unwrap().faults.recording_error = message.map(String::from);
    }

    /// Make still captures fail
    pub fn fail_still_capture(&self, message: Option<&str>) {
        self.shared.lock().unwrap().faults.still_error = message.map(String::from);
    }

    /// Inject a session runtime error
    pub fn inject_runtime_error(&self, cause: RuntimeErrorCause) {
        // A runtime error stops the session, as the platform does.
        self.shared.lock().unwrap().running = false;
        let _ = self.events.send(BackendEvent::RuntimeError(cause));
    }

    /// Inject a session interruption
    pub fn inject_interruption(&self, reason: InterruptionReason) {
        self.shared.lock().unwrap().running = false;
        let _ = self.events.send(BackendEvent::Interrupted(reason));
    }

    /// End a previously injected interruption
    pub fn end_interruption(&self) {
        self.shared.lock().unwrap().running = true;
        let _ = self.events.send(BackendEvent::InterruptionEnded);
    }

    /// Trigger a subject-area-change notification
    pub fn trigger_subject_area_change(&self) {
        let _ = self.events.send(BackendEvent::SubjectAreaChanged);
    }

    // ===== Inspection =====

    /// All committed configuration snapshots, oldest first
    pub fn snapshots(&self) -> Vec<ConfigSnapshot> {
        self.shared.lock().unwrap().snapshots.clone()
    }

    /// How many configuration transactions have been opened
    pub fn begin_count(&self) -> u64 {
        self.shared.lock().unwrap().begin_count
    }

    /// Devices currently attached as inputs
    pub fn current_inputs(&self) -> Vec<DeviceDescriptor> {
        self.shared.lock().unwrap().inputs.values().cloned().collect()
    }

    /// Every path a recording was started at, oldest first
    pub fn recording_paths(&self) -> Vec<PathBuf> {
        self.shared.lock().unwrap().recording_paths.clone()
    }

    /// Whether the simulated session is running
    pub fn is_running(&self) -> bool {
        self.shared.lock().unwrap().running
    }

    /// Whether the device-configuration lock is held
    pub fn is_device_locked(&self) -> bool {
        self.shared.lock().unwrap().device_locked
    }

    /// Whether subject-area monitoring is enabled
    pub fn subject_area_monitoring(&self) -> bool {
        self.shared.lock().unwrap().subject_area_monitoring
    }

    /// Last applied flash mode
    pub fn flash(&self) -> FlashMode {
        self.shared.lock().unwrap().flash
    }

    /// Last applied focus mode and point, if any
    pub fn focus(&self) -> Option<(FocusMode, PointOfInterest)> {
        self.shared.lock().unwrap().focus
    }

    /// Last applied exposure mode and point, if any
    pub fn exposure(&self) -> Option<(ExposureMode, PointOfInterest)> {
        self.shared.lock().unwrap().exposure
    }

    /// Orientation last applied to the given output
    pub fn output_orientation(&self, kind: OutputKind) -> Option<VideoOrientation> {
        self.shared.lock().unwrap().orientations.get(&kind).copied()
    }

    /// Whether stabilization is enabled on the movie connection
    pub fn stabilization(&self) -> bool {
        self.shared.lock().unwrap().stabilization
    }
}
