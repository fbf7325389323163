// SPDX-License-Identifier: MPL-2.0

//! CLI commands for session operations
//!
//! This module provides command-line functionality for:
//! - Listing the backend's capture devices
//! - Taking a photo through a full session lifecycle
//! - Recording a timed video
//!
//! All commands run against the simulated backend; they exist to exercise
//! and demonstrate the session state machine end to end.

use avcam::backends::sim::SimulatedBackend;
use avcam::backends::{BackendEvent, CaptureBackend, MediaKind};
use avcam::errors::SessionError;
use avcam::session::{CaptureSessionManager, SessionServices, SetupResult};
use avcam::storage::DirectoryLibrary;
use avcam::Config;
use std::time::Duration;
use tokio::sync::mpsc;

fn setup_error(result: SetupResult) -> SessionError {
    match result {
        SetupResult::CameraNotAuthorized => SessionError::AuthorizationDenied,
        _ => SessionError::ConfigurationFailed("required input or output missing".into()),
    }
}

fn library_from_config(config: &Config) -> DirectoryLibrary {
    let default = DirectoryLibrary::at_default_dirs();
    DirectoryLibrary::new(
        config
            .pictures_dir
            .clone()
            .unwrap_or_else(|| default.pictures_dir().to_path_buf()),
        config
            .videos_dir
            .clone()
            .unwrap_or_else(|| default.videos_dir().to_path_buf()),
    )
}

fn spawn_session(config: Config) -> (CaptureSessionManager, DirectoryLibrary) {
    let library = library_from_config(&config);
    let (events_tx, events_rx) = mpsc::unbounded_channel::<BackendEvent>();
    let (backend, _control) = SimulatedBackend::new(events_tx);
    let services = SessionServices {
        library: Box::new(library.clone()),
        ..SessionServices::default()
    };
    let manager =
        CaptureSessionManager::new(Box::new(backend), events_rx, config, services);
    (manager, library)
}

/// List all capture devices the backend reports
pub async fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let (events_tx, _events_rx) = mpsc::unbounded_channel::<BackendEvent>();
    let (backend, _control) = SimulatedBackend::new(events_tx);

    println!("Video devices:");
    for device in backend.devices(MediaKind::Video) {
        println!("  [{}] {} ({})", device.id, device.name, device.position);
    }
    println!("Audio devices:");
    for device in backend.devices(MediaKind::Audio) {
        println!("  [{}] {}", device.id, device.name);
    }
    Ok(())
}

/// Take a photo: configure, start, capture, save
pub async fn take_photo(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let (manager, library) = spawn_session(config);

    manager.initialize();
    manager.start();
    manager.flush().await;

    let snapshot = manager.snapshot();
    if snapshot.setup_result != SetupResult::Success {
        return Err(setup_error(snapshot.setup_result).into());
    }

    manager.capture_still();
    manager.flush().await;
    manager.stop();
    manager.flush().await;

    println!("Photo saved under {}", library.pictures_dir().display());
    Ok(())
}

/// Record a video for the given duration, then save it
pub async fn record_video(
    config: Config,
    duration_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (manager, library) = spawn_session(config);

    manager.initialize();
    manager.start();
    manager.flush().await;

    let snapshot = manager.snapshot();
    if snapshot.setup_result != SetupResult::Success {
        return Err(setup_error(snapshot.setup_result).into());
    }

    println!("Recording for {} seconds...", duration_secs);
    manager.toggle_recording();
    manager.flush().await;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;
    manager.toggle_recording();

    // Completion is signaled by the movie sink, not by the stop request.
    let mut snapshots = manager.snapshots();
    let _ = snapshots.wait_for(|s| !s.recording && s.record_enabled).await;

    manager.stop();
    manager.flush().await;

    println!("Video saved under {}", library.videos_dir().display());
    Ok(())
}
