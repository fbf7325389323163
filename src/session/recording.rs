// SPDX-License-Identifier: MPL-2.0

//! In-progress movie recording bookkeeping

use crate::constants::MOVIE_EXTENSION;
use crate::services::{BackgroundExecutor, TaskId};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One in-progress movie recording: a unique temporary output path plus the
/// optional background-execution token protecting the save.
///
/// Created when recording starts, destroyed after the file has been handed to
/// storage (moved or deleted) and the token released. The token is a
/// single-slot resource: [`RecordingSession::end_background_task`] releases
/// it at most once, from whichever path observes the finish callback first.
#[derive(Debug)]
pub struct RecordingSession {
    path: PathBuf,
    background_task: Option<TaskId>,
}

impl RecordingSession {
    /// Begin a recording session with a fresh unique temp path.
    ///
    /// The path embeds a v4 UUID, so a new recording started before a prior
    /// recording's file has been saved never collides with it.
    pub fn begin(background: &dyn BackgroundExecutor) -> Self {
        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), MOVIE_EXTENSION);
        Self {
            path: std::env::temp_dir().join(file_name),
            background_task: background.begin(),
        }
    }

    /// Output file path for this recording
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a background token is held
    pub fn has_background_task(&self) -> bool {
        self.background_task.is_some()
    }

    /// Release the background token, if one was acquired and not yet ended
    pub fn end_background_task(&mut self, background: &dyn BackgroundExecutor) {
        if let Some(task) = self.background_task.take() {
            background.end(task);
        }
    }

    /// Remove the temporary file if it still exists and release the token.
    ///
    /// Called after a successful save (the file may already have been moved)
    /// and after a failed recording or save alike.
    pub fn cleanup(mut self, background: &dyn BackgroundExecutor) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "error removing temporary file");
            }
        }
        self.end_background_task(background);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NoBackgrounding;
    use crate::services::background::CountingExecutor;

    #[test]
    fn paths_are_unique_across_sessions() {
        let a = RecordingSession::begin(&NoBackgrounding);
        let b = RecordingSession::begin(&NoBackgrounding);
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with(".mov"));
    }

    #[test]
    fn token_released_exactly_once() {
        let exec = CountingExecutor::new();
        let mut session = RecordingSession::begin(&exec);
        assert!(session.has_background_task());
        assert_eq!(exec.active(), 1);

        session.end_background_task(&exec);
        session.end_background_task(&exec);
        assert_eq!(exec.active(), 0);
        assert_eq!(exec.issued(), 1);
    }

    #[test]
    fn cleanup_removes_leftover_file_and_token() {
        let exec = CountingExecutor::new();
        let session = RecordingSession::begin(&exec);
        std::fs::write(session.path(), b"partial").unwrap();
        let path = session.path().to_path_buf();

        session.cleanup(&exec);
        assert!(!path.exists());
        assert_eq!(exec.active(), 0);
    }

    #[test]
    fn no_backgrounding_still_records() {
        let session = RecordingSession::begin(&NoBackgrounding);
        assert!(!session.has_background_task());
    }
}
