// SPDX-License-Identifier: MPL-2.0

//! Preview surface
//!
//! A passive rendering target bound 1:1 to a session. It holds a shared
//! reference to the session (the UI layer governs its lifetime) and the
//! current video orientation, which the worker reads when it applies
//! orientation to an output connection before recording or still capture.

use crate::backends::VideoOrientation;
use crate::session::CaptureSessionManager;
use std::sync::{Arc, Mutex};

/// Rendering target for the session's live video feed
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    session: CaptureSessionManager,
    orientation: Arc<Mutex<VideoOrientation>>,
}

impl PreviewSurface {
    pub(crate) fn bind(
        session: CaptureSessionManager,
        orientation: Arc<Mutex<VideoOrientation>>,
    ) -> Self {
        Self {
            session,
            orientation,
        }
    }

    /// The session this surface renders
    pub fn session(&self) -> &CaptureSessionManager {
        &self.session
    }

    /// Current video orientation of the preview
    pub fn video_orientation(&self) -> VideoOrientation {
        *self.orientation.lock().unwrap()
    }

    /// Update the orientation after a rotation event.
    ///
    /// Capture connections pick this up the next time a recording or still
    /// capture starts.
    pub fn set_video_orientation(&self, orientation: VideoOrientation) {
        *self.orientation.lock().unwrap() = orientation;
    }
}
