// SPDX-License-Identifier: MPL-2.0

//! Photo library save contract

use crate::errors::SaveError;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};

/// Storage collaborator for captured media.
///
/// The session worker calls these after the corresponding sink callback; save
/// failures are logged and translated to UI affordances, never propagated to
/// callers synchronously.
pub trait PhotoLibrary: Send + 'static {
    /// Prompt for (or confirm) write access to the library
    fn request_authorization(&self) -> BoxFuture<'static, bool>;

    /// Save a finished movie file.
    ///
    /// With `move_not_copy` the implementation may take ownership of the file
    /// (avoiding a second copy of the data on disk); otherwise the source is
    /// left in place for the caller to clean up.
    fn save_video(&self, path: &Path, move_not_copy: bool) -> Result<PathBuf, SaveError>;

    /// Save encoded image bytes (JPEG) as a new library asset
    fn save_image(&self, bytes: &[u8]) -> Result<PathBuf, SaveError>;
}
