// SPDX-License-Identifier: MPL-2.0

//! Directory-backed photo library
//!
//! Saves photos under `~/Pictures/avcam` and videos under `~/Videos/avcam`
//! with timestamped file names. Implements the [`PhotoLibrary`] save contract.

use crate::constants::{
    FILE_TIMESTAMP_FORMAT, LIBRARY_SUBDIR, MOVIE_EXTENSION, PHOTO_EXTENSION, PHOTO_FILE_PREFIX,
    VIDEO_FILE_PREFIX,
};
use crate::errors::SaveError;
use crate::services::PhotoLibrary;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Photo library rooted at a pictures and a videos directory
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    pictures_dir: PathBuf,
    videos_dir: PathBuf,
}

impl DirectoryLibrary {
    /// Library at explicit directories
    pub fn new(pictures_dir: PathBuf, videos_dir: PathBuf) -> Self {
        Self {
            pictures_dir,
            videos_dir,
        }
    }

    /// Library at the host's default media directories
    /// (`~/Pictures/avcam`, `~/Videos/avcam`)
    pub fn at_default_dirs() -> Self {
        let pictures = dirs::picture_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(LIBRARY_SUBDIR);
        let videos = dirs::video_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(LIBRARY_SUBDIR);
        Self::new(pictures, videos)
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures_dir
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    fn timestamped_name(prefix: &str, extension: &str) -> String {
        let timestamp = chrono::Local::now().format(FILE_TIMESTAMP_FORMAT);
        format!("{}_{}.{}", prefix, timestamp, extension)
    }
}

impl PhotoLibrary for DirectoryLibrary {
    fn request_authorization(&self) -> BoxFuture<'static, bool> {
        // Directory-backed storage has no permission prompt.
        Box::pin(async { true })
    }

    fn save_video(&self, path: &Path, move_not_copy: bool) -> Result<PathBuf, SaveError> {
        if !path.exists() {
            return Err(SaveError::SourceMissing(path.to_path_buf()));
        }
        std::fs::create_dir_all(&self.videos_dir)?;
        let dest = self
            .videos_dir
            .join(Self::timestamped_name(VIDEO_FILE_PREFIX, MOVIE_EXTENSION));

        if move_not_copy {
            // Rename fails across filesystems; fall back to copy + remove.
            match std::fs::rename(path, &dest) {
                Ok(()) => {}
                Err(e) => {
                    debug!(error = %e, "rename failed, copying instead");
                    std::fs::copy(path, &dest)?;
                    std::fs::remove_file(path)?;
                }
            }
        } else {
            std::fs::copy(path, &dest)?;
        }

        info!(path = %dest.display(), "video saved to library");
        Ok(dest)
    }

    fn save_image(&self, bytes: &[u8]) -> Result<PathBuf, SaveError> {
        std::fs::create_dir_all(&self.pictures_dir)?;
        let dest = self
            .pictures_dir
            .join(Self::timestamped_name(PHOTO_FILE_PREFIX, PHOTO_EXTENSION));
        std::fs::write(&dest, bytes)?;
        info!(path = %dest.display(), bytes = bytes.len(), "photo saved to library");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_image_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(
            dir.path().join("pictures"),
            dir.path().join("videos"),
        );
        let dest = library.save_image(b"not really a jpeg").unwrap();
        assert!(dest.exists());
        assert_eq!(dest.extension().unwrap(), "jpg");
    }

    #[test]
    fn save_video_moves_source() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(
            dir.path().join("pictures"),
            dir.path().join("videos"),
        );
        let source = dir.path().join("clip.mov");
        std::fs::write(&source, b"movie").unwrap();

        let dest = library.save_video(&source, true).unwrap();
        assert!(dest.exists());
        assert!(!source.exists(), "move should consume the source file");
    }

    #[test]
    fn save_video_missing_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(
            dir.path().join("pictures"),
            dir.path().join("videos"),
        );
        let err = library
            .save_video(Path::new("/nonexistent/clip.mov"), true)
            .unwrap_err();
        assert!(matches!(err, SaveError::SourceMissing(_)));
    }
}
