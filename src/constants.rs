// SPDX-License-Identifier: MPL-2.0

//! Application-wide constants

/// File extension used for movie recordings
pub const MOVIE_EXTENSION: &str = "mov";

/// File extension used for saved photos
pub const PHOTO_EXTENSION: &str = "jpg";

/// Prefix for photo file names saved to the library (`photo_TIMESTAMP.jpg`)
pub const PHOTO_FILE_PREFIX: &str = "photo";

/// Prefix for video file names saved to the library (`video_TIMESTAMP.mov`)
pub const VIDEO_FILE_PREFIX: &str = "video";

/// Timestamp format for library file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Subdirectory under Pictures/Videos where the library stores media
pub const LIBRARY_SUBDIR: &str = "avcam";

/// Device point of interest used when the subject area changes (frame center)
pub const CENTER_POINT: (f32, f32) = (0.5, 0.5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_point_is_normalized() {
        assert!(CENTER_POINT.0 >= 0.0 && CENTER_POINT.0 <= 1.0);
        assert!(CENTER_POINT.1 >= 0.0 && CENTER_POINT.1 <= 1.0);
    }
}
