//! Media classification by file extension.
//!
//! Only two fixed extension sets are recognised. Everything else is
//! [`MediaKind::Other`] and is left where it is.
//!
//! # Examples
//!
//! ```
//! use mediatidy::media_kind::MediaKind;
//! use std::path::Path;
//!
//! assert_eq!(MediaKind::from_path(Path::new("IMG_0001.JPG")), MediaKind::Image);
//! assert_eq!(MediaKind::from_path(Path::new("clip.mkv")), MediaKind::Video);
//! assert_eq!(MediaKind::from_path(Path::new("notes.txt")), MediaKind::Other);
//! ```
use std::path::Path;

/// Recognised image extensions, lowercase, with the leading dot.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"];

/// Recognised video extensions, lowercase, with the leading dot.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".mkv", ".vob", ".flv", ".wmv", ".webm", ".mpg",
];

/// Broad media kind of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still images (JPEG, PNG, GIF, ...)
    Image,
    /// Video files (MP4, MOV, MKV, ...)
    Video,
    /// Anything outside the two recognised sets
    Other,
}

impl MediaKind {
    /// Classifies a lowercase extension including its leading dot, e.g. `".jpg"`.
    pub fn from_extension(ext: &str) -> Self {
        if IMAGE_EXTENSIONS.contains(&ext) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// Classifies a path by its lowercased extension.
    pub fn from_path(path: &Path) -> Self {
        match normalized_extension(path) {
            Some(ext) => Self::from_extension(&ext),
            None => MediaKind::Other,
        }
    }

    /// Returns the top-level archive directory for this kind, if it is archived at all.
    ///
    /// ```
    /// use mediatidy::media_kind::MediaKind;
    ///
    /// assert_eq!(MediaKind::Image.dir_name(), Some("images"));
    /// assert_eq!(MediaKind::Video.dir_name(), Some("videos"));
    /// assert_eq!(MediaKind::Other.dir_name(), None);
    /// ```
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            MediaKind::Image => Some("images"),
            MediaKind::Video => Some("videos"),
            MediaKind::Other => None,
        }
    }

    /// Returns true for kinds that are hashed and placed in the archive.
    pub fn is_media(&self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

/// Returns the lowercased extension of `path` with a leading dot, e.g. `".jpeg"`.
pub fn normalized_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
