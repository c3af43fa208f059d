//! Collision-safe archive naming.
//!
//! Files are named after their resolved timestamp at one-second resolution,
//! `DD-MM-YYYY-HH-MM-SS`. Files that share a formatted timestamp within a run
//! are told apart by a two-digit suffix handed out in processing order:
//! the first gets the bare name, then `-01`, `-02`, ...

use crate::media_kind::MediaKind;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// chrono format for archive file names.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y-%H-%M-%S";

/// Formats a timestamp as used in archive file names.
///
/// ```
/// use chrono::NaiveDate;
/// use mediatidy::naming::format_timestamp;
///
/// let ts = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// assert_eq!(format_timestamp(&ts), "01-05-2023-10-00-00");
/// ```
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Returns `<target>/<images|videos>/<YYYY>/<MM>` for archived kinds.
///
/// Returns `None` for [`MediaKind::Other`], which is never relocated.
pub fn destination_dir(target: &Path, kind: MediaKind, timestamp: &NaiveDateTime) -> Option<PathBuf> {
    let kind_dir = kind.dir_name()?;
    Some(
        target
            .join(kind_dir)
            .join(timestamp.format("%Y").to_string())
            .join(timestamp.format("%m").to_string()),
    )
}

/// Hands out unique file names for one run.
///
/// Holds the per-timestamp collision counters. A fresh allocator starts every
/// timestamp at index 0; nothing is shared between allocators.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counters: HashMap<String, u32>,
}

impl NameAllocator {
    /// Creates an allocator with no timestamps seen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next file name for `timestamp` with extension `ext`.
    ///
    /// `ext` is appended verbatim and is expected to be lowercase with its
    /// leading dot, e.g. `".jpg"`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use mediatidy::naming::NameAllocator;
    ///
    /// let ts = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
    /// let mut names = NameAllocator::new();
    /// assert_eq!(names.allocate(&ts, ".jpg"), "01-05-2023-10-00-00.jpg");
    /// assert_eq!(names.allocate(&ts, ".jpg"), "01-05-2023-10-00-00-01.jpg");
    /// ```
    pub fn allocate(&mut self, timestamp: &NaiveDateTime, ext: &str) -> String {
        let stamp = format_timestamp(timestamp);
        let counter = self.counters.entry(stamp.clone()).or_insert(0);
        let index = *counter;
        *counter += 1;

        if index == 0 {
            format!("{}{}", stamp, ext)
        } else {
            format!("{}-{:02}{}", stamp, index, ext)
        }
    }
}
