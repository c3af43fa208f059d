//! Timestamp resolution through an ordered chain of date providers.
//!
//! Each [`MediaKind`] owns a chain of [`DateProvider`]s. [`DateResolver::resolve`]
//! tries them in order and returns the first timestamp produced, together with
//! the failures of the providers it had to skip. When every provider fails the
//! resolver reports [`DateError::Exhausted`]; substituting the current time is
//! left to the caller.
//!
//! Default chains:
//!
//! | Kind  | Providers                         |
//! |-------|-----------------------------------|
//! | Image | EXIF date taken, modification time |
//! | Video | modification time                 |
//! | Other | modification time                 |

use crate::media_kind::MediaKind;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a provider (or the whole chain) could not produce a timestamp.
#[derive(Debug, Error)]
pub enum DateError {
    /// The file could not be opened for metadata decoding.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The embedded metadata block is missing or malformed.
    #[error("cannot decode EXIF data in {}: {source}", path.display())]
    ExifDecode {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },

    /// The metadata decoded but carries no date-taken field.
    #[error("no date-taken field in {}", path.display())]
    MissingTag { path: PathBuf },

    /// A date field is present but cannot be read as a calendar date.
    #[error("invalid date value {value:?} in {}", path.display())]
    InvalidValue { path: PathBuf, value: String },

    /// The filesystem would not report a modification time.
    #[error("cannot read modification time of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every provider in the chain failed.
    #[error("no date could be resolved for {}: {}", path.display(), join_failures(failures))]
    Exhausted {
        path: PathBuf,
        failures: Vec<DateError>,
    },
}

fn join_failures(failures: &[DateError]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single source of "when was this media created".
pub trait DateProvider {
    /// Short name used in diagnostics, e.g. `"exif"`.
    fn name(&self) -> &'static str;

    /// Returns the local timestamp for the file, or why none is available.
    fn date_for(&self, path: &Path) -> Result<NaiveDateTime, DateError>;
}

/// Reads the date taken from embedded EXIF metadata.
///
/// `DateTimeOriginal` is preferred; `DateTime` is used when the original
/// capture time is absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifDateProvider;

impl DateProvider for ExifDateProvider {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn date_for(&self, path: &Path) -> Result<NaiveDateTime, DateError> {
        let file = File::open(path).map_err(|source| DateError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let exif = exif::Reader::new()
            .read_from_container(&mut reader)
            .map_err(|source| DateError::ExifDecode {
                path: path.to_path_buf(),
                source,
            })?;

        for tag in [exif::Tag::DateTimeOriginal, exif::Tag::DateTime] {
            if let Some(field) = exif.get_field(tag, exif::In::PRIMARY) {
                return parse_exif_value(path, &field.value);
            }
        }

        Err(DateError::MissingTag {
            path: path.to_path_buf(),
        })
    }
}

/// Converts an EXIF ASCII date (`YYYY:MM:DD HH:MM:SS`) into a naive timestamp.
fn parse_exif_value(path: &Path, value: &exif::Value) -> Result<NaiveDateTime, DateError> {
    let invalid = |value: String| DateError::InvalidValue {
        path: path.to_path_buf(),
        value,
    };

    let raw = match value {
        exif::Value::Ascii(parts) if !parts.is_empty() => &parts[0],
        other => return Err(invalid(format!("{:?}", other))),
    };

    let dt = exif::DateTime::from_ascii(raw)
        .map_err(|_| invalid(String::from_utf8_lossy(raw).into_owned()))?;

    NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())
        .and_then(|date| date.and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into()))
        .ok_or_else(|| invalid(String::from_utf8_lossy(raw).into_owned()))
}

/// Uses the filesystem modification time, in local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModifiedTimeProvider;

impl DateProvider for ModifiedTimeProvider {
    fn name(&self) -> &'static str {
        "mtime"
    }

    fn date_for(&self, path: &Path) -> Result<NaiveDateTime, DateError> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| DateError::Metadata {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(DateTime::<Local>::from(modified).naive_local())
    }
}

/// A timestamp together with how it was obtained.
#[derive(Debug)]
pub struct ResolvedDate {
    /// The resolved local timestamp.
    pub timestamp: NaiveDateTime,
    /// Name of the provider that produced it.
    pub provider: &'static str,
    /// Failures of the higher-priority providers that were skipped.
    pub skipped: Vec<DateError>,
}

/// Resolves a timestamp per [`MediaKind`] through ordered provider chains.
pub struct DateResolver {
    images: Vec<Box<dyn DateProvider>>,
    videos: Vec<Box<dyn DateProvider>>,
    others: Vec<Box<dyn DateProvider>>,
}

impl DateResolver {
    /// Creates a resolver with the default chains.
    pub fn new() -> Self {
        Self {
            images: vec![Box::new(ExifDateProvider), Box::new(ModifiedTimeProvider)],
            videos: vec![Box::new(ModifiedTimeProvider)],
            others: vec![Box::new(ModifiedTimeProvider)],
        }
    }

    /// Replaces the provider chain used for `kind`.
    pub fn with_chain(mut self, kind: MediaKind, providers: Vec<Box<dyn DateProvider>>) -> Self {
        match kind {
            MediaKind::Image => self.images = providers,
            MediaKind::Video => self.videos = providers,
            MediaKind::Other => self.others = providers,
        }
        self
    }

    /// Returns the provider chain used for `kind`, in priority order.
    pub fn chain(&self, kind: MediaKind) -> &[Box<dyn DateProvider>] {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
            MediaKind::Other => &self.others,
        }
    }

    /// Tries each provider for `kind` in order until one succeeds.
    ///
    /// Never substitutes the current time; an exhausted chain is an error that
    /// carries every provider failure.
    pub fn resolve(&self, path: &Path, kind: MediaKind) -> Result<ResolvedDate, DateError> {
        let mut failures = Vec::new();

        for provider in self.chain(kind) {
            match provider.date_for(path) {
                Ok(timestamp) => {
                    return Ok(ResolvedDate {
                        timestamp,
                        provider: provider.name(),
                        skipped: failures,
                    });
                }
                Err(e) => {
                    log::debug!("Date provider '{}' failed: {}", provider.name(), e);
                    failures.push(e);
                }
            }
        }

        Err(DateError::Exhausted {
            path: path.to_path_buf(),
            failures,
        })
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}
