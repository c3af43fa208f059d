//! The organize pipeline.
//!
//! One [`OrganizePipeline`] is one run. It owns the run-wide state (content
//! fingerprints already seen and the per-timestamp name counters) and drives
//! every file through the same steps, strictly in walk order:
//!
//! 1. classify by extension; anything that is not an image or a video is left
//!    alone and never hashed
//! 2. fingerprint the content; a fingerprint seen before marks a duplicate,
//!    which is deleted outside dry-run (best effort)
//! 3. record the new fingerprint, then resolve the timestamp, falling back to
//!    the current time when every date provider fails
//! 4. allocate `<target>/<kind>/<YYYY>/<MM>/<DD-MM-YYYY-HH-MM-SS>[-NN].<ext>`
//! 5. transfer the file, or only report the plan in dry-run
//!
//! Fingerprint and transfer failures abort the run unless failure isolation is
//! enabled, in which case they become a per-file [`FileOutcome::Failed`].

use crate::config::CompiledFilters;
use crate::date_resolver::DateResolver;
use crate::discovery::discover_files;
use crate::error::OrganizeResult;
use crate::fingerprint::ContentFingerprinter;
use crate::media_kind::{MediaKind, normalized_extension};
use crate::naming::{NameAllocator, destination_dir};
use crate::output::OutputFormatter;
use crate::transfer::{FileSystem, StdFileSystem, Transfer, TransferMethod};
use chrono::{Local, NaiveDateTime};
use indicatif::ProgressBar;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// The three invocation values plus run switches.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory to organize. Must exist.
    pub source: PathBuf,
    /// Archive root. Must exist.
    pub target: PathBuf,
    /// Report decisions without touching the filesystem.
    pub dry_run: bool,
    /// Keep going after a per-file fatal error.
    pub isolate_failures: bool,
}

impl RunOptions {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            dry_run,
            isolate_failures: false,
        }
    }
}

/// Everything decided about one media file before it is transferred.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub source: PathBuf,
    pub kind: MediaKind,
    pub fingerprint: String,
    pub timestamp: NaiveDateTime,
    pub destination: PathBuf,
}

/// Terminal outcome for one media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file now lives at `destination`.
    Moved {
        source: PathBuf,
        destination: PathBuf,
        method: TransferMethod,
    },
    /// Dry-run: the file would have been moved to `destination`.
    Planned {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Same content as `original`, seen earlier in this run.
    /// `removed` is false in dry-run or when deleting the duplicate failed.
    Duplicate {
        source: PathBuf,
        original: PathBuf,
        removed: bool,
    },
    /// The file could not be handled; only produced with failure isolation.
    Failed { source: PathBuf, cause: String },
}

impl FileOutcome {
    /// Archive path chosen for the file, for moved and planned files.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::Moved { destination, .. } | Self::Planned { destination, .. } => {
                Some(destination)
            }
            _ => None,
        }
    }
}

/// Result of a complete run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per media file, in processing order.
    pub outcomes: Vec<FileOutcome>,
    /// Files left alone because they are neither images nor videos.
    pub ignored: usize,
    /// Files dropped by the configured filters.
    pub filtered: usize,
    /// Hidden images and videos among `filtered`.
    pub hidden_media: usize,
    /// Files whose timestamp fell back to the current time.
    pub wall_clock_fallbacks: usize,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(*o)).count()
    }

    pub fn moved(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Moved { .. }))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Planned { .. }))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Duplicate { .. }))
    }

    pub fn duplicates_removed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Duplicate { removed: true, .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// Rows for [`OutputFormatter::summary_table`].
    pub fn summary_rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Moved", self.moved()),
            ("Planned", self.planned()),
            ("Duplicates", self.duplicates()),
            ("Ignored", self.ignored),
            ("Filtered", self.filtered),
            ("Errors", self.failed()),
        ]
    }
}

/// One organize run over a source tree.
pub struct OrganizePipeline<F: FileSystem = StdFileSystem> {
    options: RunOptions,
    resolver: DateResolver,
    transfer: Transfer<F>,
    clock: Box<dyn Fn() -> NaiveDateTime>,
    progress: Option<ProgressBar>,
    seen_hashes: HashMap<String, PathBuf>,
    names: NameAllocator,
    /// Destinations handed out so far in this run.
    claimed: HashSet<PathBuf>,
    /// Source paths this run has moved or deleted (or would have, in dry-run).
    vacated: HashSet<PathBuf>,
    wall_clock_fallbacks: usize,
}

impl OrganizePipeline<StdFileSystem> {
    /// Creates a pipeline with the default date chains on the real filesystem.
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            resolver: DateResolver::new(),
            transfer: Transfer::new(),
            clock: Box::new(|| Local::now().naive_local()),
            progress: None,
            seen_hashes: HashMap::new(),
            names: NameAllocator::new(),
            claimed: HashSet::new(),
            vacated: HashSet::new(),
            wall_clock_fallbacks: 0,
        }
    }
}

impl<F: FileSystem> OrganizePipeline<F> {
    /// Replaces the date resolver.
    pub fn with_resolver(mut self, resolver: DateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the transfer strategy (and the filesystem it runs on).
    pub fn with_transfer<G: FileSystem>(self, transfer: Transfer<G>) -> OrganizePipeline<G> {
        OrganizePipeline {
            options: self.options,
            resolver: self.resolver,
            transfer,
            clock: self.clock,
            progress: self.progress,
            seen_hashes: self.seen_hashes,
            names: self.names,
            claimed: self.claimed,
            vacated: self.vacated,
            wall_clock_fallbacks: self.wall_clock_fallbacks,
        }
    }

    /// Replaces the clock used when no date can be resolved.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Reports progress on `bar`; console lines are printed around it.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Fingerprints recorded so far, mapped to the first file seen with each.
    pub fn seen_hashes(&self) -> &HashMap<String, PathBuf> {
        &self.seen_hashes
    }

    /// Discovers files under the source and processes each in walk order.
    ///
    /// Returns the first fatal error unless failure isolation is enabled, in
    /// which case each error is printed and recorded as a failed outcome.
    /// Files transferred before a fatal error stay where they are.
    pub fn run(&mut self, filters: &CompiledFilters) -> OrganizeResult<RunReport> {
        let discovery = discover_files(&self.options.source, &self.options.target, filters)?;
        if let Some(pb) = &self.progress {
            pb.set_length(discovery.files.len() as u64);
        }

        let mut report = RunReport {
            filtered: discovery.filtered,
            hidden_media: discovery.hidden_media,
            ..Default::default()
        };

        for path in &discovery.files {
            match self.process_file(path) {
                Ok(Some(outcome)) => report.outcomes.push(outcome),
                Ok(None) => report.ignored += 1,
                Err(e) => {
                    if !self.options.isolate_failures {
                        // The caller reports the error that ends the run.
                        self.finish_progress();
                        return Err(e);
                    }
                    self.emit(|| OutputFormatter::error(&e.to_string()));
                    report.outcomes.push(FileOutcome::Failed {
                        source: path.clone(),
                        cause: e.to_string(),
                    });
                }
            }
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        self.finish_progress();
        report.wall_clock_fallbacks = self.wall_clock_fallbacks;
        Ok(report)
    }

    /// Runs one file through the pipeline.
    ///
    /// Returns `Ok(None)` for files that are neither images nor videos.
    pub fn process_file(&mut self, path: &Path) -> OrganizeResult<Option<FileOutcome>> {
        let kind = MediaKind::from_path(path);
        let ext = match normalized_extension(path) {
            Some(ext) if kind.is_media() => ext,
            _ => {
                log::debug!("Leaving {:?} in place: not an image or video", path);
                return Ok(None);
            }
        };

        let fingerprint = ContentFingerprinter::fingerprint(path)?;
        if let Some(original) = self.seen_hashes.get(&fingerprint).cloned() {
            return Ok(Some(self.handle_duplicate(path, original)));
        }
        self.seen_hashes
            .insert(fingerprint.clone(), path.to_path_buf());

        let timestamp = self.resolve_timestamp(path, kind);
        let Some(dir) = destination_dir(&self.options.target, kind, &timestamp) else {
            return Ok(None);
        };
        let destination = self.allocate_destination(path, &dir, &timestamp, &ext);

        let record = FileRecord {
            source: path.to_path_buf(),
            kind,
            fingerprint,
            timestamp,
            destination,
        };
        log::trace!("Planned {:?}", record);

        if self.options.dry_run {
            self.emit(|| {
                OutputFormatter::dry_run_notice(&format!(
                    "File would be moved and renamed: {} -> {}",
                    record.source.display(),
                    record.destination.display()
                ))
            });
            return Ok(Some(FileOutcome::Planned {
                source: record.source,
                destination: record.destination,
            }));
        }

        let method = match self.transfer.relocate(&record.source, &record.destination) {
            Ok(method) => method,
            Err(e) => {
                self.vacated.remove(&record.source);
                return Err(e.into());
            }
        };
        self.emit(|| {
            OutputFormatter::success(&format!(
                "Moved and renamed: {} -> {}",
                record.source.display(),
                record.destination.display()
            ))
        });
        Ok(Some(FileOutcome::Moved {
            source: record.source,
            destination: record.destination,
            method,
        }))
    }

    fn handle_duplicate(&mut self, path: &Path, original: PathBuf) -> FileOutcome {
        self.emit(|| {
            OutputFormatter::warning(&format!(
                "Duplicate file found: {} (duplicate of {})",
                path.display(),
                original.display()
            ))
        });

        let removed = if self.options.dry_run {
            false
        } else {
            match self.transfer.fs().remove_file(path) {
                Ok(()) => {
                    self.emit(|| {
                        OutputFormatter::info(&format!("Deleted duplicate file: {}", path.display()))
                    });
                    true
                }
                Err(e) => {
                    self.emit(|| {
                        OutputFormatter::error(&format!(
                            "Error deleting file {}: {}",
                            path.display(),
                            e
                        ))
                    });
                    false
                }
            }
        };

        if removed || self.options.dry_run {
            self.vacated.insert(path.to_path_buf());
        }

        FileOutcome::Duplicate {
            source: path.to_path_buf(),
            original,
            removed,
        }
    }

    fn resolve_timestamp(&mut self, path: &Path, kind: MediaKind) -> NaiveDateTime {
        match self.resolver.resolve(path, kind) {
            Ok(resolved) => {
                for skipped in &resolved.skipped {
                    log::info!("{}; trying the next date source", skipped);
                }
                log::debug!(
                    "Resolved {:?} to {} via {}",
                    path,
                    resolved.timestamp,
                    resolved.provider
                );
                resolved.timestamp
            }
            Err(e) => {
                self.wall_clock_fallbacks += 1;
                let now = (self.clock)();
                self.emit(|| {
                    OutputFormatter::warning(&format!(
                        "Error extracting date for file {}: {}. Using current time.",
                        path.display(),
                        e
                    ))
                });
                now
            }
        }
    }

    /// Allocates the next free name for `timestamp` and claims it.
    ///
    /// A name is taken when this run already handed it out, or when a file
    /// exists there that this run has not moved away. Dry-run and real runs
    /// share this view, so they pick the same names. `source` itself is
    /// vacated here, which lets a file that already carries its archive name
    /// keep it.
    fn allocate_destination(
        &mut self,
        source: &Path,
        dir: &Path,
        timestamp: &NaiveDateTime,
        ext: &str,
    ) -> PathBuf {
        self.vacated.insert(source.to_path_buf());
        loop {
            let candidate = dir.join(self.names.allocate(timestamp, ext));
            if !self.is_taken(&candidate) {
                self.claimed.insert(candidate.clone());
                return candidate;
            }
            log::info!(
                "{} is taken, trying the next suffix",
                candidate.display()
            );
        }
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.claimed.contains(path)
            || (!self.vacated.contains(path) && self.transfer.fs().exists(path))
    }

    fn emit(&self, line: impl FnOnce()) {
        match &self.progress {
            Some(pb) => pb.suspend(line),
            None => line(),
        }
    }

    fn finish_progress(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }
}
