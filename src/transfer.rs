//! Moving files into the archive.
//!
//! A transfer first tries an atomic rename. When the rename is refused, for
//! example because the archive lives on another volume, it degrades to a
//! byte-for-byte copy followed by removal of the source.
//!
//! Filesystem access goes through the [`FileSystem`] trait so the fallback can
//! be exercised without a second volume.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures of a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination directory could not be created. Nothing was moved.
    #[error("Failed to create directory {} for {}: {source}", dir.display(), from.display())]
    CreateDir {
        from: PathBuf,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rename failed and so did the copy. The source is untouched and any
    /// partial destination file written by the copy has been removed.
    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy succeeded but the source could not be removed.
    /// Both files now exist.
    #[error(
        "Copied {} to {} but failed to remove the source: {source}",
        from.display(),
        to.display()
    )]
    RemoveSource {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// The file that was being transferred.
    pub fn source_path(&self) -> &Path {
        match self {
            Self::CreateDir { from, .. } | Self::Copy { from, .. } | Self::RemoveSource { from, .. } => {
                from
            }
        }
    }
}

/// How a successful transfer was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    /// A single rename.
    Renamed,
    /// Copy then delete, after the rename was refused.
    Copied,
}

/// The filesystem operations a transfer needs.
pub trait FileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Relocates files with a rename-then-copy strategy.
pub struct Transfer<F: FileSystem = StdFileSystem> {
    fs: F,
}

impl Transfer<StdFileSystem> {
    /// Creates a transfer backed by the real filesystem.
    pub fn new() -> Self {
        Self { fs: StdFileSystem }
    }
}

impl Default for Transfer<StdFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Transfer<F> {
    /// Creates a transfer over a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    /// Returns the underlying filesystem.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Moves `from` to `to`, creating the parent directory of `to` first.
    ///
    /// # Errors
    ///
    /// * [`TransferError::CreateDir`] if the parent directory cannot be created.
    /// * [`TransferError::Copy`] if both rename and copy fail; `from` is
    ///   untouched and a partially written `to` is cleaned up.
    /// * [`TransferError::RemoveSource`] if the copy succeeded but `from` could
    ///   not be removed; `to` already holds the content.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediatidy::transfer::Transfer;
    /// use std::path::Path;
    ///
    /// let method = Transfer::new()
    ///     .relocate(Path::new("/in/a.jpg"), Path::new("/out/images/2023/05/01-05-2023-10-00-00.jpg"))
    ///     .unwrap();
    /// println!("{:?}", method);
    /// ```
    pub fn relocate(&self, from: &Path, to: &Path) -> Result<TransferMethod, TransferError> {
        if let Some(dir) = to.parent() {
            self.fs
                .create_dir_all(dir)
                .map_err(|source| TransferError::CreateDir {
                    from: from.to_path_buf(),
                    dir: dir.to_path_buf(),
                    source,
                })?;
        }

        match self.fs.rename(from, to) {
            Ok(()) => Ok(TransferMethod::Renamed),
            Err(rename_err) => {
                log::debug!(
                    "Rename {:?} -> {:?} failed ({}), falling back to copy",
                    from,
                    to,
                    rename_err
                );
                let preexisting = self.fs.exists(to);
                if let Err(source) = self.fs.copy(from, to) {
                    if !preexisting
                        && self.fs.exists(to)
                        && let Err(e) = self.fs.remove_file(to)
                    {
                        log::warn!("Could not remove partial copy {:?}: {}", to, e);
                    }
                    return Err(TransferError::Copy {
                        from: from.to_path_buf(),
                        to: to.to_path_buf(),
                        source,
                    });
                }
                self.fs
                    .remove_file(from)
                    .map_err(|source| TransferError::RemoveSource {
                        from: from.to_path_buf(),
                        to: to.to_path_buf(),
                        source,
                    })?;
                Ok(TransferMethod::Copied)
            }
        }
    }
}
