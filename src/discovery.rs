//! Source tree discovery.

use crate::config::CompiledFilters;
use crate::error::{OrganizeError, OrganizeResult};
use crate::media_kind::MediaKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files found under the source directory, in processing order.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Regular files that passed the filters, lexical depth-first.
    pub files: Vec<PathBuf>,
    /// Regular files dropped by the filters.
    pub filtered: usize,
    /// Images and videos among `filtered` that were dropped for being hidden.
    pub hidden_media: usize,
}

/// Walks `source` and collects candidate files.
///
/// Entries are sorted by file name within each directory, so the order is
/// deterministic. Symlinks are not followed. When `target` lies inside
/// `source` the target subtree is skipped, so archived files are never picked
/// up again. An unreadable directory aborts the walk.
pub fn discover_files(
    source: &Path,
    target: &Path,
    filters: &CompiledFilters,
) -> OrganizeResult<Discovery> {
    log::info!("Starting file discovery in {}", source.display());
    let nested = nested_target(source, target);
    if let Some(ref dir) = nested {
        log::debug!("Skipping archive directory inside source: {}", dir.display());
    }

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| nested.as_deref() != Some(entry.path()));

    let mut discovery = Discovery::default();
    for entry in walker {
        let entry = entry.map_err(|err| OrganizeError::Walk {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source.to_path_buf()),
            source: err,
        })?;

        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        if filters.should_include(relative) {
            discovery.files.push(entry.into_path());
        } else {
            log::debug!("Filtered out: {:?}", entry.path());
            discovery.filtered += 1;
            if filters.skips_as_hidden(relative) && MediaKind::from_path(relative).is_media() {
                discovery.hidden_media += 1;
            }
        }
    }

    log::info!(
        "Discovered {} file(s), {} filtered",
        discovery.files.len(),
        discovery.filtered
    );
    Ok(discovery)
}

/// Returns the walk path of `target` when it is strictly inside `source`.
fn nested_target(source: &Path, target: &Path) -> Option<PathBuf> {
    let source_abs = source.canonicalize().ok()?;
    let target_abs = target.canonicalize().ok()?;
    if target_abs == source_abs {
        return None;
    }
    let relative = target_abs.strip_prefix(&source_abs).ok()?;
    Some(source.join(relative))
}
