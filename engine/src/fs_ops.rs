//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Listing the visible entries of a directory
//! - Summing the byte size of a selection
//! - Copying files with metadata preservation
//! - Creating directories recursively

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use walkdir::{DirEntry, WalkDir};

use crate::error::EngineError;
use crate::model::{Item, ItemKind, Listing};

/// Names starting with this marker are hidden from listings.
pub const HIDDEN_MARKER: char = '.';

/// List the non-hidden entries of a directory.
///
/// Directories and regular files are returned in separate groups, each
/// sorted by name. Symlinks are classified by their target; dangling links,
/// pipes, sockets and devices are left out.
///
/// # Errors
/// Returns `EnumerationFailed` if the directory cannot be read.
pub fn list_items(dir: &Path) -> Result<Listing, EngineError> {
    let enumeration_failed = |source| EngineError::EnumerationFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(enumeration_failed)? {
        let entry = entry.map_err(enumeration_failed)?;
        names.push(entry.file_name());
    }
    names.sort();

    let mut listing = Listing::default();
    for name in names {
        if name.to_string_lossy().starts_with(HIDDEN_MARKER) {
            continue;
        }
        let path = dir.join(&name);
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_dir() => listing.dirs.push(Item::directory(path)),
            Ok(metadata) if metadata.is_file() => listing.files.push(Item::file(path)),
            Ok(_) => tracing::debug!(path = %path.display(), "Skipping special file"),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable entry"),
        }
    }
    Ok(listing)
}

/// Paths a copy must never read from: its own destination and the journal
/// files. Stored canonicalized.
#[derive(Debug, Clone, Default)]
pub(crate) struct Exclusions {
    paths: Vec<PathBuf>,
}

impl Exclusions {
    /// Canonicalize `paths`. A path that does not exist yet is resolved
    /// through its nearest existing ancestor.
    pub(crate) fn new<'p, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'p Path>,
    {
        let paths = paths.into_iter().filter_map(resolve).collect();
        Exclusions { paths }
    }

    fn contains_canonical(&self, path: &Path) -> bool {
        self.paths.iter().any(|excluded| excluded == path)
    }

    /// Whether `path` resolves to an excluded location.
    pub(crate) fn covers(&self, path: &Path) -> bool {
        if self.paths.is_empty() {
            return false;
        }
        fs::canonicalize(path).is_ok_and(|canonical| self.contains_canonical(&canonical))
    }
}

fn resolve(path: &Path) -> Option<PathBuf> {
    for ancestor in path.ancestors() {
        let existing = if ancestor.as_os_str().is_empty() {
            Path::new(".")
        } else {
            ancestor
        };
        if let Ok(canonical) = fs::canonicalize(existing) {
            let rest = path.strip_prefix(ancestor).ok()?;
            if rest.as_os_str().is_empty() {
                return Some(canonical);
            }
            return Some(canonical.join(rest));
        }
    }
    None
}

/// One entry of a directory tree walk, classified for copying.
pub(crate) enum TreeEntry {
    Directory(PathBuf),
    File { path: PathBuf, size: u64 },
}

/// Walk a directory tree, parents before children, siblings sorted by name.
///
/// Hidden entries are included. Symlinks are not followed into, but a
/// symlink that resolves to a regular file is reported as a file with the
/// target's size. Other special entries are skipped, and so is every
/// excluded path together with everything below it.
///
/// Reported paths stay under `root` as given, even when `root` itself is
/// reached through a symlink.
pub(crate) fn walk_tree<'a>(
    root: &'a Path,
    exclusions: &'a Exclusions,
) -> impl Iterator<Item = Result<TreeEntry, EngineError>> + 'a {
    let canonical_root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let relocate = {
        let canonical_root = canonical_root.clone();
        move |path: PathBuf| match path.strip_prefix(&canonical_root) {
            Ok(rel) if rel.as_os_str().is_empty() => root.to_path_buf(),
            Ok(rel) => root.join(rel),
            Err(_) => path,
        }
    };

    WalkDir::new(canonical_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !exclusions.contains_canonical(entry.path()))
        .filter_map(move |entry| match entry {
            Ok(entry) => classify(entry)
                .map(|found| {
                    found.map(|tree_entry| match tree_entry {
                        TreeEntry::Directory(path) => TreeEntry::Directory(relocate(path)),
                        TreeEntry::File { path, size } => TreeEntry::File {
                            path: relocate(path),
                            size,
                        },
                    })
                })
                .transpose(),
            Err(source) => Some(Err(EngineError::WalkFailed {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })),
        })
}

fn classify(entry: DirEntry) -> Result<Option<TreeEntry>, EngineError> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return Ok(Some(TreeEntry::Directory(entry.into_path())));
    }

    let metadata = if file_type.is_symlink() {
        match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %entry.path().display(), error = %e, "Skipping dangling symlink");
                return Ok(None);
            }
        }
    } else {
        entry.metadata().map_err(|source| EngineError::WalkFailed {
            path: entry.path().to_path_buf(),
            source,
        })?
    };

    if metadata.is_file() {
        Ok(Some(TreeEntry::File {
            path: entry.into_path(),
            size: metadata.len(),
        }))
    } else {
        Ok(None)
    }
}

/// Total byte size of a selection.
///
/// A file contributes its own size; a directory contributes every regular
/// file below it, hidden ones included. Selected entries that are neither
/// regular files nor directories contribute nothing.
///
/// # Errors
/// Returns `SourceNotFound` for a missing item, or the walk error of a
/// directory that cannot be traversed.
pub fn total_size(items: &[Item]) -> Result<u64, EngineError> {
    total_size_excluding(items, &Exclusions::default())
}

/// [`total_size`] skipping excluded paths, matching what a copy with the
/// same exclusions writes.
pub(crate) fn total_size_excluding(
    items: &[Item],
    exclusions: &Exclusions,
) -> Result<u64, EngineError> {
    let mut total = 0;
    for item in items {
        if exclusions.covers(&item.path) {
            continue;
        }
        total += item_size(item, exclusions)?;
    }
    Ok(total)
}

fn item_size(item: &Item, exclusions: &Exclusions) -> Result<u64, EngineError> {
    match item.kind {
        ItemKind::File => Ok(regular_file_size(&item.path)?.unwrap_or(0)),
        ItemKind::Directory => {
            let mut total = 0;
            for entry in walk_tree(&item.path, exclusions) {
                if let TreeEntry::File { size, .. } = entry? {
                    total += size;
                }
            }
            Ok(total)
        }
    }
}

/// Size of a selected file, following symlinks.
///
/// `None` for anything that is not a regular file: a pipe, socket, device
/// or a dangling symlink. Opening a pipe would block.
///
/// # Errors
/// Returns `SourceNotFound` if nothing exists at `path`.
pub(crate) fn regular_file_size(path: &Path) -> Result<Option<u64>, EngineError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if fs::symlink_metadata(path).is_ok() {
                Ok(None)
            } else {
                Err(EngineError::SourceNotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(e) => Err(EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Copy a file from source to destination with metadata preservation.
///
/// Contents are overwritten if the destination exists. Access and
/// modification times and permission bits are carried over.
///
/// # Returns
/// Number of bytes copied
///
/// # Errors
/// Returns `SourceNotFound`, `ReadError` or `WriteError` if the copy fails
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    ensure_parent_dir_exists(dst)?;

    let mut src_file = fs::File::open(src).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            EngineError::SourceNotFound {
                path: src.to_path_buf(),
            }
        } else {
            EngineError::ReadError {
                path: src.to_path_buf(),
                source: e,
            }
        }
    })?;

    let src_metadata = src_file.metadata().map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let bytes_copied = io::copy(&mut src_file, &mut dst_file).map_err(|e| {
        if e.kind() == io::ErrorKind::PermissionDenied {
            EngineError::WriteError {
                path: dst.to_path_buf(),
                source: e,
            }
        } else {
            EngineError::ReadError {
                path: src.to_path_buf(),
                source: e,
            }
        }
    })?;
    drop(dst_file);

    fs::set_permissions(dst, src_metadata.permissions()).map_err(|e| {
        EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        }
    })?;

    let atime = FileTime::from_last_access_time(&src_metadata);
    let mtime = FileTime::from_last_modification_time(&src_metadata);
    if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
        tracing::warn!(path = %dst.display(), error = %e, "Failed to preserve timestamps");
    }

    Ok(bytes_copied)
}

/// Create a directory and all missing parents.
pub fn ensure_dir(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|e| EngineError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ensure the parent directory of a path exists, creating it if necessary.
///
/// # Errors
/// Returns `DirectoryCreationFailed` if the parent cannot be created or
/// exists but is not a directory.
pub fn ensure_parent_dir_exists(path: &Path) -> Result<(), EngineError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    match fs::metadata(parent) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "Parent path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => ensure_dir(parent),
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        }),
    }
}
