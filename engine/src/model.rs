//! Core data model for export operations.
//!
//! This module defines the structures shared by every engine component:
//! - Item: a single file or directory picked from the source filesystem
//! - Selection: the ordered list of items handed to one operation
//! - Listing: the result of enumerating one directory
//! - CopyReport, PlannedCopy: outcomes of the copy engine

use std::path::PathBuf;

/// Whether an [`Item`] refers to a regular file or a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A single file, copied by base name into the destination
    File,
    /// A directory, copied recursively as a top-level folder of the destination
    Directory,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::File => write!(f, "FILE"),
            ItemKind::Directory => write!(f, "DIR"),
        }
    }
}

/// A path in the source filesystem tagged as file or directory.
///
/// Items are read-only references; the engine never mutates the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub path: PathBuf,
    pub kind: ItemKind,
}

impl Item {
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Item {
            path: path.into(),
            kind: ItemKind::File,
        }
    }

    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        Item {
            path: path.into(),
            kind: ItemKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Directory
    }

    /// Final path component as a lossy string ("" when the path has none).
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordered items chosen for one transfer. Duplicates are kept as given.
pub type Selection = Vec<Item>;

/// Non-hidden entries of one directory, each group sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub dirs: Vec<Item>,
    pub files: Vec<Item>,
}

impl Listing {
    /// Entry by 1-based menu index: directories first, then files.
    pub fn get(&self, index: usize) -> Option<&Item> {
        if index == 0 {
            return None;
        }
        let idx = index - 1;
        if idx < self.dirs.len() {
            self.dirs.get(idx)
        } else {
            self.files.get(idx - self.dirs.len())
        }
    }

    /// Flatten into a selection, directories before files.
    pub fn into_selection(self) -> Selection {
        let mut items = self.dirs;
        items.extend(self.files);
        items
    }
}

/// Where a selected item would land in the destination (dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
    pub source: PathBuf,
    pub target: PathBuf,
    pub kind: ItemKind,
}

/// Summary of a finished copy operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Total bytes the size accumulator computed before copying
    pub total_bytes: u64,

    /// Bytes actually copied (final value of the progress counter)
    pub bytes_copied: u64,

    /// Destination path of every copied file, in copy order
    pub targets: Vec<PathBuf>,
}

impl CopyReport {
    pub fn files_copied(&self) -> usize {
        self.targets.len()
    }
}

/// Result of the archive-encrypt engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedExport {
    /// The single encrypted artifact written into the destination
    pub artifact: PathBuf,

    /// Bytes of source data packed into the archive
    pub source_bytes: u64,
}

/// Result of an undo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// No undo record file exists; nothing was touched
    NothingToUndo,
    /// Records were processed
    Completed(UndoReport),
}

/// Counts for the paths listed in the undo record file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoReport {
    /// Paths that existed and were removed
    pub removed: Vec<PathBuf>,
    /// Paths that no longer existed
    pub missing: Vec<PathBuf>,
    /// Paths that existed but could not be removed
    pub failed: Vec<PathBuf>,
}
