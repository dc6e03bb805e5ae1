//! Copy engine.
//!
//! Copies a selection into a destination directory:
//! - a file lands directly in the destination under its base name
//! - a directory is recreated as a top-level folder of the destination
//!
//! Every copied file advances the progress counter, adds one undo record and
//! one `COPIED` log line. The first failure aborts the operation; files
//! copied before it stay in place and can be removed with undo.
//!
//! The destination and the journal files are never read as sources, so a
//! destination inside a selected directory is not copied into itself.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, info_span};

use crate::context::ExportContext;
use crate::error::EngineError;
use crate::fs_ops::{self, Exclusions, TreeEntry};
use crate::journal::{LogAction, UndoRecorder};
use crate::model::{CopyReport, Item, ItemKind, PlannedCopy};
use crate::notify::COPY_COMPLETED;
use crate::progress::{ProgressCallback, ProgressCounter};

/// Copy every item of a selection into `destination`.
///
/// The destination is created if absent and existing files are overwritten.
/// The undo record file is replaced with the paths written by this call.
///
/// # Arguments
/// * `ctx` - Journal and notifier to use
/// * `items` - Selection, processed in order
/// * `destination` - Destination directory
/// * `progress` - Optional callback for progress updates
///
/// # Errors
/// Returns the first error encountered; nothing copied so far is rolled back.
pub fn copy_selection(
    ctx: &ExportContext,
    items: &[Item],
    destination: &Path,
    progress: Option<&dyn ProgressCallback>,
) -> Result<CopyReport, EngineError> {
    let span = info_span!("copy_selection", destination = %destination.display());
    let _guard = span.enter();

    fs_ops::ensure_dir(destination)?;
    let exclusions = Exclusions::new([
        destination,
        ctx.journal.undo_path(),
        ctx.journal.log_path(),
    ]);
    let total_bytes = fs_ops::total_size_excluding(items, &exclusions)?;
    info!(items = items.len(), total_bytes, "Starting copy");

    let start_time = Instant::now();
    let mut run = CopyRun {
        ctx,
        destination,
        exclusions: &exclusions,
        progress,
        counter: ProgressCounter::new(total_bytes),
        recorder: ctx.journal.start_undo_records()?,
        targets: Vec::new(),
    };

    if let Some(callback) = progress {
        callback.on_started(&run.counter);
    }

    for item in items {
        if exclusions.covers(&item.path) {
            debug!(path = %item.path.display(), "Skipping destination or journal file");
            continue;
        }
        match item.kind {
            ItemKind::File => run.copy_file_item(item)?,
            ItemKind::Directory => run.copy_directory_item(item)?,
        }
    }

    if let Some(callback) = progress {
        callback.on_completed(&run.counter);
    }

    info!(
        files = run.targets.len(),
        bytes = run.counter.copied(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Copy complete"
    );
    ctx.notify(COPY_COMPLETED);

    Ok(CopyReport {
        total_bytes,
        bytes_copied: run.counter.copied(),
        targets: run.targets,
    })
}

/// Where each item would land, without touching the filesystem.
pub fn preview_selection(items: &[Item], destination: &Path) -> Vec<PlannedCopy> {
    items
        .iter()
        .map(|item| PlannedCopy {
            source: item.path.clone(),
            target: destination.join(item.name()),
            kind: item.kind,
        })
        .collect()
}

struct CopyRun<'a> {
    ctx: &'a ExportContext,
    destination: &'a Path,
    exclusions: &'a Exclusions,
    progress: Option<&'a dyn ProgressCallback>,
    counter: ProgressCounter,
    recorder: UndoRecorder,
    targets: Vec<PathBuf>,
}

impl CopyRun<'_> {
    fn copy_file_item(&mut self, item: &Item) -> Result<(), EngineError> {
        if fs_ops::regular_file_size(&item.path)?.is_none() {
            debug!(path = %item.path.display(), "Skipping special file");
            return Ok(());
        }
        let name = item
            .path
            .file_name()
            .ok_or_else(|| EngineError::SourceNotFound {
                path: item.path.clone(),
            })?;
        let target = self.destination.join(name);
        self.copy_one(&item.path, target)
    }

    fn copy_directory_item(&mut self, item: &Item) -> Result<(), EngineError> {
        if !item.path.is_dir() {
            return Err(EngineError::SourceNotFound {
                path: item.path.clone(),
            });
        }

        // Paths are taken relative to the parent so the directory's own name
        // becomes the top-level folder in the destination.
        let base = item.path.parent().unwrap_or(&item.path);

        let exclusions = self.exclusions;
        for entry in fs_ops::walk_tree(&item.path, exclusions) {
            match entry? {
                TreeEntry::Directory(dir) => {
                    fs_ops::ensure_dir(&self.target_for(base, &dir))?;
                }
                TreeEntry::File { path, .. } => {
                    let target = self.target_for(base, &path);
                    self.copy_one(&path, target)?;
                }
            }
        }
        Ok(())
    }

    fn target_for(&self, base: &Path, path: &Path) -> PathBuf {
        match path.strip_prefix(base) {
            Ok(rel) => self.destination.join(rel),
            Err(_) => self.destination.join(path.file_name().unwrap_or_default()),
        }
    }

    fn copy_one(&mut self, source: &Path, target: PathBuf) -> Result<(), EngineError> {
        let bytes = fs_ops::copy_file_with_metadata(source, &target)?;
        self.counter.advance(bytes);
        self.recorder.record(&target)?;
        self.ctx.journal.log_action(source, LogAction::Copied)?;
        debug!(source = %source.display(), target = %target.display(), bytes, "Copied file");

        if let Some(callback) = self.progress {
            callback.on_file_copied(source, &target, &self.counter);
        }
        self.targets.push(target);
        Ok(())
    }
}
