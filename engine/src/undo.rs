//! Undo engine.
//!
//! Removes every path listed in the undo record file. Only the most recent
//! copy or encrypt operation can be undone, and the record file is left as
//! is, so running undo twice removes nothing the second time.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::error::EngineError;
use crate::journal::Journal;
use crate::model::{UndoOutcome, UndoReport};

/// Undo the last export recorded in `journal`.
///
/// Removal failures are collected in the report rather than returned, and
/// the `UNDO executed` log line is written after all removals were attempted.
/// A missing record file means there is nothing to undo; the log is not
/// touched in that case.
///
/// # Errors
/// Returns `JournalError` if the record file exists but cannot be read, or
/// the log cannot be appended to.
pub fn undo_last(journal: &Journal) -> Result<UndoOutcome, EngineError> {
    let Some(records) = journal.read_undo_records()? else {
        info!("Nothing to undo");
        return Ok(UndoOutcome::NothingToUndo);
    };

    let mut report = UndoReport::default();
    for path in records {
        match force_remove(&path) {
            Ok(true) => report.removed.push(path),
            Ok(false) => report.missing.push(path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove path during undo");
                report.failed.push(path);
            }
        }
    }

    journal.log_undo()?;
    info!(
        removed = report.removed.len(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        "Undo completed"
    );
    Ok(UndoOutcome::Completed(report))
}

/// Remove a file, symlink or whole directory tree. Returns `false` if the
/// path did not exist.
fn force_remove(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
