//! Undo record file and activity log.
//!
//! The undo record file holds the destination paths written by the most
//! recent copy or encrypt operation, one per line. It is truncated when an
//! operation starts and never accumulates history.
//!
//! Records are raw path bytes terminated by `\n`, so any name the
//! filesystem accepts reads back unchanged, trailing spaces included.
//!
//! The activity log is append-only: one line per copied or encrypted file,
//! plus a marker line for every undo.

use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::EngineError;

pub const UNDO_FILE_NAME: &str = ".undo_list";
pub const LOG_FILE_NAME: &str = "termuxport.log";

/// Action tag written after the path of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Copied,
    Encrypted,
}

impl std::fmt::Display for LogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogAction::Copied => write!(f, "COPIED"),
            LogAction::Encrypted => write!(f, "ENCRYPTED"),
        }
    }
}

pub const UNDO_LOG_LINE: &str = "UNDO executed";

/// Paths of the undo record file and the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    undo_path: PathBuf,
    log_path: PathBuf,
}

impl Journal {
    /// Journal files kept inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Journal {
            undo_path: dir.join(UNDO_FILE_NAME),
            log_path: dir.join(LOG_FILE_NAME),
        }
    }

    pub fn undo_path(&self) -> &Path {
        &self.undo_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Truncate the undo record file and return a writer for the new snapshot.
    pub fn start_undo_records(&self) -> Result<UndoRecorder, EngineError> {
        if let Some(parent) = self.undo_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.undo_error(e))?;
        }
        let file = File::create(&self.undo_path).map_err(|e| self.undo_error(e))?;
        Ok(UndoRecorder {
            path: self.undo_path.clone(),
            file,
        })
    }

    /// Read the recorded paths, or `None` if there is no undo record file.
    pub fn read_undo_records(&self) -> Result<Option<Vec<PathBuf>>, EngineError> {
        match fs::read(&self.undo_path) {
            Ok(bytes) => Ok(Some(
                bytes
                    .split(|&b| b == b'\n')
                    .filter(|record| !record.is_empty())
                    .map(path_from_bytes)
                    .collect(),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.undo_error(e)),
        }
    }

    /// Append `<path> <ACTION>` to the activity log.
    pub fn log_action(&self, path: &Path, action: LogAction) -> Result<(), EngineError> {
        self.append_log_line(&format!("{} {}", path.display(), action))
    }

    /// Append the undo marker to the activity log.
    pub fn log_undo(&self) -> Result<(), EngineError> {
        self.append_log_line(UNDO_LOG_LINE)
    }

    fn append_log_line(&self, line: &str) -> Result<(), EngineError> {
        let log_error = |source| EngineError::JournalError {
            path: self.log_path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(log_error)?;
        writeln!(file, "{}", line).map_err(log_error)
    }

    fn undo_error(&self, source: io::Error) -> EngineError {
        EngineError::JournalError {
            path: self.undo_path.clone(),
            source,
        }
    }
}

/// Writer for one operation's undo snapshot. Each record is written through
/// immediately so an interrupted run still leaves the paths copied so far.
pub struct UndoRecorder {
    path: PathBuf,
    file: File,
}

impl UndoRecorder {
    pub fn record(&mut self, target: &Path) -> Result<(), EngineError> {
        let mut line = path_to_bytes(target).into_owned();
        line.push(b'\n');
        self.file
            .write_all(&line)
            .map_err(|source| EngineError::JournalError {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snapshot_replaces_previous_records() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let journal = Journal::in_dir(temp_dir.path());

        let mut recorder = journal.start_undo_records().expect("Failed to start");
        recorder.record(Path::new("/out/one")).expect("Failed to record");
        recorder.record(Path::new("/out/two")).expect("Failed to record");
        drop(recorder);

        let mut recorder = journal.start_undo_records().expect("Failed to start");
        recorder.record(Path::new("/out/three")).expect("Failed to record");
        drop(recorder);

        let records = journal.read_undo_records().expect("Failed to read");
        assert_eq!(records, Some(vec![PathBuf::from("/out/three")]));
    }

    #[test]
    fn test_records_keep_surrounding_whitespace() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let journal = Journal::in_dir(temp_dir.path());

        let mut recorder = journal.start_undo_records().expect("Failed to start");
        recorder.record(Path::new("/out/notes ")).expect("Failed to record");
        recorder.record(Path::new("/out/ lead")).expect("Failed to record");
        drop(recorder);

        let records = journal.read_undo_records().expect("Failed to read");
        assert_eq!(
            records,
            Some(vec![PathBuf::from("/out/notes "), PathBuf::from("/out/ lead")])
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_records_keep_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let journal = Journal::in_dir(temp_dir.path());
        let target = Path::new("/out").join(OsStr::from_bytes(b"caf\xe9.txt"));

        let mut recorder = journal.start_undo_records().expect("Failed to start");
        recorder.record(&target).expect("Failed to record");
        drop(recorder);

        let records = journal.read_undo_records().expect("Failed to read");
        assert_eq!(records, Some(vec![target]));
    }

    #[test]
    fn test_missing_undo_file_reads_as_none() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let journal = Journal::in_dir(temp_dir.path());
        assert_eq!(journal.read_undo_records().expect("Failed to read"), None);
    }

    #[test]
    fn test_log_lines_are_appended() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let journal = Journal::in_dir(temp_dir.path());

        journal
            .log_action(Path::new("/src/a.txt"), LogAction::Copied)
            .expect("Failed to log");
        journal
            .log_action(Path::new("/out/export.enc"), LogAction::Encrypted)
            .expect("Failed to log");
        journal.log_undo().expect("Failed to log");

        let log = fs::read_to_string(journal.log_path()).expect("Failed to read log");
        assert_eq!(
            log,
            "/src/a.txt COPIED\n/out/export.enc ENCRYPTED\nUNDO executed\n"
        );
    }
}
