//! Error types for the export engine.
//!
//! Every engine operation returns `EngineError`. The copy engine aborts on the
//! first error it hits; files already copied stay in place and remain listed
//! in the undo record file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A selected item does not exist
    #[error("Source not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    /// Failed to list a directory
    #[error("Failed to enumerate directory: {}", .path.display())]
    EnumerationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed while walking a directory tree
    #[error("Failed to walk directory tree: {}", .path.display())]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Failed to read from a source file
    #[error("Failed to read file: {}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write to a destination file
    #[error("Failed to write file: {}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create a directory
    #[error("Failed to create directory: {}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read or write the undo record file or the activity log
    #[error("Failed to update journal file: {}", .path.display())]
    JournalError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external program could not be started
    #[error("Failed to launch '{program}'")]
    ToolLaunchFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// An external program exited unsuccessfully
    #[error("'{program}' exited with {}", describe_exit(.code))]
    ToolFailed { program: String, code: Option<i32> },

    /// Encryption was requested with an empty passphrase
    #[error("Encryption passphrase must not be empty")]
    EmptyPassphrase,

    /// The home directory could not be determined for default paths
    #[error("Unable to determine the home directory")]
    NoHomeDirectory,

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl From<figment::Error> for EngineError {
    fn from(err: figment::Error) -> Self {
        EngineError::Config(Box::new(err))
    }
}
