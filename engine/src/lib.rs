//! # TermuXport Engine - Export Library
//!
//! A small, synchronous library for exporting files out of a terminal
//! environment into a destination folder.
//! Designed as the foundation for the interactive `termuxport` front-end.
//!
//! ## Overview
//!
//! The engine provides:
//! - Directory listing with hidden entries filtered out
//! - Selection sizing for progress reporting
//! - Copying files and directory trees with metadata preservation
//! - Archive + symmetric encryption export through external tools
//! - Single-level undo of the last export
//! - Progress reporting via callbacks (decoupled from UI technology)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{copy_selection, list_items, undo_last, AppConfig, ExportContext};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(Path::new("termuxport.conf"))?;
//! let ctx = ExportContext::new(config);
//!
//! // Copy every visible entry of the current directory
//! let items = list_items(Path::new("."))?.into_selection();
//! let report = copy_selection(&ctx, &items, Path::new("/sdcard/export"), None)?;
//! println!("Copied {} files", report.files_copied());
//!
//! // Changed our mind
//! undo_last(&ctx.journal)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (Item, Selection, Listing, reports)
//! - **error**: Error types
//! - **config**: Layered runtime configuration
//! - **fs_ops**: Listing, sizing and metadata-preserving copies
//! - **journal**: Undo record file and activity log
//! - **progress**: Progress counter and callback trait
//! - **tools**: External program invocation
//! - **notify**: Completion notifications
//! - **copy**: Copy engine and dry-run preview
//! - **archive**: Archive-encrypt engine
//! - **undo**: Undo engine
//! - **filter**: Exclude-by-extension filter

pub mod archive;
pub mod config;
pub mod context;
pub mod copy;
pub mod error;
pub mod filter;
pub mod fs_ops;
pub mod journal;
pub mod model;
pub mod notify;
pub mod progress;
pub mod tools;
pub mod undo;

// Re-export main types and functions
pub use archive::encrypt_selection;
pub use config::AppConfig;
pub use context::ExportContext;
pub use copy::{copy_selection, preview_selection};
pub use error::EngineError;
pub use filter::{exclude_extensions, parse_extensions};
pub use fs_ops::{list_items, total_size};
pub use journal::Journal;
pub use model::{
    CopyReport, EncryptedExport, Item, ItemKind, Listing, PlannedCopy, Selection, UndoOutcome,
    UndoReport,
};
pub use progress::{ProgressCallback, ProgressCounter};
pub use undo::undo_last;
