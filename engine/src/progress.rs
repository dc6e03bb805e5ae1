//! Progress reporting trait.
//!
//! This module defines the ProgressCallback trait, which keeps the copy
//! engine independent of how progress is displayed. The CLI renders it as a
//! terminal progress bar; tests record the calls.

use std::path::Path;

/// Running byte count for one copy operation.
///
/// Starts at zero for every operation and only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounter {
    total: u64,
    copied: u64,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        ProgressCounter { total, copied: 0 }
    }

    pub fn advance(&mut self, bytes: u64) {
        self.copied = self.copied.saturating_add(bytes);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn copied(&self) -> u64 {
        self.copied
    }
}

/// Trait for receiving progress updates from the copy engine.
///
/// All methods are called synchronously from the copying thread.
pub trait ProgressCallback {
    /// Called once the selection has been sized, before anything is copied.
    fn on_started(&self, counter: &ProgressCounter);

    /// Called after each file has been copied and the counter advanced.
    fn on_file_copied(&self, source: &Path, target: &Path, counter: &ProgressCounter);

    /// Called when every item has been processed.
    fn on_completed(&self, counter: &ProgressCounter);
}
