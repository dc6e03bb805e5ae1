//! Terminal progress bar for the copy engine.

use std::path::Path;

use engine::{ProgressCallback, ProgressCounter};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Byte-based progress bar drawn on stderr.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message("Total Progress");
        TerminalProgress { bar }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_started(&self, counter: &ProgressCounter) {
        self.bar.set_length(counter.total());
        self.bar.set_position(counter.copied());
    }

    fn on_file_copied(&self, _source: &Path, _target: &Path, counter: &ProgressCounter) {
        self.bar.set_position(counter.copied());
    }

    fn on_completed(&self, counter: &ProgressCounter) {
        self.bar.set_position(counter.copied());
        self.bar.finish();
    }
}
