//! Shared state for engine operations.
//!
//! The context owns the resolved configuration, the journal in the default
//! destination, and the seams to external programs and notifications.

use crate::config::AppConfig;
use crate::journal::Journal;
use crate::notify::{create_notifier, Notifier};
use crate::tools::{SystemRunner, ToolRunner};

/// Everything an engine operation needs besides its selection and destination.
///
/// Built once at startup from the resolved configuration.
pub struct ExportContext {
    pub config: AppConfig,
    pub journal: Journal,
    runner: Box<dyn ToolRunner>,
    notifier: Option<Box<dyn Notifier>>,
}

impl ExportContext {
    pub fn new(config: AppConfig) -> Self {
        let journal = Journal::in_dir(&config.default_dest);
        let notifier = create_notifier(&config);
        ExportContext {
            config,
            journal,
            runner: Box::new(SystemRunner),
            notifier,
        }
    }

    pub fn with_runner(mut self, runner: Box<dyn ToolRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_notifier(mut self, notifier: Option<Box<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn runner(&self) -> &dyn ToolRunner {
        self.runner.as_ref()
    }

    /// Post a notification if notifications are enabled.
    pub fn notify(&self, content: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(content);
        }
    }
}
