//! Completion notifications.
//!
//! A notification is a best-effort side effect: failures are logged and
//! never returned to the caller.

use crate::config::AppConfig;
use crate::tools::{Invocation, SystemRunner, ToolRunner};

pub const COPY_COMPLETED: &str = "Copy Completed";
pub const ENCRYPTED_COPY_COMPLETED: &str = "Encrypted Copy Completed";

/// Trait for notification channel implementations.
pub trait Notifier {
    fn notify(&self, content: &str);
}

/// Posts notifications through the `termux-notification` command.
pub struct TermuxNotifier<R: ToolRunner = SystemRunner> {
    title: String,
    runner: R,
}

impl TermuxNotifier<SystemRunner> {
    pub fn new(version: &str) -> Self {
        Self::with_runner(version, SystemRunner)
    }
}

impl<R: ToolRunner> TermuxNotifier<R> {
    pub fn with_runner(version: &str, runner: R) -> Self {
        TermuxNotifier {
            title: format!("TermuXport {}", version),
            runner,
        }
    }

    fn invocation(&self, content: &str) -> Invocation {
        Invocation::new("termux-notification")
            .arg("--title")
            .arg(self.title.as_str())
            .arg("--content")
            .arg(content)
    }
}

impl<R: ToolRunner> Notifier for TermuxNotifier<R> {
    fn notify(&self, content: &str) {
        match self.runner.run(&self.invocation(content)) {
            Ok(exit) if exit.success() => {
                tracing::debug!(content, "Notification posted");
            }
            Ok(exit) => {
                tracing::warn!(code = ?exit.code, "Notification command failed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Notification command could not be launched");
            }
        }
    }
}

/// Factory function to create a notifier based on config.
pub fn create_notifier(config: &AppConfig) -> Option<Box<dyn Notifier>> {
    if config.enable_notify {
        Some(Box::new(TermuxNotifier::new(&config.version)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolExit;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::io;
    use std::path::Path;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Invocation>>,
        exit: Option<ToolExit>,
    }

    impl ToolRunner for &Recorder {
        fn run(&self, invocation: &Invocation) -> io::Result<ToolExit> {
            self.calls.borrow_mut().push(invocation.clone());
            self.exit
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    #[test]
    fn test_notification_command_line() {
        let recorder = Recorder {
            exit: Some(ToolExit::SUCCESS),
            ..Default::default()
        };
        TermuxNotifier::with_runner("v4.4", &recorder).notify(COPY_COMPLETED);

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "termux-notification");
        let args: Vec<OsString> = ["--title", "TermuXport v4.4", "--content", "Copy Completed"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(calls[0].args, args);
    }

    #[test]
    fn test_notification_failure_is_swallowed() {
        let recorder = Recorder::default();
        TermuxNotifier::with_runner("v1", &recorder).notify(ENCRYPTED_COPY_COMPLETED);
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[test]
    fn test_disabled_config_creates_no_notifier() {
        let mut config = AppConfig::with_home(Path::new("/home/user"));
        config.enable_notify = false;
        assert!(create_notifier(&config).is_none());
        config.enable_notify = true;
        assert!(create_notifier(&config).is_some());
    }
}
