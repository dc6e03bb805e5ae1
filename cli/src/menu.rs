//! Main menu and action dispatch.
//!
//! The menu only gathers input; every action ends in a single engine call
//! so the copy, archive and undo logic stays testable on its own.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use console::style;
use engine::{
    copy_selection, encrypt_selection, exclude_extensions, list_items, parse_extensions,
    preview_selection, undo_last, AppConfig, ExportContext, ProgressCallback, Selection,
    UndoOutcome,
};

use crate::browse::choose_items;
use crate::progress::TerminalProgress;
use crate::prompt::{Prompter, SecretSource};

/// Menu entries, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CopyAll,
    Select,
    EncryptAll,
    DryRun,
    ExcludeTypes,
    Undo,
    Exit,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Action::CopyAll),
            "2" => Ok(Action::Select),
            "3" => Ok(Action::EncryptAll),
            "4" => Ok(Action::DryRun),
            "5" => Ok(Action::ExcludeTypes),
            "6" => Ok(Action::Undo),
            "0" => Ok(Action::Exit),
            other => Err(format!("Invalid choice '{}'", other)),
        }
    }
}

const MENU: &[&str] = &[
    "[1] Copy all files/folders",
    "[2] Select files/folders (multi-level)",
    "[3] Encrypt & export",
    "[4] Dry run / preview",
    "[5] Exclude file types",
    "[6] Undo last export",
    "[0] Exit",
];

/// Banner line shown at startup.
pub fn banner(config: &AppConfig) -> String {
    format!(
        "TermuXport {} – Created by {}",
        config.version, config.creator
    )
}

/// One interactive run: a source folder, a destination, and the user at the keyboard.
pub struct Session<'a, R, W> {
    ctx: &'a ExportContext,
    source_root: PathBuf,
    destination: PathBuf,
    prompter: Prompter<R, W>,
    secrets: Box<dyn SecretSource>,
    show_progress: bool,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(
        ctx: &'a ExportContext,
        source_root: PathBuf,
        prompter: Prompter<R, W>,
        secrets: Box<dyn SecretSource>,
    ) -> Self {
        Session {
            ctx,
            source_root,
            destination: ctx.config.default_dest.clone(),
            prompter,
            secrets,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Ask for the destination folder; an empty answer keeps the default.
    pub fn choose_destination(&mut self) -> Result<()> {
        let question = format!("Destination folder [{}]: ", self.destination.display());
        if let Some(answer) = self.prompter.ask(&question)? {
            if !answer.is_empty() {
                self.destination = PathBuf::from(answer);
            }
        }
        std::fs::create_dir_all(&self.destination).with_context(|| {
            format!("Cannot create destination {}", self.destination.display())
        })?;
        tracing::debug!(destination = %self.destination.display(), "Destination chosen");
        Ok(())
    }

    /// Show the menu and run actions until exit or end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.prompter.say("")?;
            self.prompter.say("Main menu:")?;
            for line in MENU {
                self.prompter.say(line)?;
            }

            let Some(answer) = self.prompter.ask("Choose: ")? else {
                return Ok(());
            };
            match answer.parse::<Action>() {
                Ok(Action::Exit) => return Ok(()),
                Ok(action) => self.dispatch(action)?,
                Err(_) => self.prompter.say("Invalid choice")?,
            }
        }
    }

    /// Run one menu action.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        tracing::debug!(?action, "Dispatching menu action");
        match action {
            Action::CopyAll => {
                let items = self.all_items()?;
                self.copy(&items)
            }
            Action::Select => {
                let items = choose_items(&mut self.prompter, &self.source_root)?;
                if items.is_empty() {
                    self.prompter.say("Nothing selected")?;
                    return Ok(());
                }
                self.copy(&items)
            }
            Action::EncryptAll => {
                let items = self.all_items()?;
                self.encrypt(&items)
            }
            Action::DryRun => {
                let items = self.all_items()?;
                self.dry_run(&items)
            }
            Action::ExcludeTypes => {
                let items = self.all_items()?;
                let answer = self
                    .prompter
                    .ask("Enter extensions to exclude (space-separated, e.g., mp4 jpg): ")?
                    .unwrap_or_default();
                let filtered = exclude_extensions(items, &parse_extensions(&answer));
                self.copy(&filtered)
            }
            Action::Undo => self.undo(),
            Action::Exit => Ok(()),
        }
    }

    fn all_items(&self) -> Result<Selection> {
        let listing = list_items(&self.source_root)
            .with_context(|| format!("Cannot list {}", self.source_root.display()))?;
        Ok(listing.into_selection())
    }

    fn copy(&mut self, items: &Selection) -> Result<()> {
        let progress = self.show_progress.then(TerminalProgress::new);
        let report = copy_selection(
            self.ctx,
            items,
            &self.destination,
            progress.as_ref().map(|p| p as &dyn ProgressCallback),
        )
        .context("Copy failed")?;

        self.prompter.say(
            style(format!(
                "Copied {} files ({} bytes) to {}",
                report.files_copied(),
                report.bytes_copied,
                self.destination.display()
            ))
            .green(),
        )?;
        Ok(())
    }

    fn encrypt(&mut self, items: &Selection) -> Result<()> {
        let passphrase = self.secrets.passphrase()?;
        let export = encrypt_selection(self.ctx, items, &self.destination, &passphrase)
            .context("Encrypted export failed")?;
        self.prompter.say(
            style(format!("Encrypted export written to {}", export.artifact.display())).green(),
        )?;
        Ok(())
    }

    fn dry_run(&mut self, items: &Selection) -> Result<()> {
        self.prompter.say("Dry Run: Showing what would be copied")?;
        for planned in preview_selection(items, &self.destination) {
            self.prompter.say(format!(
                "[{}] {} -> {}",
                planned.kind,
                planned.source.display(),
                planned.target.display()
            ))?;
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        match undo_last(&self.ctx.journal).context("Undo failed")? {
            UndoOutcome::NothingToUndo => self.prompter.say("Nothing to undo")?,
            UndoOutcome::Completed(report) => {
                for path in &report.failed {
                    self.prompter
                        .say(style(format!("Could not remove {}", path.display())).red())?;
                }
                self.prompter.say(format!(
                    "Undo completed ({} removed)",
                    report.removed.len()
                ))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FixedSecret(&'static str);

    impl SecretSource for FixedSecret {
        fn passphrase(&mut self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        root: PathBuf,
        ctx: ExportContext,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let src = root.join("src");
        fs::create_dir_all(src.join("docs")).expect("Failed to create dirs");
        fs::write(src.join("docs").join("a.txt"), "a").expect("Failed to write");
        fs::write(src.join("photo.jpg"), "jpg").expect("Failed to write");
        fs::write(src.join("notes.md"), "md").expect("Failed to write");
        fs::write(src.join(".hidden"), "h").expect("Failed to write");
        let ctx = ExportContext::new(AppConfig::with_home(&root)).with_notifier(None);
        Fixture {
            _temp_dir: temp_dir,
            root,
            ctx,
        }
    }

    fn run_script(fx: &Fixture, script: &str) -> String {
        let mut output = Vec::new();
        {
            let prompter = Prompter::new(script.as_bytes(), &mut output);
            let mut session = Session::new(
                &fx.ctx,
                fx.root.join("src"),
                prompter,
                Box::new(FixedSecret("pw")),
            )
            .with_progress(false);
            session.choose_destination().expect("Failed to choose destination");
            session.run().expect("Session failed");
        }
        String::from_utf8(output).expect("Output is not UTF-8")
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("1".parse::<Action>(), Ok(Action::CopyAll));
        assert_eq!(" 6 ".parse::<Action>(), Ok(Action::Undo));
        assert_eq!("0".parse::<Action>(), Ok(Action::Exit));
        assert!("7".parse::<Action>().is_err());
        assert!("copy".parse::<Action>().is_err());
    }

    #[test]
    fn test_copy_all_skips_hidden_entries() {
        let fx = fixture();
        let dst = fx.root.join("out");
        run_script(&fx, &format!("{}\n1\n0\n", dst.display()));

        assert!(dst.join("docs").join("a.txt").is_file());
        assert!(dst.join("photo.jpg").is_file());
        assert!(dst.join("notes.md").is_file());
        assert!(!dst.join(".hidden").exists());
    }

    #[test]
    fn test_empty_destination_uses_default() {
        let fx = fixture();
        run_script(&fx, "\n1\n");

        assert!(fx.ctx.config.default_dest.join("notes.md").is_file());
    }

    #[test]
    fn test_exclude_types_then_copy() {
        let fx = fixture();
        let dst = fx.root.join("out");
        run_script(&fx, &format!("{}\n5\njpg\n0\n", dst.display()));

        assert!(!dst.join("photo.jpg").exists());
        assert!(dst.join("notes.md").is_file());
    }

    #[test]
    fn test_copy_then_undo() {
        let fx = fixture();
        let dst = fx.root.join("out");
        let output = run_script(&fx, &format!("{}\n1\n6\n0\n", dst.display()));

        assert!(!dst.join("notes.md").exists());
        assert!(!dst.join("docs").join("a.txt").exists());
        assert!(output.contains("Undo completed (3 removed)"));
    }

    #[test]
    fn test_undo_with_nothing_recorded() {
        let fx = fixture();
        let output = run_script(&fx, &format!("{}\n6\n", fx.root.join("out").display()));
        assert!(output.contains("Nothing to undo"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let fx = fixture();
        let dst = fx.root.join("out");
        let output = run_script(&fx, &format!("{}\n4\n0\n", dst.display()));

        assert!(output.contains("Dry Run: Showing what would be copied"));
        assert!(output.contains(&format!("-> {}", dst.join("notes.md").display())));
        assert_eq!(fs::read_dir(&dst).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_choice_keeps_menu_running() {
        let fx = fixture();
        let output = run_script(&fx, &format!("{}\n9\n0\n", fx.root.join("out").display()));
        assert!(output.contains("Invalid choice"));
        assert_eq!(output.matches("Main menu:").count(), 2);
    }

    #[test]
    fn test_select_copies_only_picked_items() {
        let fx = fixture();
        let dst = fx.root.join("out");
        // Listing of src: [DIR] docs, [FILE] notes.md, [FILE] photo.jpg
        run_script(&fx, &format!("{}\n2\n2\n0\n", dst.display()));

        assert!(dst.join("notes.md").is_file());
        assert!(!dst.join("photo.jpg").exists());
        assert!(!dst.join("docs").exists());
    }
}
