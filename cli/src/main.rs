//! TermuXport - interactive exporter built on the export engine.
//!
//! Lists the current folder, lets the user pick what to export, and copies
//! or archive-encrypts it into a destination folder with single-level undo.

mod browse;
mod logging;
mod menu;
mod progress;
mod prompt;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use engine::{config, AppConfig, ExportContext};

use crate::menu::{banner, Session};
use crate::prompt::{Prompter, TerminalSecret};

/// TermuXport - copy, encrypt and undo exports from the terminal
#[derive(Parser, Debug)]
#[command(name = "termuxport")]
#[command(version)]
#[command(about = "Interactively export files to a destination folder")]
struct Args {
    /// Configuration file (KEY=value lines)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose diagnostic output on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logging::init(logging::LogConfig {
        verbose: args.verbose,
    });

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    tracing::debug!(?config, "Configuration loaded");

    let source_root = std::env::current_dir().context("Cannot determine the current directory")?;
    let ctx = ExportContext::new(config);

    let stdin = io::stdin();
    let prompter = Prompter::new(stdin.lock(), io::stdout());

    println!("{}", style(banner(&ctx.config)).bold());

    let mut session = Session::new(&ctx, source_root, prompter, Box::new(TerminalSecret))
        .with_progress(console::user_attended_stderr());
    session.choose_destination()?;
    tracing::info!(destination = %session.destination().display(), "Session started");
    session.run()
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    AppConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_accept_no_flags() {
        let args = Args::try_parse_from(["termuxport"]).expect("Failed to parse");
        assert!(args.config.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_config_and_verbose() {
        let args = Args::try_parse_from(["termuxport", "--config", "/tmp/x.conf", "-v"])
            .expect("Failed to parse");
        assert_eq!(args.config, Some(PathBuf::from("/tmp/x.conf")));
        assert!(args.verbose);
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("termuxport.conf");
        std::fs::write(&file, "CREATOR=tester\n").expect("Failed to write config");

        let args = Args {
            config: Some(file),
            verbose: false,
        };
        let config = load_config(&args).expect("Failed to load config");
        assert_eq!(config.creator, "tester");
    }

    #[test]
    fn test_banner_shows_version_and_creator() {
        let config = AppConfig::with_home(std::path::Path::new("/home/user"));
        let line = banner(&config);
        assert!(line.contains(&config.version));
        assert!(line.contains(&config.creator));
    }
}
