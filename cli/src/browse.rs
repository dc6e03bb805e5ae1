//! Multi-level file picker.
//!
//! Shows the visible entries of a directory as a numbered list and reads a
//! space-separated answer:
//! - `N` selects entry N (several may be given)
//! - `N/` opens directory N
//! - `0` goes up one level, or ends browsing at the filesystem root
//!
//! Tokens that are not numbers or point past the list are ignored.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use engine::{list_items, Item, Listing, Selection};

use crate::prompt::Prompter;

/// What the user asked for at one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Up,
    Enter(PathBuf),
    Chosen(Selection),
}

/// Interpret one answer against the listing it was given for.
pub fn parse_picks(input: &str, listing: &Listing) -> Pick {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.contains(&"0") {
        return Pick::Up;
    }

    for token in &tokens {
        if let Some(index) = token.strip_suffix('/') {
            if let Some(item) = index.parse().ok().and_then(|i| listing.get(i)) {
                if item.is_dir() {
                    return Pick::Enter(item.path.clone());
                }
            }
        }
    }

    let chosen = tokens
        .iter()
        .filter_map(|token| token.parse::<usize>().ok())
        .filter_map(|index| listing.get(index).cloned())
        .collect();
    Pick::Chosen(chosen)
}

/// Browse from `start` until the user picks items or leaves the root.
///
/// End of input yields an empty selection.
pub fn choose_items<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    start: &Path,
) -> Result<Selection> {
    let mut current = start.to_path_buf();
    loop {
        let listing = list_items(&current)
            .with_context(|| format!("Cannot browse {}", current.display()))?;
        render(prompter, &current, &listing)?;

        let Some(answer) =
            prompter.ask("Select numbers (space-separated) to copy, N/ to open, or 0 to go up: ")?
        else {
            return Ok(Vec::new());
        };

        match parse_picks(&answer, &listing) {
            Pick::Up => match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    current = parent.to_path_buf();
                }
                _ => return Ok(Vec::new()),
            },
            Pick::Enter(dir) => current = dir,
            Pick::Chosen(items) => return Ok(items),
        }
    }
}

fn render<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    current: &Path,
    listing: &Listing,
) -> Result<()> {
    prompter.say("")?;
    prompter.say(format!("Current folder: {}", current.display()))?;
    let mut index = 1;
    for dir in &listing.dirs {
        prompter.say(style(format!("[DIR] {}. {}", index, dir.name())).blue())?;
        index += 1;
    }
    for file in &listing.files {
        let line = format!("[FILE] {}. {}", index, file.name());
        prompter.say(color_for(file).apply_to(line))?;
        index += 1;
    }
    prompter.say(style("[..] 0. Go up / exit").cyan())?;
    Ok(())
}

fn color_for(file: &Item) -> console::Style {
    let extension = file
        .path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("py" | "sh") => console::Style::new().green(),
        Some("jpg" | "png" | "mp4" | "mp3") => console::Style::new().magenta(),
        _ => console::Style::new().white(),
    }
}
