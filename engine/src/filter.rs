//! Extension filter for selections.

use crate::model::Item;

/// Split user input into extensions, dropping a leading dot if present.
pub fn parse_extensions(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep the items whose name does not end in `.<ext>` for any given extension.
///
/// Matching is case-sensitive and applies to directories as well as files.
/// The relative order of the kept items is unchanged.
pub fn exclude_extensions(items: Vec<Item>, extensions: &[String]) -> Vec<Item> {
    if extensions.is_empty() {
        return items;
    }
    let suffixes: Vec<String> = extensions.iter().map(|ext| format!(".{}", ext)).collect();
    items
        .into_iter()
        .filter(|item| {
            let name = item.name();
            !suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
        })
        .collect()
}
