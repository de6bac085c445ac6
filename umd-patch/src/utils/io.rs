//! Argument parsing and path utilities

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Truncate a path for display, keeping the file name
pub fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let budget = max_len.saturating_sub(3);
    if file_name.chars().count() >= budget {
        let tail: String = file_name
            .chars()
            .rev()
            .take(budget)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{tail}");
    }

    let head_budget = budget - file_name.chars().count() - 1;
    let head: String = path.chars().take(head_budget).collect();
    format!("{head}.../{file_name}")
}

/// Simple wildcard pattern matching, case insensitive
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() || pattern == "*" {
        return true;
    }

    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    if !pattern.contains('*') {
        return text.contains(&pattern);
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 && !text.starts_with(part) {
            return false;
        }
        match text[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    match parts.last() {
        Some(last) if !last.is_empty() => text.ends_with(last),
        _ => true,
    }
}

/// Split a `NAME=FILE` argument
pub fn parse_assignment(arg: &str) -> Result<(String, PathBuf)> {
    let Some((name, file)) = arg.split_once('=') else {
        bail!("Expected NAME=FILE, got {arg:?}");
    };
    if name.is_empty() || file.is_empty() {
        bail!("Expected NAME=FILE, got {arg:?}");
    }
    Ok((name.to_string(), PathBuf::from(file)))
}

/// Read a `NAME=FILE` argument's file
pub fn read_assignment(arg: &str) -> Result<(String, Vec<u8>)> {
    let (name, file) = parse_assignment(arg)?;
    let data =
        std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    Ok((name, data))
}

/// Output path for an extracted entry: `output` if given, else the entry's
/// last path component in the current directory
pub fn output_path(entry: &str, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(entry.rsplit('/').next().unwrap_or(entry)),
    }
}

/// Check whether two paths name the same existing file
///
/// A path that does not exist yet never matches.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
