//! Formatting helpers shared by the HTML and JSON reports
//!
//! Both documents must print the same numbers for the same metric, so every
//! percentage and path in either one goes through these functions.

use super::analysis::SourceFileAnalysis;
use std::env;
use std::path::{Component, Path, PathBuf};

/// Coverage percentage formatted with `decimals` places.
///
/// An empty denominator reads as fully covered.
#[must_use]
pub fn percentage_str(covered: usize, total: usize, decimals: usize) -> String {
    format!("{:.*}", decimals, percentage(covered, total))
}

/// Coverage percentage rounded half away from zero.
///
/// An empty denominator reads as fully covered.
#[must_use]
pub fn percentage_int(covered: usize, total: usize) -> u32 {
    percentage(covered, total).round() as u32
}

fn percentage(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    covered as f64 / total as f64 * 100.0
}

/// Render `path` relative to the current working directory.
///
/// Falls back to the path unchanged when no relative form can be computed.
#[must_use]
pub fn relative_path(path: &str) -> String {
    let Ok(cwd) = env::current_dir() else {
        return path.to_string();
    };
    relative_to(&cwd, Path::new(path))
        .map_or_else(|| path.to_string(), |rel| rel.to_string_lossy().into_owned())
}

/// Lexical path from `base` to `target`. Both must be absolute.
#[must_use]
pub fn relative_to(base: &Path, target: &Path) -> Option<PathBuf> {
    if !base.is_absolute() || !target.is_absolute() {
        return None;
    }
    let base = clean_components(base);
    let target = clean_components(target);

    // Different drive prefixes have no relative form
    if drive_prefix(&base) != drive_prefix(&target) {
        return None;
    }

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for part in &target[common..] {
        rel.push(part.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

fn drive_prefix<'a>(parts: &[Component<'a>]) -> Option<Component<'a>> {
    parts
        .first()
        .filter(|c| matches!(c, Component::Prefix(_)))
        .copied()
}

fn clean_components(path: &Path) -> Vec<Component<'_>> {
    let mut stack: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(stack.last(), Some(Component::Normal(_))) {
                    stack.pop();
                }
            }
            other => stack.push(other),
        }
    }
    stack
}

/// Index of the last line that contains coverable code, or 0 when none does
#[must_use]
pub fn last_active_index(file: &SourceFileAnalysis) -> usize {
    file.lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.is_active)
        .map(|(index, _)| index)
        .max()
        .unwrap_or(0)
}

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
