//! Page labels derived from file identifiers
//!
//! File identifiers encode their position in a section with a leading
//! ordering token, e.g. `"1.0 Python.md"` or `"2.md"`.

use regex::Regex;
use std::sync::OnceLock;

static TITLE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn title_pattern() -> &'static Regex {
    TITLE_PATTERN.get_or_init(|| Regex::new(r"^([\d.]+)\s*(.*)$").expect("valid title regex"))
}

/// Derive the navigation label for a file identifier
///
/// * `"1.0 Python.md"` -> `"Python - Part 1.0"`
/// * `"3.md"` -> `"Part 3"`
/// * `"notes.md"` -> `"notes.md"` (no ordering token, returned unchanged)
pub fn page_title(file: &str) -> String {
    let name = file.strip_suffix(".md").unwrap_or(file);

    let Some(caps) = title_pattern().captures(name) else {
        return file.to_string();
    };

    let number = &caps[1];
    let title = caps[2].trim();

    if title.is_empty() {
        format!("Part {}", number)
    } else {
        format!("{} - Part {}", title, number)
    }
}
