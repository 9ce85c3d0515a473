//! Read-only content checks
//!
//! Renders catalog files the same way the browser does and reports problems
//! a reader would hit: repeated `{#...}` annotations on one heading, in-page
//! links that lead nowhere, and entries that cannot be retrieved.

use crate::catalog::Catalog;
use crate::emoji::strip_emoji;
use crate::loader::{encode_locator, ContentSource};
use crate::outline::insert_outline;
use crate::render::{render_markdown, Element};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

static ANNOTATION_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Matches one `{#...}` heading annotation
fn annotation_pattern() -> &'static Regex {
    ANNOTATION_PATTERN.get_or_init(|| Regex::new(r"\{#[^}]*\}").expect("valid annotation regex"))
}

/// A problem found in a catalog file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A heading line carries more than one `{#...}` annotation
    DuplicateAnnotation {
        file: String,
        line: usize,
        heading: String,
    },

    /// An in-page link points at no heading identifier
    BrokenAnchor {
        file: String,
        target: String,
        text: String,
    },

    /// The catalog entry could not be retrieved
    Unreadable { file: String, reason: String },
}

impl Issue {
    pub fn file(&self) -> &str {
        match self {
            Issue::DuplicateAnnotation { file, .. }
            | Issue::BrokenAnchor { file, .. }
            | Issue::Unreadable { file, .. } => file,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateAnnotation {
                file,
                line,
                heading,
            } => write!(
                f,
                "{}:{}: heading has more than one {{#...}} annotation: {}",
                file, line, heading
            ),
            Issue::BrokenAnchor { file, target, text } => {
                write!(f, "{}: link \"{}\" points to missing #{}", file, text, target)
            }
            Issue::Unreadable { file, reason } => write!(f, "{}: cannot be loaded: {}", file, reason),
        }
    }
}

/// Check one document's markdown source
pub fn check_document(file: &str, markdown: &str) -> Vec<Issue> {
    let mut issues = duplicate_annotations(file, markdown);

    let mut tree = render_markdown(&strip_emoji(markdown));
    insert_outline(&mut tree);
    issues.extend(broken_anchors(file, &tree));

    issues
}

/// Check every catalog entry, or only `only` when it is non-empty
pub fn check_catalog(catalog: &Catalog, source: &dyn ContentSource, only: &[String]) -> Vec<Issue> {
    let mut issues = Vec::new();

    for file in catalog.unique_files() {
        if !only.is_empty() && !only.iter().any(|f| f == file) {
            continue;
        }

        log::debug!("Checking {}", file);
        match source.fetch(&encode_locator(file)) {
            Ok(markdown) => issues.extend(check_document(file, &markdown)),
            Err(e) => issues.push(Issue::Unreadable {
                file: file.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    issues
}

fn duplicate_annotations(file: &str, markdown: &str) -> Vec<Issue> {
    let re = annotation_pattern();
    let mut issues = Vec::new();
    let mut fence: Option<&str> = None;

    for (idx, line) in markdown.lines().enumerate() {
        let trimmed = line.trim_start();

        // Skip fenced code
        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            continue;
        }
        if trimmed.starts_with("```") {
            fence = Some("```");
            continue;
        }
        if trimmed.starts_with("~~~") {
            fence = Some("~~~");
            continue;
        }

        if trimmed.starts_with('#') && re.find_iter(trimmed).count() > 1 {
            issues.push(Issue::DuplicateAnnotation {
                file: file.to_string(),
                line: idx + 1,
                heading: trimmed.trim_start_matches('#').trim().to_string(),
            });
        }
    }

    issues
}

fn broken_anchors(file: &str, tree: &Element) -> Vec<Issue> {
    let elements = tree.descendants();
    let ids: HashSet<&str> = elements.iter().filter_map(|el| el.id()).collect();

    elements
        .iter()
        .filter(|el| el.tag == "a")
        .filter_map(|el| {
            let target = el.attr("href")?.strip_prefix('#')?;
            let decoded = percent_decode_str(target).decode_utf8_lossy();
            if ids.contains(target) || ids.contains(decoded.as_ref()) {
                return None;
            }
            Some(Issue::BrokenAnchor {
                file: file.to_string(),
                target: target.to_string(),
                text: el.text_content(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Section;
    use crate::loader::MemorySource;

    #[test]
    fn test_clean_document() {
        let md = "## Load Balancing\n\nSee [below](#round-robin).\n\n## Round Robin\n";
        assert!(check_document("1 LB.md", md).is_empty());
    }

    #[test]
    fn test_duplicate_annotation() {
        let md = "# Title\n\n## Caching {#caching} {#caching-1}\n\ntext\n";
        let issues = check_document("1 Cache.md", md);
        assert_eq!(
            issues,
            vec![Issue::DuplicateAnnotation {
                file: "1 Cache.md".to_string(),
                line: 3,
                heading: "Caching {#caching} {#caching-1}".to_string(),
            }]
        );
    }

    #[test]
    fn test_annotations_in_code_are_ignored() {
        let md = "```bash\n# {#a} {#b}\n```\n";
        assert!(check_document("1 Bash.md", md).is_empty());
    }

    #[test]
    fn test_broken_anchor() {
        let md = "## Present\n\n[gone](#missing) and [here](#present)\n";
        let issues = check_document("1 X.md", md);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].to_string(),
            "1 X.md: link \"gone\" points to missing #missing"
        );
    }

    #[test]
    fn test_check_catalog_reports_unreadable() {
        let catalog = Catalog::new(vec![Section::new("Go", &["1 Go.md", "2 Go.md"])]);
        let source = MemorySource::new().with_file("1 Go.md", "## A\n");

        let issues = check_catalog(&catalog, &source, &[]);
        assert_eq!(
            issues,
            vec![Issue::Unreadable {
                file: "2 Go.md".to_string(),
                reason: "404 Not Found".to_string(),
            }]
        );

        let only = vec!["1 Go.md".to_string()];
        assert!(check_catalog(&catalog, &source, &only).is_empty());
    }
}
