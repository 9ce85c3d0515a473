//! Heading identifiers
//!
//! Identifiers are derived from the visible heading text. A trailing
//! `{#custom-id}` annotation is removed from the text but its value is not
//! used for the identifier.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static ANNOTATION: OnceLock<Regex> = OnceLock::new();
static NON_WORD: OnceLock<Regex> = OnceLock::new();

fn annotation() -> &'static Regex {
    ANNOTATION.get_or_init(|| Regex::new(r"\s*\{#.*?\}\s*$").expect("valid annotation regex"))
}

fn non_word() -> &'static Regex {
    NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid identifier regex"))
}

/// Remove a trailing `{#...}` annotation (and surrounding whitespace)
pub fn strip_id_annotation(text: &str) -> String {
    annotation().replace(text, "").into_owned()
}

/// Lower-case the text and collapse every run of non-word characters to `-`
///
/// `"Load Balancing!"` becomes `"load-balancing-"`, `"A & B"` becomes `"a-b"`.
pub fn heading_id(text: &str) -> String {
    non_word()
        .replace_all(&text.to_lowercase(), "-")
        .into_owned()
}

/// Hands out identifiers that are unique within one document
#[derive(Debug, Default)]
pub struct HeadingIds {
    seen: HashMap<String, usize>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as taken without handing it out
    pub fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_string()).or_insert(0);
    }

    /// Return `base` the first time it is seen, then `base-1`, `base-2`, ...
    pub fn unique(&mut self, base: &str) -> String {
        let mut count = match self.seen.get(base) {
            Some(&count) => count,
            None => {
                self.seen.insert(base.to_string(), 0);
                return base.to_string();
            }
        };

        let candidate = loop {
            count += 1;
            let candidate = format!("{}-{}", base, count);
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
        };

        self.seen.insert(base.to_string(), count);
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}
