//! Catalog of study-note sections
//!
//! The catalog is the fixed, ordered list of sections shown in the navigation
//! panel. Each section owns an ordered list of file identifiers. Order is
//! display order everywhere the catalog is consumed.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A named, ordered group of documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Display name of the section
    pub name: String,

    /// File identifiers in display order
    #[serde(default)]
    pub files: Vec<String>,
}

impl Section {
    /// Create a section from a name and a list of file identifiers
    pub fn new<S: Into<String>>(name: S, files: &[&str]) -> Self {
        Self {
            name: name.into(),
            files: files.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

/// The full, read-only catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    sections: Vec<Section>,
}

impl Catalog {
    /// Build a catalog from sections, preserving their order
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// The catalog shipped with the notes repository
    pub fn builtin() -> Self {
        Self::new(vec![
            Section::new("Python", &["1.0 Python.md", "2 Python.md"]),
            Section::new("Java", &["1.0 Java.md", "2 Java.md"]),
            Section::new("C#", &["1.0 C#.md", "2 C#.md"]),
            Section::new(
                "Software Engineering",
                &["1.0 Soft Eng.md", "2 Soft Eng.md"],
            ),
            Section::new(
                "Database Management Systems",
                &["1.0 DBMS.md", "2 DBMS.md"],
            ),
            Section::new("Internet & Web", &["1.0 Int & web.md", "2 Int & web.md"]),
            Section::new(
                "Computer Networks",
                &["1.0 Computer Networks.md", "2 Computer Networks.md"],
            ),
            Section::new("OSI Model", &["1.0 OSI.md", "2 OSI.md"]),
            Section::new(
                "System Design",
                &["1.0 systm.md", "2 systm.md", "3 System.md"],
            ),
            Section::new("Linux", &["1.0 linux.md", "2 linux.md"]),
        ])
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Look up the file identifier at `(section, page)`
    pub fn file(&self, section: usize, page: usize) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.files.get(page))
            .map(String::as_str)
    }

    /// Find the `(section, page)` position of a file identifier
    pub fn position_of(&self, file: &str) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(si, section)| {
            section
                .files
                .iter()
                .position(|f| f == file)
                .map(|pi| (si, pi))
        })
    }

    /// All file identifiers in catalog order
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.files.iter().map(String::as_str))
    }

    /// Distinct file identifiers; the first listing wins
    pub fn unique_files(&self) -> impl Iterator<Item = &str> {
        self.files().unique()
    }

    /// File identifiers listed more than once, in order of their second listing
    pub fn duplicate_files(&self) -> Vec<&str> {
        self.files().duplicates().collect()
    }
}
