//! Content loading
//!
//! Retrieves a catalog file through a [`ContentSource`], strips emoji, renders
//! it, inserts the page outline and highlights code blocks. The result is a
//! [`LoadedDocument`], always built fresh from source.

use crate::emoji::strip_emoji;
use crate::outline::{insert_outline, HeadingEntry};
use crate::render::{highlight_code_blocks, render_markdown, Element, RenderError};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Characters `encodeURIComponent` leaves alone, everything else is escaped
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a file identifier for use as a resource locator
pub fn encode_locator(file: &str) -> String {
    utf8_percent_encode(file, COMPONENT).to_string()
}

/// Decode a resource locator back into a file identifier
pub fn decode_locator(locator: &str) -> Result<String, FetchError> {
    percent_decode_str(locator)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| FetchError::Malformed(format!("{}: {}", locator, e)))
}

/// Failures reported by a content source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source answered with a non-success status
    #[error("{code} {reason}")]
    Status { code: u16, reason: String },

    /// The locator could not be decoded
    #[error("malformed locator {0}")]
    Malformed(String),

    /// The resource was found but is not valid text
    #[error("resource is not valid UTF-8")]
    NotText,
}

impl FetchError {
    pub fn not_found() -> Self {
        FetchError::Status {
            code: 404,
            reason: "Not Found".to_string(),
        }
    }
}

/// Key to text lookup for catalog files
pub trait ContentSource {
    /// Retrieve raw text for a percent-encoded locator
    fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

/// Serves files from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for DirectorySource {
    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        let file = decode_locator(locator)?;

        // Identifiers name files directly inside the content root
        if file.contains('/') || file.contains('\\') || file == ".." {
            return Err(FetchError::Status {
                code: 403,
                reason: "Forbidden".to_string(),
            });
        }

        let path = self.root.join(&file);
        log::debug!("Reading {}", path.display());
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::not_found(),
            _ => FetchError::Status {
                code: 500,
                reason: e.to_string(),
            },
        })?;

        String::from_utf8(bytes).map_err(|_| FetchError::NotText)
    }
}

/// Serves files from memory, keyed by file identifier
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<K: Into<String>, V: Into<String>>(mut self, file: K, text: V) -> Self {
        self.insert(file, text);
        self
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, file: K, text: V) {
        self.files.insert(file.into(), text.into());
    }
}

impl ContentSource for MemorySource {
    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        let file = decode_locator(locator)?;
        self.files.get(&file).cloned().ok_or_else(FetchError::not_found)
    }
}

/// Errors that end a load; shown inline in the content panel
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load {file}: {source}")]
    Fetch {
        file: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to render {file}: {source}")]
    Render {
        file: String,
        #[source]
        source: RenderError,
    },
}

/// The single, fully rendered document on display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// Catalog file identifier the document was loaded from
    pub file: String,
    /// Rendered tree, outline first when one was generated
    pub tree: Element,
    /// Outline entries (empty when no outline was inserted)
    pub outline: Vec<HeadingEntry>,
}

/// Retrieve and render a document
///
/// # Parameters
/// * `source` - Where raw markdown is fetched from
/// * `file` - Catalog file identifier (encoded before retrieval)
///
/// # Returns
/// * `Ok(LoadedDocument)` - Rendered tree with outline and highlighted code
/// * `Err(LoadError)` - Retrieval or processing failed
pub fn load_document(source: &dyn ContentSource, file: &str) -> Result<LoadedDocument, LoadError> {
    let locator = encode_locator(file);
    let raw = source.fetch(&locator).map_err(|e| LoadError::Fetch {
        file: file.to_string(),
        source: e,
    })?;

    let markdown = strip_emoji(&raw);
    let mut tree = render_markdown(&markdown);
    let outline = insert_outline(&mut tree);
    let highlighted = highlight_code_blocks(&mut tree).map_err(|e| LoadError::Render {
        file: file.to_string(),
        source: e,
    })?;

    log::info!(
        "Loaded {} ({} outline entries, {} code blocks)",
        file,
        outline.len(),
        highlighted
    );

    Ok(LoadedDocument {
        file: file.to_string(),
        tree,
        outline,
    })
}
