//! PDF export of the displayed document
//!
//! Export never touches the displayed tree. An [`ExportSnapshot`] is derived
//! from the loaded document (outline removed, hidden content made visible)
//! and handed to a [`Rasterizer`].

use crate::loader::LoadedDocument;
use crate::outline::remove_outline;
use crate::render::Element;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod pdf;

pub use pdf::{to_typst_markup, TypstRasterizer};

/// Typst export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Please load a document before generating a PDF.")]
    NothingLoaded,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Typst compilation failed: {0}")]
    CompilationError(String),

    #[error("Font loading error: {0}")]
    FontError(String),
}

/// Page orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Fixed page settings passed to the rasterizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Margins in millimetres: top, right, bottom, left
    pub margins_mm: [f32; 4],

    /// Paper name understood by the rasterizer (e.g. `a4`, `us-letter`)
    pub paper: String,

    pub orientation: Orientation,

    /// Encoding quality for embedded raster images (0.0 - 1.0)
    pub image_quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            margins_mm: [10.0, 10.0, 10.0, 10.0],
            paper: "a4".to_string(),
            orientation: Orientation::Portrait,
            image_quality: 0.98,
        }
    }
}

/// Export-ready copy of a loaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSnapshot {
    pub file: String,
    pub tree: Element,
}

impl ExportSnapshot {
    /// Derive the export tree: no outline, nothing hidden
    pub fn from_document(doc: &LoadedDocument) -> Self {
        let mut tree = doc.tree.clone();
        remove_outline(&mut tree);
        tree.walk_mut(&mut make_visible);
        Self {
            file: doc.file.clone(),
            tree,
        }
    }

    /// Target file name: `.md` replaced by `.pdf`
    pub fn file_name(&self) -> String {
        pdf_file_name(&self.file)
    }
}

/// Map a file identifier to its PDF file name
pub fn pdf_file_name(file: &str) -> String {
    if file.is_empty() {
        return "document.pdf".to_string();
    }
    match file.strip_suffix(".md") {
        Some(stem) => format!("{}.pdf", stem),
        None => format!("{}.pdf", file),
    }
}

/// Drop anything that would hide an element
fn make_visible(element: &mut Element) {
    element.remove_attr("hidden");

    let Some(style) = element.attr("style") else {
        return;
    };
    let kept: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let compact: String = decl.chars().filter(|c| !c.is_whitespace()).collect();
            let compact = compact.to_ascii_lowercase();
            compact != "display:none" && compact != "visibility:hidden"
        })
        .collect();

    if kept.is_empty() {
        element.remove_attr("style");
    } else {
        let style = format!("{};", kept.join("; "));
        element.set_attr("style", style);
    }
}

/// Turns an export snapshot into document bytes
pub trait Rasterizer {
    fn rasterize(
        &self,
        snapshot: &ExportSnapshot,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError>;
}

/// Rasterize a snapshot and write it into `output_dir`
///
/// # Returns
/// * `Ok(PathBuf)` - Path of the written PDF
/// * `Err(ExportError)` - Rasterization or writing failed
pub fn write_pdf(
    snapshot: &ExportSnapshot,
    rasterizer: &dyn Rasterizer,
    options: &ExportOptions,
    output_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = rasterizer.rasterize(snapshot, options)?;

    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(snapshot.file_name());
    std::fs::write(&output_path, bytes)?;

    log::info!("Wrote {}", output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_document, MemorySource};
    use crate::outline::OUTLINE_CLASS;
    use crate::render::Node;

    fn loaded(markdown: &str) -> LoadedDocument {
        let source = MemorySource::new().with_file("1.0 OSI.md", markdown);
        load_document(&source, "1.0 OSI.md").unwrap()
    }

    #[test]
    fn test_pdf_file_name() {
        assert_eq!(pdf_file_name("1.0 OSI.md"), "1.0 OSI.pdf");
        assert_eq!(pdf_file_name("notes"), "notes.pdf");
        assert_eq!(pdf_file_name(""), "document.pdf");
    }

    #[test]
    fn test_snapshot_removes_outline_from_copy_only() {
        let doc = loaded("## Physical\n\n## Data Link\n");
        let snapshot = ExportSnapshot::from_document(&doc);

        assert!(doc.tree.to_html().contains(OUTLINE_CLASS));
        assert!(!snapshot.tree.to_html().contains(OUTLINE_CLASS));
        assert_eq!(snapshot.file_name(), "1.0 OSI.pdf");
    }

    #[test]
    fn test_snapshot_makes_everything_visible() {
        let mut doc = loaded("## A\n\ntext\n");
        let hidden = Element::new("p")
            .with_attr("style", "color: red; display:none")
            .with_attr("hidden", "")
            .with_text("collapsed");
        doc.tree.children.push(Node::Element(hidden));

        let snapshot = ExportSnapshot::from_document(&doc);
        let last = snapshot.tree.child_elements().last().unwrap();
        assert_eq!(last.attr("style"), Some("color: red;"));
        assert_eq!(last.attr("hidden"), None);

        let original = doc.tree.child_elements().last().unwrap();
        assert_eq!(original.attr("hidden"), Some(""));
    }

    #[test]
    fn test_make_visible_drops_empty_style() {
        let mut el = Element::new("div").with_attr("style", "visibility: hidden");
        make_visible(&mut el);
        assert_eq!(el.attr("style"), None);
    }
}
