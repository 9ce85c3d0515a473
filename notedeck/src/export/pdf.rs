//! Typst-based PDF rasterizer
//!
//! Converts an export snapshot's node tree into Typst markup and compiles it
//! with fonts bundled by typst-kit.

use super::{ExportError, ExportOptions, ExportSnapshot, Orientation, Rasterizer};
use crate::render::{heading_level, Element, Node};
use std::sync::OnceLock;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};
use typst_kit::fonts::{FontSearcher, FontSlot};

/// Static library instance (created once, reused)
static LIBRARY: OnceLock<LazyHash<Library>> = OnceLock::new();

/// Get or create the standard library
fn get_library() -> &'static LazyHash<Library> {
    LIBRARY.get_or_init(|| LazyHash::new(Library::builder().build()))
}

/// Tags whose content is laid out as blocks
const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "pre",
    "ul",
    "ol",
    "blockquote",
    "table",
    "hr",
    "div",
    "dl",
    "dt",
    "dd",
];

/// Rasterizes snapshots to PDF with Typst
#[derive(Debug, Default)]
pub struct TypstRasterizer {
    /// Also search fonts installed on the system
    pub system_fonts: bool,
}

impl TypstRasterizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rasterizer for TypstRasterizer {
    fn rasterize(
        &self,
        snapshot: &ExportSnapshot,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError> {
        log::debug!(
            "Rasterizing {} ({} paper, image quality {})",
            snapshot.file,
            options.paper,
            options.image_quality
        );

        // Step 1: Generate Typst markup from the snapshot
        let markup = to_typst_markup(snapshot, options);

        // Step 2: Create the World with fonts
        let world = NotedeckWorld::new(markup, self.system_fonts)?;

        // Step 3: Compile the Typst document
        let result = typst::compile(&world);
        let document = result.output.map_err(|errors| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| format!("{}: {}", format_error_location(e, &world), e.message))
                .collect();
            ExportError::CompilationError(messages.join("\n"))
        })?;

        // Step 4: Export to PDF
        typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default())
            .map_err(|e| ExportError::CompilationError(format!("PDF export failed: {:?}", e)))
    }
}

/// The World implementation for a single exported page
struct NotedeckWorld {
    main_source: Source,
    font_book: LazyHash<FontBook>,
    fonts: Vec<FontSlot>,
}

impl NotedeckWorld {
    fn new(markup: String, system_fonts: bool) -> Result<Self, ExportError> {
        let main_id = FileId::new(None, VirtualPath::new("main.typ"));
        let main_source = Source::new(main_id, markup);

        let found = FontSearcher::new()
            .include_system_fonts(system_fonts)
            .search();
        if found.fonts.is_empty() {
            return Err(ExportError::FontError(
                "No fonts could be loaded".to_string(),
            ));
        }

        Ok(Self {
            main_source,
            font_book: LazyHash::new(found.book),
            fonts: found.fonts,
        })
    }
}

impl World for NotedeckWorld {
    fn library(&self) -> &LazyHash<Library> {
        get_library()
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.font_book
    }

    fn main(&self) -> FileId {
        self.main_source.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main_source.id() {
            Ok(self.main_source.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).and_then(FontSlot::get)
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        None
    }
}

/// Format error location from a Typst source diagnostic
fn format_error_location(error: &typst::diag::SourceDiagnostic, world: &NotedeckWorld) -> String {
    let Some(id) = error.span.id() else {
        return "unknown".to_string();
    };

    let Ok(source) = World::source(world, id) else {
        return id.vpath().as_rootless_path().display().to_string();
    };

    let Some(range) = source.range(error.span) else {
        return id.vpath().as_rootless_path().display().to_string();
    };

    let line = source.byte_to_line(range.start).unwrap_or(0) + 1;
    let col = source.byte_to_column(range.start).unwrap_or(0) + 1;
    format!(
        "{}:{}:{}",
        id.vpath().as_rootless_path().display(),
        line,
        col
    )
}

/// Generate the full Typst source for a snapshot
pub fn to_typst_markup(snapshot: &ExportSnapshot, options: &ExportOptions) -> String {
    let mut output = generate_preamble(snapshot, options);
    generate_children(&mut output, &snapshot.tree, 0);
    output
}

fn generate_preamble(snapshot: &ExportSnapshot, options: &ExportOptions) -> String {
    let [top, right, bottom, left] = options.margins_mm;
    let flipped = options.orientation == Orientation::Landscape;

    format!(
        r#"#set document(title: "{title}")
#set page(paper: "{paper}", flipped: {flipped}, margin: (top: {top}mm, right: {right}mm, bottom: {bottom}mm, left: {left}mm))
#set text(font: ("Libertinus Serif", "New Computer Modern"), size: 11pt)
#set heading(numbering: none)

// Code styling: monospace font for all code
#show raw: set text(font: "DejaVu Sans Mono", size: 9pt)
#show raw.where(block: true): it => block(
  fill: luma(245),
  inset: 8pt,
  radius: 4pt,
  width: 100%,
)[#set par(leading: 0.5em); #it]

// Keep headings with following content
#show heading: it => block(above: 1.4em, below: 0.6em, sticky: true)[#it]

"#,
        title = escape_typst_string(&snapshot.file),
        paper = escape_typst_string(&options.paper),
    )
}

/// Emit the children of a container, grouping inline runs into paragraphs
fn generate_children(output: &mut String, element: &Element, indent: usize) {
    let mut inline = String::new();

    for child in &element.children {
        match child {
            Node::Element(el) if is_block(el) => {
                flush_inline(output, &mut inline, indent);
                generate_block(output, el, indent);
            }
            other => inline.push_str(&inline_node(other)),
        }
    }

    flush_inline(output, &mut inline, indent);
}

fn flush_inline(output: &mut String, inline: &mut String, indent: usize) {
    let text = inline.trim();
    if !text.is_empty() {
        output.push_str(&" ".repeat(indent));
        output.push_str(text);
        output.push_str("\n\n");
    }
    inline.clear();
}

fn is_block(element: &Element) -> bool {
    BLOCK_TAGS.contains(&element.tag.as_str())
}

/// Generate Typst markup for a block element
fn generate_block(output: &mut String, element: &Element, indent: usize) {
    let pad = " ".repeat(indent);

    if let Some(level) = heading_level(element) {
        output.push_str(&format!(
            "{}{} {}\n\n",
            pad,
            "=".repeat(level as usize),
            inline_children(element).trim()
        ));
        return;
    }

    match element.tag.as_str() {
        "p" | "dt" | "dd" => {
            let text = inline_children(element);
            if !text.trim().is_empty() {
                output.push_str(&format!("{}{}\n\n", pad, text.trim()));
            }
        }
        "pre" => {
            let code = element
                .child_elements()
                .find(|el| el.tag == "code")
                .unwrap_or(element);
            let language = code
                .attr("class")
                .and_then(|classes| {
                    classes
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-"))
                })
                .unwrap_or("");
            let text = code.text_content();
            output.push_str(&format!(
                "{}{}\n{}\n{}\n\n",
                pad,
                fence_for(&text, language),
                text.trim_end_matches('\n'),
                fence_for(&text, "")
            ));
        }
        "ul" | "ol" => generate_list(output, element, indent),
        "blockquote" => {
            let mut inner = String::new();
            generate_children(&mut inner, element, 0);
            output.push_str(&format!("{}#quote(block: true)[{}]\n\n", pad, inner.trim()));
        }
        "table" => generate_table(output, element, &pad),
        "hr" => output.push_str(&format!("{}#line(length: 100%)\n\n", pad)),
        _ => generate_children(output, element, indent),
    }
}

/// Backtick fence long enough not to collide with the code itself
fn fence_for(code: &str, language: &str) -> String {
    let longest = code
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    format!("{}{}", "`".repeat(longest.max(2) + 1), language)
}

fn generate_list(output: &mut String, list: &Element, indent: usize) {
    let ordered = list.tag == "ol";
    let start: u64 = list
        .attr("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let pad = " ".repeat(indent);

    for (idx, item) in list.child_elements().filter(|el| el.tag == "li").enumerate() {
        let marker = if ordered {
            format!("{}. ", start + idx as u64)
        } else {
            "- ".to_string()
        };

        let mut body = String::new();
        generate_children(&mut body, item, indent + 2);
        let body = body.trim_start();
        output.push_str(&format!("{}{}{}", pad, marker, body.trim_end()));
        output.push('\n');
    }
    output.push('\n');
}

fn generate_table(output: &mut String, table: &Element, pad: &str) {
    let rows: Vec<&Element> = table
        .descendants()
        .into_iter()
        .filter(|el| el.tag == "tr")
        .collect();
    let columns = rows
        .iter()
        .map(|row| row.child_elements().count())
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return;
    }

    output.push_str(&format!("{}#table(\n{}  columns: {},\n", pad, pad, columns));
    for row in rows {
        let mut cells = 0;
        for cell in row.child_elements() {
            let text = inline_children(cell);
            if cell.tag == "th" {
                output.push_str(&format!("{}  [*{}*],\n", pad, text.trim()));
            } else {
                output.push_str(&format!("{}  [{}],\n", pad, text.trim()));
            }
            cells += 1;
        }
        for _ in cells..columns {
            output.push_str(&format!("{}  [],\n", pad));
        }
    }
    output.push_str(&format!("{})\n\n", pad));
}

fn inline_children(element: &Element) -> String {
    element.children.iter().map(inline_node).collect()
}

/// Convert an inline node to Typst markup
fn inline_node(node: &Node) -> String {
    let element = match node {
        Node::Text(text) => return escape_typst(&text.replace('\n', " ")),
        Node::Raw(raw) => return escape_typst(&raw.text),
        Node::Element(el) => el,
    };

    let inner = || inline_children(element);
    match element.tag.as_str() {
        "strong" => format!("#strong[{}]", inner()),
        "em" => format!("#emph[{}]", inner()),
        "del" => format!("#strike[{}]", inner()),
        "sup" => format!("#super[{}]", inner()),
        "sub" => format!("#sub[{}]", inner()),
        "code" => format!("#raw(\"{}\")", escape_typst_string(&element.text_content())),
        "a" => match element.attr("href") {
            Some(href) if !href.starts_with('#') => {
                format!("#link(\"{}\")[{}]", escape_typst_string(href), inner())
            }
            _ => inner(),
        },
        "br" => "\\\n".to_string(),
        "img" => {
            let alt = element.attr("alt").unwrap_or("");
            format!("_\\[Image: {}\\]_", escape_typst(alt))
        }
        "input" => {
            if element.attr("checked").is_some() {
                "\\[x\\] ".to_string()
            } else {
                "\\[ \\] ".to_string()
            }
        }
        _ => inner(),
    }
}

/// Escape special characters for Typst markup
fn escape_typst(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('#', "\\#")
        .replace('$', "\\$")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('`', "\\`")
        .replace('@', "\\@")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('=', "\\=")
        .replace('-', "\\-")
        .replace('+', "\\+")
        .replace('/', "\\/")
        .replace('~', "\\~")
        .replace('"', "\\\"")
}

/// Escape string for use inside Typst string literals (only quotes and backslashes)
fn escape_typst_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
