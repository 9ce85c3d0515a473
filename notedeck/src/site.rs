//! Static HTML surface
//!
//! Writes one self-contained page per catalog entry. Every page carries the
//! navigation panel (its own section expanded, its own entry selected) and
//! the content panel, so the site can be browsed without any script.

use crate::browser::BrowserState;
use crate::catalog::Catalog;
use crate::export::{ExportOptions, Rasterizer};
use crate::loader::{encode_locator, ContentSource};
use crate::render::{escape_html, highlight_css, RenderError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing the site
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Stylesheet generation failed: {0}")]
    Style(#[from] RenderError),
}

/// Outcome of a site build
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SiteSummary {
    /// Pages written, `index.html` included
    pub pages: Vec<PathBuf>,
    /// Catalog entries whose content could not be loaded
    pub failed: Vec<String>,
    /// PDFs written next to the pages
    pub pdfs: Vec<PathBuf>,
    /// Catalog entries whose PDF export failed, with the message shown for it
    pub pdf_failed: Vec<(String, String)>,
}

/// Map a file identifier to its page file name
pub fn page_file_name(file: &str) -> String {
    match file.strip_suffix(".md") {
        Some(stem) => format!("{}.html", stem),
        None => format!("{}.html", file),
    }
}

/// Relative link to a file's page
pub fn page_href(file: &str) -> String {
    encode_locator(&page_file_name(file))
}

/// Render the full HTML document for the current browser state
///
/// # Parameters
/// * `state` - Navigation and content panel to show
/// * `title` - Site title
/// * `pdf_href` - Target of the "Save as PDF" link, if a PDF exists
///
/// # Returns
/// * `Ok(String)` - Complete HTML document
/// * `Err(RenderError)` - Highlight stylesheet could not be generated
pub fn render_page(
    state: &BrowserState,
    title: &str,
    pdf_href: Option<&str>,
) -> Result<String, RenderError> {
    let mut output = String::new();

    let page_title = match state.content().file() {
        Some(file) => format!("{} - {}", crate::title::page_title(file), title),
        None => title.to_string(),
    };
    write_html_header(&mut output, &page_title, &highlight_css()?);

    output.push_str("<body>\n");
    output.push_str("<div class=\"layout\">\n");

    // Navigation panel
    output.push_str("<nav class=\"sidebar\">\n");
    output.push_str(&format!(
        "<h1 class=\"site-title\"><a href=\"index.html\">{}</a></h1>\n",
        escape_html(title)
    ));
    let nav = state.navigation_view().to_element(page_href);
    output.push_str(&nav.to_html());
    output.push_str("\n</nav>\n");

    // Content panel
    output.push_str("<main class=\"content\">\n");
    if let Some(href) = pdf_href {
        output.push_str(&format!(
            "<a class=\"pdf-button\" href=\"{}\" download>Save as PDF</a>\n",
            escape_html(href)
        ));
    }
    let mut content = state.content().to_element();
    if let Some(doc) = state.content().document() {
        content.set_attr("data-current-file", doc.file.clone());
    }
    content.set_attr("id", "markdown-content");
    output.push_str(&content.to_html());
    output.push_str("\n</main>\n");

    output.push_str("</div>\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");

    Ok(output)
}

/// Write the index page and one page per catalog entry into `output_dir`
///
/// Load failures do not abort the build: the page shows the error panel and
/// the entry is listed in [`SiteSummary::failed`]. When `pdf` is given, each
/// loaded page is also exported and linked from its "Save as PDF" button;
/// export failures leave the page without the button and are listed in
/// [`SiteSummary::pdf_failed`].
pub fn build_site(
    catalog: &Catalog,
    source: &dyn ContentSource,
    title: &str,
    output_dir: &Path,
    pdf: Option<(&dyn Rasterizer, &ExportOptions)>,
) -> Result<SiteSummary, SiteError> {
    fs::create_dir_all(output_dir)?;
    let mut summary = SiteSummary::default();

    let index = BrowserState::new(catalog.clone());
    let index_path = output_dir.join("index.html");
    fs::write(&index_path, render_page(&index, title, None)?)?;
    summary.pages.push(index_path);

    for file in catalog.unique_files() {
        let mut state = BrowserState::new(catalog.clone());
        state.open_file(source, file);

        let mut pdf_href = None;
        if state.content().document().is_none() {
            summary.failed.push(file.to_string());
        } else if let Some((rasterizer, options)) = pdf {
            match state.export(rasterizer, options, output_dir) {
                Ok(path) => {
                    pdf_href = path
                        .file_name()
                        .map(|name| encode_locator(&name.to_string_lossy()));
                    summary.pdfs.push(path);
                }
                Err(e) => {
                    log::error!("PDF export of {} failed: {}", file, e);
                    let message = state
                        .take_notices()
                        .pop()
                        .map_or_else(|| e.to_string(), |notice| notice.message);
                    summary.pdf_failed.push((file.to_string(), message));
                }
            }
        }

        let page_path = output_dir.join(page_file_name(file));
        fs::write(&page_path, render_page(&state, title, pdf_href.as_deref())?)?;
        log::info!("Wrote {}", page_path.display());
        summary.pages.push(page_path);
    }

    Ok(summary)
}

/// Write HTML header with CSS styling
fn write_html_header(output: &mut String, title: &str, highlight: &str) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(CSS_STYLES);
    output.push_str(highlight);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
}

const CSS_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Oxygen',
                 'Ubuntu', 'Cantarell', 'Fira Sans', 'Droid Sans', 'Helvetica Neue',
                 sans-serif;
    line-height: 1.6;
    color: #333;
    background-color: #f5f5f5;
}

.layout {
    display: flex;
    min-height: 100vh;
}

.sidebar {
    width: 300px;
    flex-shrink: 0;
    background: #1f2933;
    color: #e4e7eb;
    padding: 20px;
    overflow-y: auto;
}

.site-title {
    font-size: 1.4em;
    margin-bottom: 20px;
}

.site-title a {
    color: inherit;
    text-decoration: none;
}

#toc-list,
.section-pages {
    list-style: none;
}

.section-title {
    display: block;
    font-weight: 600;
    padding: 6px 0;
    cursor: pointer;
}

.section-pages {
    display: none;
    padding-left: 12px;
}

.section-pages.active {
    display: block;
}

.page-link {
    display: block;
    color: #9aa5b1;
    text-decoration: none;
    padding: 3px 0;
}

.page-link.active {
    color: #ffffff;
    font-weight: 600;
}

.content {
    flex: 1;
    max-width: 900px;
    margin: 0 auto;
    background: white;
    padding: 60px;
    position: relative;
}

.pdf-button {
    position: absolute;
    top: 20px;
    right: 20px;
    padding: 6px 12px;
    background: #0066cc;
    color: white;
    border-radius: 4px;
    text-decoration: none;
}

.markdown-body h1,
.markdown-body h2,
.markdown-body h3,
.markdown-body h4 {
    margin-top: 1.4em;
    margin-bottom: 0.6em;
    color: #1a1a1a;
}

.markdown-body p,
.markdown-body ul,
.markdown-body ol,
.markdown-body pre,
.markdown-body table,
.markdown-body blockquote {
    margin-bottom: 1em;
}

.markdown-body ul,
.markdown-body ol {
    padding-left: 2em;
}

.markdown-body pre {
    background: #f6f8fa;
    padding: 12px;
    border-radius: 4px;
    overflow-x: auto;
}

.markdown-body code {
    font-family: 'SFMono-Regular', Consolas, 'Liberation Mono', Menlo, monospace;
    font-size: 0.9em;
}

.markdown-body table {
    border-collapse: collapse;
}

.markdown-body th,
.markdown-body td {
    border: 1px solid #ddd;
    padding: 6px 10px;
}

.markdown-body blockquote {
    border-left: 4px solid #ddd;
    padding-left: 12px;
    color: #666;
}

.page-toc {
    background: #f9f9f9;
    border-left: 4px solid #0066cc;
    padding: 12px 20px;
    margin-bottom: 30px;
}

.page-toc ul {
    list-style: none;
}

.page-toc .toc-h3 {
    padding-left: 1em;
}

.page-toc .toc-h4 {
    padding-left: 2em;
}

.welcome-message {
    text-align: center;
    margin-top: 80px;
    color: #666;
}

.error {
    color: #b00020;
    background: #fdecea;
    padding: 12px;
    border-radius: 4px;
}

.loading {
    color: #666;
}
"#;
