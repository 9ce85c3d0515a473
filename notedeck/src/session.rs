//! Line-oriented browsing session
//!
//! Reads one command per line and drives [`BrowserState`] transitions, the
//! same ones the navigation and content panels trigger.

use crate::browser::{BrowserState, ContentPanel};
use crate::export::{ExportOptions, Rasterizer};
use crate::loader::ContentSource;
use crate::navigation::PagePosition;
use crate::title::page_title;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

const HELP: &str = "\
Commands:
  nav                     show the navigation panel
  toggle <section>        expand or collapse a section
  open <section> <page>   open a page (numbers as shown by nav)
  outline                 list the page outline
  show                    print the page text
  export [DIR]            save the page as PDF
  help                    show this help
  quit                    leave the session
";

/// One parsed session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Nav,
    Toggle(usize),
    Open(PagePosition),
    Outline,
    Show,
    Export(Option<PathBuf>),
    Help,
    Quit,
}

/// Errors for lines that are not valid commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("missing {0}")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a number from 1 up")]
    BadNumber(String),
}

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let command = match name {
        "nav" => Command::Nav,
        "toggle" => Command::Toggle(index_arg(words.next(), "section number")?),
        "open" => {
            let section = index_arg(words.next(), "section number")?;
            let page = index_arg(words.next(), "page number")?;
            Command::Open(PagePosition { section, page })
        }
        "outline" => Command::Outline,
        "show" => Command::Show,
        "export" => Command::Export(words.next().map(PathBuf::from)),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Parse a 1-based number into a 0-based index
fn index_arg(word: Option<&str>, what: &'static str) -> Result<usize, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument(what))?;
    match word.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::BadNumber(word.to_string())),
    }
}

/// An interactive browsing session
pub struct Session<'a> {
    state: BrowserState,
    source: &'a dyn ContentSource,
    rasterizer: &'a dyn Rasterizer,
    options: ExportOptions,
    export_dir: PathBuf,
}

impl<'a> Session<'a> {
    pub fn new(
        state: BrowserState,
        source: &'a dyn ContentSource,
        rasterizer: &'a dyn Rasterizer,
        options: ExportOptions,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            state,
            source,
            rasterizer,
            options,
            export_dir,
        }
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        write!(out, "{}", self.state.navigation_view().to_text())?;
        writeln!(out, "Type 'help' for commands.")?;

        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if !self.execute(command, &mut out)? {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
        Ok(())
    }

    /// Run one command; returns `false` when the session should end
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<bool> {
        match command {
            Command::Nav => write!(out, "{}", self.state.navigation_view().to_text())?,
            Command::Toggle(section) => {
                if section >= self.state.catalog().len() {
                    writeln!(out, "No section {}", section + 1)?;
                } else {
                    self.state.toggle_section(section);
                    write!(out, "{}", self.state.navigation_view().to_text())?;
                }
            }
            Command::Open(position) => {
                if self.state.open(self.source, position).is_none() {
                    writeln!(
                        out,
                        "No page {} in section {}",
                        position.page + 1,
                        position.section + 1
                    )?;
                } else {
                    self.report_content(out)?;
                }
            }
            Command::Outline => match self.state.content().document() {
                Some(doc) if !doc.outline.is_empty() => {
                    for entry in &doc.outline {
                        let indent = "  ".repeat(usize::from(entry.level.as_u8() - 2));
                        writeln!(out, "{}- {} (#{})", indent, entry.text, entry.id)?;
                    }
                }
                Some(_) => writeln!(out, "This page has no outline")?,
                None => writeln!(out, "No page is open")?,
            },
            Command::Show => match self.state.content().document() {
                Some(doc) => writeln!(out, "{}", doc.tree.text_content().trim_end())?,
                None => self.report_content(out)?,
            },
            Command::Export(dir) => {
                let dir = dir.unwrap_or_else(|| self.export_dir.clone());
                if let Ok(path) = self.state.export(self.rasterizer, &self.options, &dir) {
                    writeln!(out, "Saved {}", path.display())?;
                }
                for notice in self.state.take_notices() {
                    writeln!(out, "! {}", notice.message)?;
                }
            }
            Command::Help => write!(out, "{}", HELP)?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn report_content<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.state.content() {
            ContentPanel::Welcome => writeln!(out, "No page is open"),
            ContentPanel::Loading { file } => writeln!(out, "Loading {}...", file),
            ContentPanel::Document(doc) => writeln!(
                out,
                "Opened {} ({} outline entries)",
                page_title(&doc.file),
                doc.outline.len()
            ),
            ContentPanel::Failed { message, .. } => {
                writeln!(out, "Error loading content: {}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Section};
    use crate::export::{ExportError, ExportSnapshot};
    use crate::loader::MemorySource;

    struct NoRasterizer;

    impl Rasterizer for NoRasterizer {
        fn rasterize(
            &self,
            _snapshot: &ExportSnapshot,
            _options: &ExportOptions,
        ) -> Result<Vec<u8>, ExportError> {
            Err(ExportError::FontError("unavailable".to_string()))
        }
    }

    fn run(script: &str) -> String {
        let catalog = Catalog::new(vec![
            Section::new("Python", &["1.0 Python.md", "2 Python.md"]),
            Section::new("Java", &["1.0 Java.md"]),
        ]);
        let source = MemorySource::new().with_file(
            "1.0 Python.md",
            "# Python\n\n## Lists\n\nOrdered.\n\n### Slicing\n",
        );
        let mut session = Session::new(
            BrowserState::new(catalog),
            &source,
            &NoRasterizer,
            ExportOptions::default(),
            std::env::temp_dir(),
        );
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  "), Ok(None));
        assert_eq!(
            parse_command("open 2 1"),
            Ok(Some(Command::Open(PagePosition { section: 1, page: 0 })))
        );
        assert_eq!(
            parse_command("toggle"),
            Err(CommandError::MissingArgument("section number"))
        );
        assert_eq!(
            parse_command("toggle 0"),
            Err(CommandError::BadNumber("0".to_string()))
        );
        assert_eq!(
            parse_command("fly"),
            Err(CommandError::Unknown("fly".to_string()))
        );
    }

    #[test]
    fn test_open_and_outline() {
        let output = run("toggle 1\nopen 1 1\noutline\nquit\nnav\n");
        assert!(output.contains("[-] 1. Python\n     1. Python - Part 1.0\n"));
        assert!(output.contains("Opened Python - Part 1.0 (2 outline entries)"));
        assert!(output.contains("- Lists (#lists)\n  - Slicing (#slicing)\n"));
        // nothing runs after quit
        assert_eq!(output.matches("[+] 2. Java").count(), 2);
    }

    #[test]
    fn test_open_missing_page_reports_error() {
        let output = run("open 1 2\n");
        assert!(output.contains("Error loading content: Failed to load 2 Python.md: 404 Not Found"));
    }

    #[test]
    fn test_export_with_nothing_open() {
        let output = run("export\n");
        assert!(output.contains("! Please load a document before generating a PDF."));
    }

    #[test]
    fn test_export_failure_is_reported() {
        let output = run("open 1 1\nexport\n");
        assert!(output.contains("! Error generating PDF: Font loading error: unavailable"));
    }
}
