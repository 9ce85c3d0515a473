//! notedeck - markdown study notes browser
//!
//! A CLI for browsing a catalog of markdown notes, rendering pages to HTML,
//! building a static site and exporting pages to PDF.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

use anyhow::{Context, Result};
use clap::Parser;
use notedeck::browser::{BrowserState, ContentPanel};
use notedeck::catalog::Catalog;
use notedeck::check::check_catalog;
use notedeck::cli::{Cli, Commands};
use notedeck::config::NotedeckConfig;
use notedeck::export::{Rasterizer, TypstRasterizer};
use notedeck::loader::DirectorySource;
use notedeck::session::Session;
use notedeck::site::{build_site, page_file_name, render_page};
use std::path::{Path, PathBuf};

/// Main entry point for the notedeck CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG applies unless --verbose is given
    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let (config, root) = NotedeckConfig::resolve(cli.config.as_deref(), &cwd)
        .context("Failed to load configuration")?;
    let catalog = config.catalog();
    let source = DirectorySource::new(&root);

    match cli.command {
        Commands::Nav { section } => handle_nav_command(&catalog, section)?,

        Commands::Render { file, output } => {
            handle_render_command(&config, &catalog, &source, &file, output)?;
        }

        Commands::Export { file, output } => {
            handle_export_command(&config, &catalog, &source, &file, &output)?;
        }

        Commands::Build { output, pdf } => {
            handle_build_command(&config, &catalog, &source, &output, pdf)?;
        }

        Commands::Browse => {
            let rasterizer = TypstRasterizer::new();
            let mut session = Session::new(
                BrowserState::new(catalog),
                &source,
                &rasterizer,
                config.export.clone(),
                cwd,
            );
            let stdin = std::io::stdin();
            session
                .run(stdin.lock(), std::io::stdout())
                .context("Browse session failed")?;
        }

        Commands::Check { files } => handle_check_command(&catalog, &source, &files)?,
    }

    Ok(())
}

/// Handle the nav command
fn handle_nav_command(catalog: &Catalog, section: Option<usize>) -> Result<()> {
    let state = BrowserState::new(catalog.clone());
    let mut view = match section {
        Some(number) => {
            anyhow::ensure!(
                (1..=catalog.len()).contains(&number),
                "No section {} (the catalog has {})",
                number,
                catalog.len()
            );
            state.navigation().toggle_section(number - 1).view(catalog)
        }
        None => state.navigation_view(),
    };

    if section.is_none() {
        for entry in &mut view.sections {
            entry.expanded = true;
        }
    }

    print!("{}", view.to_text());
    Ok(())
}

/// Open one catalog entry, failing when it is unknown or does not load
fn open_page(
    catalog: &Catalog,
    source: &DirectorySource,
    file: &str,
) -> Result<BrowserState> {
    let mut state = BrowserState::new(catalog.clone());
    state
        .open_file(source, file)
        .with_context(|| format!("'{}' is not in the catalog. Run 'notedeck nav' to list pages", file))?;
    Ok(state)
}

/// Handle the render command
fn handle_render_command(
    config: &NotedeckConfig,
    catalog: &Catalog,
    source: &DirectorySource,
    file: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let state = open_page(catalog, source, file)?;
    let output = output.unwrap_or_else(|| PathBuf::from(page_file_name(file)));

    let html = render_page(&state, &config.title, None).context("Failed to render page")?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    std::fs::write(&output, html)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(failure) = load_failure(&state) {
        anyhow::bail!("{} (error page written to {})", failure, output.display());
    }
    println!("✓ Successfully wrote: {}", output.display());
    Ok(())
}

/// Handle the export command
fn handle_export_command(
    config: &NotedeckConfig,
    catalog: &Catalog,
    source: &DirectorySource,
    file: &str,
    output: &Path,
) -> Result<()> {
    let mut state = open_page(catalog, source, file)?;
    if let Some(failure) = load_failure(&state) {
        anyhow::bail!(failure);
    }

    println!("Generating PDF...");
    let rasterizer = TypstRasterizer::new();
    let path = state
        .export(&rasterizer, &config.export, output)
        .with_context(|| format!("Failed to export {} to PDF", file))?;
    println!("✓ Successfully wrote: {}", path.display());
    Ok(())
}

/// Handle the build command
fn handle_build_command(
    config: &NotedeckConfig,
    catalog: &Catalog,
    source: &DirectorySource,
    output: &Path,
    pdf: bool,
) -> Result<()> {
    println!("Building site...");
    println!("Content: {}", source.root().display());
    println!("Output: {}", output.display());

    let rasterizer = TypstRasterizer::new();
    let export = pdf.then_some((&rasterizer as &dyn Rasterizer, &config.export));

    let summary = build_site(catalog, source, &config.title, output, export)
        .with_context(|| format!("Failed to build site in {}", output.display()))?;

    println!("✓ Wrote {} pages", summary.pages.len());
    if pdf {
        println!("✓ Wrote {} PDFs", summary.pdfs.len());
    }
    for file in &summary.failed {
        println!("✗ Could not load {}", file);
    }
    for (file, message) in &summary.pdf_failed {
        println!("✗ No PDF for {}: {}", file, message);
    }

    println!("\n✓ Build completed successfully!");
    Ok(())
}

/// Handle the check command
fn handle_check_command(catalog: &Catalog, source: &DirectorySource, files: &[String]) -> Result<()> {
    for file in files {
        anyhow::ensure!(
            catalog.position_of(file).is_some(),
            "'{}' is not in the catalog",
            file
        );
    }

    let issues = check_catalog(catalog, source, files);
    for issue in &issues {
        println!("{}", issue);
    }

    if !issues.is_empty() {
        anyhow::bail!("{} issue(s) found", issues.len());
    }
    println!("✓ No issues found");
    Ok(())
}

/// The failure message shown in the content panel, if the load failed
fn load_failure(state: &BrowserState) -> Option<String> {
    match state.content() {
        ContentPanel::Failed { message, .. } => Some(message.clone()),
        _ => None,
    }
}
