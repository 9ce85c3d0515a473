//! Command-line interface definitions for notedeck

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the notedeck application
#[derive(Parser)]
#[command(name = "notedeck")]
#[command(version)]
#[command(about = "Browse, render and export markdown study notes", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./notedeck.toml, then the built-in catalog)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for notedeck
#[derive(Subcommand)]
pub enum Commands {
    /// Print the navigation tree
    Nav {
        /// Expand only this section (1-based); all sections are listed otherwise
        #[arg(short, long)]
        section: Option<usize>,
    },

    /// Render one page to HTML
    Render {
        /// File identifier from the catalog (e.g. "1.0 Python.md")
        file: String,

        /// Output file (defaults to the page name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one page to PDF
    Export {
        /// File identifier from the catalog
        file: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Build the static site
    Build {
        /// Output directory
        #[arg(short, long, default_value = "site")]
        output: PathBuf,

        /// Also export every page to PDF
        #[arg(long)]
        pdf: bool,
    },

    /// Interactive session over stdin
    Browse,

    /// Check headings and in-page links
    Check {
        /// Only check these file identifiers
        files: Vec<String>,
    },
}
