//! Application state for the notes browser
//!
//! [`BrowserState`] composes the navigation panel, the content panel and the
//! queue of blocking notices. Loads are split into `begin_load` and
//! `complete_load` so that a slow, superseded load can never overwrite the
//! result of a later one.

use crate::catalog::Catalog;
use crate::export::{write_pdf, ExportError, ExportOptions, ExportSnapshot, Rasterizer};
use crate::loader::{load_document, ContentSource, LoadError, LoadedDocument};
use crate::navigation::{NavigationState, NavigationTree, PagePosition};
use crate::render::Element;
use std::path::{Path, PathBuf};

/// Class of the placeholder shown before any page is opened
pub const WELCOME_CLASS: &str = "welcome-message";

/// Sequence token handed out by [`BrowserState::begin_load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Whether a completed load was applied to the content panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A newer load was started after this one; the outcome was dropped
    Stale,
}

/// What the content panel currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPanel {
    Welcome,
    Loading { file: String },
    Document(LoadedDocument),
    Failed { file: String, message: String },
}

impl ContentPanel {
    pub fn is_loading(&self) -> bool {
        matches!(self, ContentPanel::Loading { .. })
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        match self {
            ContentPanel::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// File identifier the panel refers to, if any
    pub fn file(&self) -> Option<&str> {
        match self {
            ContentPanel::Welcome => None,
            ContentPanel::Loading { file } | ContentPanel::Failed { file, .. } => Some(file),
            ContentPanel::Document(doc) => Some(&doc.file),
        }
    }

    /// Markup of the panel body
    pub fn to_element(&self) -> Element {
        match self {
            ContentPanel::Welcome => Element::new("div")
                .with_attr("class", WELCOME_CLASS)
                .with_child(Element::new("h1").with_text("Study Notes"))
                .with_child(
                    Element::new("p")
                        .with_text("Select a page from the navigation panel to start reading."),
                ),
            ContentPanel::Loading { file } => Element::new("div")
                .with_attr("class", "loading")
                .with_attr("data-file", file.clone())
                .with_text("Loading..."),
            ContentPanel::Document(doc) => doc.tree.clone(),
            ContentPanel::Failed { message, .. } => Element::new("div")
                .with_attr("class", "error")
                .with_text(format!("Error loading content: {}", message)),
        }
    }
}

/// A blocking, user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// Navigation, content panel and notices of one browsing session
#[derive(Debug, Clone)]
pub struct BrowserState {
    catalog: Catalog,
    navigation: NavigationState,
    content: ContentPanel,
    latest: u64,
    busy: bool,
    notices: Vec<Notice>,
}

/// Clears the in-progress flag on every exit path
struct BusyGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> BusyGuard<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

impl BrowserState {
    pub fn new(catalog: Catalog) -> Self {
        let navigation = NavigationState::new(&catalog);
        Self {
            catalog,
            navigation,
            content: ContentPanel::Welcome,
            latest: 0,
            busy: false,
            notices: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn content(&self) -> &ContentPanel {
        &self.content
    }

    /// Whether an export is in progress
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn navigation_view(&self) -> NavigationTree {
        self.navigation.view(&self.catalog)
    }

    /// Accordion toggle of a section header
    pub fn toggle_section(&mut self, index: usize) {
        self.navigation = self.navigation.toggle_section(index);
        log::debug!("Expanded section: {:?}", self.navigation.expanded_section());
    }

    /// Mark a page selected and start loading it
    ///
    /// # Returns
    /// * `Some((LoadTicket, String))` - Ticket and file identifier to retrieve
    /// * `None` - No such page in the catalog
    pub fn select_page(&mut self, position: PagePosition) -> Option<(LoadTicket, String)> {
        let file = self.catalog.file(position.section, position.page)?.to_string();
        self.navigation = self.navigation.select_page(position);
        let ticket = self.begin_load(&file);
        Some((ticket, file))
    }

    /// Switch the content panel to loading and issue a new ticket
    pub fn begin_load(&mut self, file: &str) -> LoadTicket {
        self.latest += 1;
        log::debug!("Load #{} started for {}", self.latest, file);
        self.content = ContentPanel::Loading {
            file: file.to_string(),
        };
        LoadTicket(self.latest)
    }

    /// Apply a finished load if its ticket is still the latest
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<LoadedDocument, LoadError>,
    ) -> Applied {
        if ticket.0 != self.latest {
            log::debug!(
                "Dropping stale load #{} (latest is #{})",
                ticket.0,
                self.latest
            );
            return Applied::Stale;
        }

        self.content = match outcome {
            Ok(doc) => ContentPanel::Document(doc),
            Err(e) => {
                log::error!("{}", e);
                let file = match &e {
                    LoadError::Fetch { file, .. } | LoadError::Render { file, .. } => file.clone(),
                };
                ContentPanel::Failed {
                    file,
                    message: e.to_string(),
                }
            }
        };
        Applied::Applied
    }

    /// Select a page and load it from `source` in one step
    pub fn open(&mut self, source: &dyn ContentSource, position: PagePosition) -> Option<Applied> {
        let (ticket, file) = self.select_page(position)?;
        Some(self.complete_load(ticket, load_document(source, &file)))
    }

    /// Open the page holding `file`, expanding its section
    pub fn open_file(&mut self, source: &dyn ContentSource, file: &str) -> Option<Applied> {
        let (section, page) = self.catalog.position_of(file)?;
        if !self.navigation.is_expanded(section) {
            self.toggle_section(section);
        }
        self.open(source, PagePosition { section, page })
    }

    /// Export the displayed document as PDF into `output_dir`
    ///
    /// With nothing loaded a notice is raised and the rasterizer is never
    /// called. Failures are also raised as notices.
    pub fn export(
        &mut self,
        rasterizer: &dyn Rasterizer,
        options: &ExportOptions,
        output_dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let Some(doc) = self.content.document() else {
            let err = ExportError::NothingLoaded;
            log::warn!("{}", err);
            self.notices.push(Notice {
                message: err.to_string(),
            });
            return Err(err);
        };

        let snapshot = ExportSnapshot::from_document(doc);
        let _busy = BusyGuard::raise(&mut self.busy);
        log::info!("Generating PDF for {}", snapshot.file);

        let result = write_pdf(&snapshot, rasterizer, options, output_dir);
        if let Err(e) = &result {
            log::error!("Error generating PDF: {}", e);
            self.notices.push(Notice {
                message: format!("Error generating PDF: {}", e),
            });
        }
        result
    }

    /// Pending notices, oldest first; the queue is emptied
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
