//! Navigation panel state
//!
//! Two pieces of transient state: which section is expanded (at most one,
//! accordion style) and which page is selected (at most one across the whole
//! catalog). Transitions are pure: they take the current state and return the
//! next one.

use crate::catalog::Catalog;
use crate::render::Element;
use crate::title::page_title;

/// Position of a page inside the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PagePosition {
    pub section: usize,
    pub page: usize,
}

/// Expand/collapse and selection state of the navigation panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    expanded: Vec<bool>,
    selected: Option<PagePosition>,
}

impl NavigationState {
    /// All sections collapsed, nothing selected
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            expanded: vec![false; catalog.len()],
            selected: None,
        }
    }

    /// Toggle one section and collapse every other section
    ///
    /// Unknown section indices collapse everything.
    pub fn toggle_section(&self, index: usize) -> Self {
        let expanded = self
            .expanded
            .iter()
            .enumerate()
            .map(|(i, &open)| i == index && !open)
            .collect();
        Self {
            expanded,
            selected: self.selected,
        }
    }

    /// Select one page, clearing any previous selection
    pub fn select_page(&self, position: PagePosition) -> Self {
        Self {
            expanded: self.expanded.clone(),
            selected: Some(position),
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    /// The expanded section, if any
    pub fn expanded_section(&self) -> Option<usize> {
        self.expanded.iter().position(|&open| open)
    }

    pub fn selected(&self) -> Option<PagePosition> {
        self.selected
    }

    pub fn is_selected(&self, position: PagePosition) -> bool {
        self.selected == Some(position)
    }

    /// Snapshot of the panel for display
    pub fn view(&self, catalog: &Catalog) -> NavigationTree {
        let sections = catalog
            .sections()
            .iter()
            .enumerate()
            .map(|(section_index, section)| SectionView {
                index: section_index,
                name: section.name.clone(),
                expanded: self.is_expanded(section_index),
                pages: section
                    .files
                    .iter()
                    .enumerate()
                    .map(|(page_index, file)| {
                        let position = PagePosition {
                            section: section_index,
                            page: page_index,
                        };
                        PageView {
                            position,
                            file: file.clone(),
                            label: page_title(file),
                            selected: self.is_selected(position),
                        }
                    })
                    .collect(),
            })
            .collect();

        NavigationTree { sections }
    }
}

/// Display model of the navigation panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTree {
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub index: usize,
    pub name: String,
    pub expanded: bool,
    pub pages: Vec<PageView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub position: PagePosition,
    pub file: String,
    pub label: String,
    pub selected: bool,
}

impl NavigationTree {
    /// Build the panel markup; `href` maps a file identifier to its link target
    pub fn to_element<F: Fn(&str) -> String>(&self, href: F) -> Element {
        let mut list = Element::new("ul").with_attr("id", "toc-list");

        for section in &self.sections {
            let title = Element::new("span")
                .with_attr("class", "section-title")
                .with_attr("data-section", section.index.to_string())
                .with_text(section.name.clone());

            let mut pages = Element::new("ul").with_attr("class", "section-pages");
            if section.expanded {
                pages.add_class("active");
            }

            for page in &section.pages {
                let mut link = Element::new("a")
                    .with_attr("class", "page-link")
                    .with_attr("href", href(&page.file))
                    .with_attr("data-file", page.file.clone())
                    .with_attr("data-section", section.index.to_string())
                    .with_attr("data-page", page.position.page.to_string())
                    .with_text(page.label.clone());
                if page.selected {
                    link.add_class("active");
                }
                pages = pages.with_child(Element::new("li").with_child(link));
            }

            list = list.with_child(Element::new("li").with_child(title).with_child(pages));
        }

        list
    }

    /// Plain-text rendering for terminals
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        for section in &self.sections {
            let marker = if section.expanded { "[-]" } else { "[+]" };
            output.push_str(&format!("{} {}. {}\n", marker, section.index + 1, section.name));
            if !section.expanded {
                continue;
            }
            for page in &section.pages {
                let pointer = if page.selected { ">" } else { " " };
                output.push_str(&format!(
                    "   {} {}. {}\n",
                    pointer,
                    page.position.page + 1,
                    page.label
                ));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Section;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Section::new("Python", &["1.0 Python.md", "2 Python.md"]),
            Section::new("Java", &["1.0 Java.md"]),
            Section::new("Empty", &[]),
        ])
    }

    fn at(section: usize, page: usize) -> PagePosition {
        PagePosition { section, page }
    }

    #[test]
    fn test_initially_collapsed() {
        let state = NavigationState::new(&catalog());
        assert_eq!(state.expanded_section(), None);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_expanding_one_section_collapses_others() {
        let state = NavigationState::new(&catalog()).toggle_section(0);
        assert!(state.is_expanded(0));

        let state = state.toggle_section(1);
        assert!(!state.is_expanded(0));
        assert!(state.is_expanded(1));
        assert_eq!(state.expanded_section(), Some(1));
    }

    #[test]
    fn test_toggle_same_section_collapses_it() {
        let state = NavigationState::new(&catalog())
            .toggle_section(1)
            .toggle_section(1);
        assert_eq!(state.expanded_section(), None);
    }

    #[test]
    fn test_toggle_is_pure() {
        let before = NavigationState::new(&catalog());
        let after = before.toggle_section(0);
        assert_eq!(before.expanded_section(), None);
        assert_eq!(after.expanded_section(), Some(0));
    }

    #[test]
    fn test_toggle_unknown_section_collapses_all() {
        let state = NavigationState::new(&catalog())
            .toggle_section(0)
            .toggle_section(42);
        assert_eq!(state.expanded_section(), None);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let state = NavigationState::new(&catalog()).select_page(at(0, 0));
        assert!(state.is_selected(at(0, 0)));

        let state = state.select_page(at(1, 0));
        assert!(!state.is_selected(at(0, 0)));
        assert!(state.is_selected(at(1, 0)));

        let view = state.view(&catalog());
        let selected: Vec<&str> = view
            .sections
            .iter()
            .flat_map(|s| s.pages.iter())
            .filter(|p| p.selected)
            .map(|p| p.file.as_str())
            .collect();
        assert_eq!(selected, vec!["1.0 Java.md"]);
    }

    #[test]
    fn test_view_labels_follow_catalog_order() {
        let view = NavigationState::new(&catalog()).view(&catalog());
        let labels: Vec<&str> = view.sections[0]
            .pages
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Python - Part 1.0", "Python - Part 2"]);
        assert!(view.sections[2].pages.is_empty());
    }

    #[test]
    fn test_empty_catalog_gives_empty_tree() {
        let catalog = Catalog::default();
        let state = NavigationState::new(&catalog).toggle_section(0);
        let view = state.view(&catalog);
        assert!(view.sections.is_empty());
        assert_eq!(view.to_element(|f| f.to_string()).to_html(), "<ul id=\"toc-list\"></ul>");
    }

    #[test]
    fn test_to_element_marks_active_state() {
        let state = NavigationState::new(&catalog())
            .toggle_section(0)
            .select_page(at(0, 1));
        let html = state
            .view(&catalog())
            .to_element(|f| format!("{}.html", f))
            .to_html();
        assert!(html.contains("<ul class=\"section-pages active\">"));
        assert!(html.contains(
            "<a class=\"page-link active\" href=\"2 Python.md.html\" data-file=\"2 Python.md\" data-section=\"0\" data-page=\"1\">Python - Part 2</a>"
        ));
    }

    #[test]
    fn test_to_text() {
        let state = NavigationState::new(&catalog())
            .toggle_section(0)
            .select_page(at(0, 0));
        let text = state.view(&catalog()).to_text();
        assert_eq!(
            text,
            "[-] 1. Python\n   > 1. Python - Part 1.0\n     2. Python - Part 2\n[+] 2. Java\n[+] 3. Empty\n"
        );
    }
}
