//! End-to-end browsing against the fixture notes directory

use notedeck::browser::{Applied, BrowserState, ContentPanel};
use notedeck::check::{check_catalog, Issue};
use notedeck::config::NotedeckConfig;
use notedeck::loader::{load_document, DirectorySource};
use notedeck::navigation::PagePosition;
use notedeck::outline::OutlineLevel;
use std::path::{Path, PathBuf};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/notes")
}

fn fixture_state() -> (BrowserState, DirectorySource) {
    let config_path = fixture_dir().join("notedeck.toml");
    let (config, root) = NotedeckConfig::resolve(Some(&config_path), Path::new(".")).unwrap();
    assert_eq!(config.title, "Fixture Notes");
    (BrowserState::new(config.catalog()), DirectorySource::new(root))
}

#[test]
fn test_fixture_notes_exist() {
    let dir = fixture_dir();
    for file in ["notedeck.toml", "1.0 C#.md", "1.0 Int & web.md", "3.md"] {
        assert!(dir.join(file).exists(), "fixture {} should exist", file);
    }
    assert!(
        !dir.join("2 C#.md").exists(),
        "2 C#.md must stay missing for the not-found tests"
    );
}

#[test]
fn test_navigation_labels_from_config() {
    let (state, _) = fixture_state();
    let view = state.navigation_view();

    let labels: Vec<&str> = view
        .sections
        .iter()
        .flat_map(|s| s.pages.iter().map(|p| p.label.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec!["C# - Part 1.0", "C# - Part 2", "Int & web - Part 1.0", "Part 3"]
    );
}

#[test]
fn test_open_page_with_special_characters() {
    let (mut state, source) = fixture_state();
    state.toggle_section(0);
    let applied = state.open(&source, PagePosition { section: 0, page: 0 });
    assert_eq!(applied, Some(Applied::Applied));

    let doc = state.content().document().unwrap();
    let ids: Vec<&str> = doc.outline.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["value-types", "nullable", "generics", "generics-1"]);
    assert_eq!(doc.outline[1].level, OutlineLevel::H3);

    let html = doc.tree.to_html();
    assert!(html.contains("<h1 id=\"c-basics\">C# Basics</h1>"));
    assert!(html.contains("<h2 id=\"value-types\">Value Types</h2>"));
    assert!(!html.contains("{#"));
    assert!(!html.contains('🚀'));
    assert!(html.contains("language-csharp"));
}

#[test]
fn test_missing_file_shows_error_with_reason() {
    let (mut state, source) = fixture_state();
    state.open(&source, PagePosition { section: 0, page: 1 });

    assert!(!state.content().is_loading());
    match state.content() {
        ContentPanel::Failed { file, message } => {
            assert_eq!(file, "2 C#.md");
            assert_eq!(message, "Failed to load 2 C#.md: 404 Not Found");
        }
        other => panic!("expected an error panel, got {:?}", other),
    }
    assert!(state
        .content()
        .to_element()
        .to_html()
        .contains("Error loading content: Failed to load 2 C#.md: 404 Not Found"));
}

#[test]
fn test_later_load_wins_over_slower_earlier_load() {
    let (mut state, source) = fixture_state();

    let (first, first_file) = state
        .select_page(PagePosition { section: 1, page: 0 })
        .unwrap();
    let (second, second_file) = state
        .select_page(PagePosition { section: 2, page: 0 })
        .unwrap();

    let second_result = load_document(&source, &second_file);
    let first_result = load_document(&source, &first_file);

    assert_eq!(state.complete_load(second, second_result), Applied::Applied);
    assert_eq!(state.complete_load(first, first_result), Applied::Stale);

    let doc = state.content().document().unwrap();
    assert_eq!(doc.file, "3.md");
    assert!(doc.outline.is_empty());
    assert!(doc.tree.to_html().contains("id=\"load-balancing-\""));
    assert!(state
        .navigation()
        .is_selected(PagePosition { section: 2, page: 0 }));
}

#[test]
fn test_reloading_never_duplicates_outline() {
    let (mut state, source) = fixture_state();
    let position = PagePosition { section: 1, page: 0 };

    state.open(&source, position);
    let first = state.content().document().unwrap().tree.clone();
    state.open(&source, position);
    let second = state.content().document().unwrap().tree.clone();

    assert_eq!(first, second);
    assert_eq!(second.to_html().matches("page-toc").count(), 1);
}

#[test]
fn test_check_reports_fixture_problems() {
    let (state, source) = fixture_state();
    let issues = check_catalog(state.catalog(), &source, &[]);

    assert_eq!(
        issues,
        vec![
            Issue::Unreadable {
                file: "2 C#.md".to_string(),
                reason: "404 Not Found".to_string(),
            },
            Issue::BrokenAnchor {
                file: "1.0 Int & web.md".to_string(),
                target: "caching".to_string(),
                text: "caching".to_string(),
            },
        ]
    );
}
