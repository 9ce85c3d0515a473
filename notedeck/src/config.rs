//! Site configuration from notedeck.toml

use crate::catalog::{Catalog, Section};
use crate::export::ExportOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "notedeck.toml";

/// Site title used when none is configured
pub const DEFAULT_TITLE: &str = "Study Notes";

/// Configuration loaded from notedeck.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotedeckConfig {
    /// Title shown in the navigation panel and page titles
    #[serde(default = "default_title")]
    pub title: String,

    /// Directory holding the markdown files, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,

    /// Catalog sections in display order; empty means the built-in catalog
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Fixed page settings for PDF export
    #[serde(default)]
    pub export: ExportOptions,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Default for NotedeckConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            content_dir: None,
            sections: Vec::new(),
            export: ExportOptions::default(),
        }
    }
}

impl NotedeckConfig {
    /// Load configuration from a notedeck.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the notedeck.toml configuration file
    ///
    /// # Returns
    /// * `Ok(NotedeckConfig)` - Successfully loaded and validated configuration
    /// * `Err(ConfigError)` - Error reading, parsing or validating the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config: NotedeckConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a notedeck.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the notedeck.toml file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Locate and load the configuration
    ///
    /// An explicit path must exist. Without one, `notedeck.toml` in `cwd` is
    /// used when present, and built-in defaults otherwise.
    ///
    /// # Returns
    /// * `Ok((NotedeckConfig, PathBuf))` - Configuration and its content root
    /// * `Err(ConfigError)` - The selected file could not be loaded
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, PathBuf), ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = cwd.join(CONFIG_FILE);
                if !candidate.is_file() {
                    log::info!("No {} found, using the built-in catalog", CONFIG_FILE);
                    return Ok((Self::default(), cwd.to_path_buf()));
                }
                candidate
            }
        };

        log::info!("Loading configuration from {}", path.display());
        let config = Self::load(&path)?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => cwd.to_path_buf(),
        };
        let root = config.content_root(&base);
        Ok((config, root))
    }

    /// Content directory resolved against `base`
    pub fn content_root(&self, base: &Path) -> PathBuf {
        match &self.content_dir {
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        }
    }

    /// The configured catalog, or the built-in one when no sections are set
    pub fn catalog(&self) -> Catalog {
        if self.sections.is_empty() {
            Catalog::builtin()
        } else {
            Catalog::new(self.sections.clone())
        }
    }

    /// Reject unusable catalogs and warn about duplicate entries
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(index) = self
            .sections
            .iter()
            .position(|section| section.name.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "section {} has an empty name",
                index + 1
            )));
        }

        let catalog = Catalog::new(self.sections.clone());
        for file in catalog.duplicate_files() {
            log::warn!("{} is listed more than once in the catalog", file);
        }

        let quality = self.export.image_quality;
        if !(0.0..=1.0).contains(&quality) {
            return Err(ConfigError::Invalid(format!(
                "export.image_quality must be between 0 and 1, got {}",
                quality
            )));
        }

        Ok(())
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Orientation;

    #[test]
    fn test_parse_example_toml() {
        let toml_content = r#"
title = "Interview Prep"
content_dir = "notes"

[[sections]]
name = "Python"
files = ["1.0 Python.md", "2 Python.md"]

[[sections]]
name = "Internet & Web"
files = ["1.0 Int & web.md"]

[export]
margins_mm = [12, 10, 12, 10]
orientation = "landscape"
"#;

        let config: NotedeckConfig = toml::from_str(toml_content).unwrap();
        config.validate().unwrap();

        assert_eq!(config.title, "Interview Prep");
        assert_eq!(config.content_root(Path::new("/srv")), Path::new("/srv/notes"));
        assert_eq!(config.catalog().len(), 2);
        assert_eq!(config.catalog().file(1, 0), Some("1.0 Int & web.md"));
        assert_eq!(config.export.margins_mm, [12.0, 10.0, 12.0, 10.0]);
        assert_eq!(config.export.orientation, Orientation::Landscape);
        assert_eq!(config.export.paper, "a4");
        assert_eq!(config.export.image_quality, 0.98);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: NotedeckConfig = toml::from_str("").unwrap();
        assert_eq!(config, NotedeckConfig::default());
        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.catalog(), Catalog::builtin());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = NotedeckConfig {
            title: "Notes".to_string(),
            content_dir: Some(PathBuf::from("md")),
            sections: vec![Section::new("Linux", &["1.0 linux.md"])],
            export: ExportOptions::default(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: NotedeckConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_section_name_rejected() {
        let config = NotedeckConfig {
            sections: vec![Section::new(" ", &["a.md"])],
            ..NotedeckConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: section 1 has an empty name"
        );
    }

    #[test]
    fn test_duplicate_files_are_allowed() {
        let config = NotedeckConfig {
            sections: vec![
                Section::new("A", &["1 x.md"]),
                Section::new("B", &["1 x.md"]),
            ],
            ..NotedeckConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_without_file_uses_builtin() {
        let dir = std::env::temp_dir().join(format!("notedeck-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let (config, root) = NotedeckConfig::resolve(None, &dir).unwrap();
        assert_eq!(config.catalog(), Catalog::builtin());
        assert_eq!(root, dir);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_resolve_explicit_missing_file_fails() {
        let missing = std::env::temp_dir().join("notedeck-no-such-dir/notedeck.toml");
        assert!(matches!(
            NotedeckConfig::resolve(Some(&missing), Path::new(".")),
            Err(ConfigError::IoError(_))
        ));
    }
}
