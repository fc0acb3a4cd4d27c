//! Configuration for a discovery run.
//!
//! Stored in TOML at `~/.config/wsd/config.toml` (or XDG equivalent). A
//! missing file means defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! show_prerelease = false
//! excluded_versions = ["2017"]
//! vswhere_timeout_secs = 5
//! editor_variants = ["Code", "Code - Insiders", "VSCodium", "Cursor"]
//! extra_editor_roots = ["/opt/portable-code/data"]
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::connectors::visual_studio::DEFAULT_VSWHERE_TIMEOUT;
use crate::connectors::vscode::DEFAULT_EDITOR_VARIANTS;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Include containers owned by prerelease IDE instances.
    pub show_prerelease: bool,

    /// Catalog `productLineVersion` values whose instances are skipped.
    pub excluded_versions: HashSet<String>,

    /// Upper bound on the wait for `vswhere`.
    pub vswhere_timeout_secs: u64,

    /// Editor directory names under the platform config directory.
    pub editor_variants: Vec<String>,

    /// Additional editor data roots, e.g. portable installs.
    pub extra_editor_roots: Vec<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            show_prerelease: false,
            excluded_versions: HashSet::new(),
            vswhere_timeout_secs: DEFAULT_VSWHERE_TIMEOUT.as_secs(),
            editor_variants: DEFAULT_EDITOR_VARIANTS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            extra_editor_roots: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Default configuration file path.
    ///
    /// `$XDG_CONFIG_HOME/wsd/config.toml` first, then the platform config dir.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("wsd").join("config.toml"));
        }

        dirs::config_dir()
            .map(|p| p.join("wsd").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vswhere_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "vswhere_timeout_secs must be greater than zero".into(),
            ));
        }

        for variant in &self.editor_variants {
            if variant.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "Editor variant names cannot be empty".into(),
                ));
            }
            if variant.contains('/') || variant.contains('\\') {
                return Err(ConfigError::Validation(format!(
                    "Editor variant '{variant}' cannot contain path separators"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = DiscoveryConfig::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, DiscoveryConfig::default());
        assert_eq!(config.vswhere_timeout_secs, 5);
        assert!(config.editor_variants.iter().any(|v| v == "Code - Insiders"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "show_prerelease = true\nexcluded_versions = [\"2017\", \"2019\"]\n",
        )
        .unwrap();

        let config = DiscoveryConfig::load_from(&path).unwrap();
        assert!(config.show_prerelease);
        assert!(config.excluded_versions.contains("2019"));
        assert_eq!(config.vswhere_timeout_secs, 5);
        assert_eq!(config.editor_variants.len(), DEFAULT_EDITOR_VARIANTS.len());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "vswhere_timeout_secs = 9\ntheme = \"dark\"\n").unwrap();

        let config = DiscoveryConfig::load_from(&path).unwrap();
        assert_eq!(config.vswhere_timeout_secs, 9);
        assert!(!config.show_prerelease);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DiscoveryConfig {
            vswhere_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_variant_with_separator_rejected() {
        let config = DiscoveryConfig {
            editor_variants: vec!["../Code".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DiscoveryConfig {
            editor_variants: vec!["  ".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "show_prerelease = \"maybe").unwrap();
        assert!(matches!(
            DiscoveryConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
