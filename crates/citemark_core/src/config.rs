/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Engine settings and the project config file that carries them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File names searched by [`Config::load_from_project`], in order.
pub const PROJECT_CONFIG_FILES: [&str; 2] = [".citemark.toml", "citemark.toml"];

/// Shortest and longest identifier lengths accepted.
pub const MIN_HEX_LENGTH: usize = 4;
pub const MAX_HEX_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub citations: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    #[serde(default = "default_hex_length")]
    pub hex_length: usize,

    #[serde(default = "default_section_header")]
    pub footnotes_section_header: String,

    #[serde(default = "default_section_separator")]
    pub footnotes_section_separator: String,

    /// Definition text written for citations that have no known source.
    #[serde(default = "default_missing_text")]
    pub missing_citation_text: String,

    #[serde(default = "default_true")]
    pub protect_indented_code: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            hex_length: default_hex_length(),
            footnotes_section_header: default_section_header(),
            footnotes_section_separator: default_section_separator(),
            missing_citation_text: default_missing_text(),
            protect_indented_code: true,
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("citations.json")
}

fn default_hex_length() -> usize {
    6
}

fn default_section_header() -> String {
    "# Footnotes".to_string()
}

fn default_section_separator() -> String {
    "***".to_string()
}

fn default_missing_text() -> String {
    "Citation text needed.".to_string()
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_HEX_LENGTH..=MAX_HEX_LENGTH).contains(&self.hex_length) {
            return Err(ConfigError::Invalid(format!(
                "hex_length must be between {} and {}, got {}",
                MIN_HEX_LENGTH, MAX_HEX_LENGTH, self.hex_length
            )));
        }
        if self.footnotes_section_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "footnotes_section_header must not be empty".to_string(),
            ));
        }
        if self.footnotes_section_header.contains('\n')
            || self.footnotes_section_separator.contains('\n')
        {
            return Err(ConfigError::Invalid(
                "footnotes section header and separator must be single lines".to_string(),
            ));
        }
        if self.missing_citation_text.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "missing_citation_text must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.citations.validate()?;
        Ok(config)
    }

    /// Load the first project config file found in `dir`, if any.
    ///
    /// A relative `registry_path` is resolved against `dir`.
    pub fn load_from_project(dir: &Path) -> Result<Option<Self>, ConfigError> {
        for name in PROJECT_CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let mut config = Self::load(&path)?;
                if config.citations.registry_path.is_relative() {
                    config.citations.registry_path = dir.join(&config.citations.registry_path);
                }
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.hex_length, 6);
        assert_eq!(config.footnotes_section_header, "# Footnotes");
        assert_eq!(config.footnotes_section_separator, "***");
        assert_eq!(config.registry_path, PathBuf::from("citations.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[citations]\nhex_length = 8\n").unwrap();
        assert_eq!(config.citations.hex_length, 8);
        assert_eq!(config.citations.missing_citation_text, "Citation text needed.");
        assert!(config.citations.protect_indented_code);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_out_of_range_hex_length() {
        let config = EngineConfig {
            hex_length: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig {
            hex_length: 64,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_multiline_header() {
        let config = EngineConfig {
            footnotes_section_header: "# Notes\nmore".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_project_resolves_registry_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".citemark.toml"),
            "[citations]\nregistry_path = \"data/reg.json\"\n",
        )
        .unwrap();

        let config = Config::load_from_project(dir.path()).unwrap().unwrap();
        assert_eq!(config.citations.registry_path, dir.path().join("data/reg.json"));
    }

    #[test]
    fn test_load_from_project_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_project(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citemark.toml");
        let mut config = Config::default();
        config.citations.footnotes_section_header = "## Notes".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
