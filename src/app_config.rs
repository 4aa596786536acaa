use anyhow::{anyhow, Context as _};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::{Result, TranslationError};
use crate::language_utils::{get_language_name, validate_language_code, Languages};
use crate::model::{ModelMeta, Registry};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Supported languages, in display order
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageConfig>,

    /// Language stored in the records themselves
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Translation database file; the per-user data directory when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Model declarations
    #[serde(default)]
    pub models: Vec<ModelMeta>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// One supported language
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguageConfig {
    /// ISO 639 code, optionally with a region subtag
    pub code: String,

    /// Display name; looked up from ISO 639 data when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LanguageConfig {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: None,
        }
    }

    pub fn named(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: Some(name.to_string()),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig::new("en"),
        LanguageConfig::new("de"),
        LanguageConfig::new("fr"),
    ]
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Check the language set and the default language
    ///
    /// Model declarations are checked when the registry is built.
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(TranslationError::Config(
                "At least one language must be configured".to_string(),
            ));
        }

        for language in &self.languages {
            validate_language_code(&language.code)?;
        }

        let default = self.default_language.to_lowercase();
        if !self
            .languages
            .iter()
            .any(|l| l.code.to_lowercase() == default)
        {
            return Err(TranslationError::Config(format!(
                "Default language `{}` is not among the configured languages",
                self.default_language
            )));
        }

        Ok(())
    }

    /// Language settings described by the configuration
    pub fn build_languages(&self) -> Result<Languages> {
        let pairs = self
            .languages
            .iter()
            .map(|language| {
                let name = match &language.name {
                    Some(name) => name.clone(),
                    None => get_language_name(&language.code)?,
                };
                Ok((language.code.clone(), name))
            })
            .collect::<Result<Vec<_>>>()?;

        Languages::new(pairs, &self.default_language)
    }

    /// Model registry described by the configuration
    pub fn build_registry(&self) -> Result<Registry> {
        Registry::new(self.models.clone())
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config to JSON: {}", e))?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Load the file, or write and return the default configuration when missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        log::warn!(
            "Config file not found at '{}', creating default config.",
            path.display()
        );
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            default_language: default_language(),
            database_path: None,
            models: Vec::new(),
            log_level: LogLevel::default(),
        }
    }
}
