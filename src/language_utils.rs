/*!
 * Language utilities for the translation engine.
 *
 * This module resolves arbitrary language tags against the configured
 * supported set, and exposes the default and request-scoped active language.
 */

use isolang::Language;
use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::errors::{Result, TranslationError};

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-3 (3-letter) code
    Part3,
}

/// Validate the base subtag of a language tag as an ISO 639-1 or ISO 639-3 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized = normalize_tag(code);
    let base = base_subtag(&normalized);

    if base.len() == 2 && Language::from_639_1(base).is_some() {
        return Ok(LanguageCodeType::Part1);
    }
    if base.len() == 3 && Language::from_639_3(base).is_some() {
        return Ok(LanguageCodeType::Part3);
    }

    Err(TranslationError::Config(format!("Invalid language code: {}", code)))
}

/// Get the English language name for a tag, based on its base subtag
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_tag(code);
    let base = base_subtag(&normalized);

    let lang = match base.len() {
        2 => Language::from_639_1(base),
        3 => Language::from_639_3(base),
        _ => None,
    }
    .ok_or_else(|| TranslationError::Config(format!("Failed to get language from code: {}", code)))?;

    Ok(lang.to_name().to_string())
}

/// Lower-case a tag and use `-` as the subtag separator
fn normalize_tag(code: &str) -> String {
    code.trim().to_lowercase().replace('_', "-")
}

/// The part of a tag before the first `-`
fn base_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// A supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Canonical code, e.g. `en` or `pt-br`
    pub code: String,
    /// Display name
    pub name: String,
}

/// Languages requested by a caller, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelection {
    /// The request-scoped active language
    Active,
    /// A single language tag
    One(String),
    /// Several language tags
    Many(Vec<String>),
}

impl From<&str> for LanguageSelection {
    fn from(code: &str) -> Self {
        Self::One(code.to_string())
    }
}

impl From<String> for LanguageSelection {
    fn from(code: String) -> Self {
        Self::One(code)
    }
}

impl From<Option<&str>> for LanguageSelection {
    fn from(code: Option<&str>) -> Self {
        code.map_or(Self::Active, Self::from)
    }
}

impl From<Vec<&str>> for LanguageSelection {
    fn from(codes: Vec<&str>) -> Self {
        Self::Many(codes.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for LanguageSelection {
    fn from(codes: Vec<String>) -> Self {
        Self::Many(codes)
    }
}

impl<const N: usize> From<[&str; N]> for LanguageSelection {
    fn from(codes: [&str; N]) -> Self {
        Self::Many(codes.iter().map(|c| c.to_string()).collect())
    }
}

/// Resolved languages, as used to scope translation rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageFilter {
    /// Equality on a single code
    One(String),
    /// Membership in a set of codes
    Many(Vec<String>),
}

impl LanguageFilter {
    /// All codes of the filter, in order
    pub fn codes(&self) -> Vec<&str> {
        match self {
            Self::One(code) => vec![code.as_str()],
            Self::Many(codes) => codes.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the filter accepts the code
    pub fn contains(&self, code: &str) -> bool {
        match self {
            Self::One(c) => c == code,
            Self::Many(codes) => codes.iter().any(|c| c == code),
        }
    }
}

thread_local! {
    static ACTIVE_LANGUAGE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Restores the previously active language when dropped
#[must_use = "the language is deactivated as soon as the guard is dropped"]
pub struct ActiveLanguageGuard {
    previous: Option<String>,
}

impl Drop for ActiveLanguageGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE_LANGUAGE.with(|active| *active.borrow_mut() = previous);
    }
}

/// Make `code` the active language of the current thread
///
/// Meant for the locale negotiation layer sitting in front of the engine. The
/// tag is stored as given and resolved when it is read.
pub fn activate(code: &str) -> ActiveLanguageGuard {
    let previous = ACTIVE_LANGUAGE.with(|active| active.replace(Some(code.to_string())));
    ActiveLanguageGuard { previous }
}

/// The raw active language tag of the current thread, if any
pub fn active_language_tag() -> Option<String> {
    ACTIVE_LANGUAGE.with(|active| active.borrow().clone())
}

static GLOBAL_LANGUAGES: OnceCell<Languages> = OnceCell::new();

/// The configured set of supported languages and the default language
#[derive(Debug, Clone)]
pub struct Languages {
    supported: Vec<LanguageInfo>,
    default: String,
}

impl Languages {
    /// Build the language settings from `(code, name)` pairs and a default code
    pub fn new<I, C, N>(supported: I, default: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (C, N)>,
        C: AsRef<str>,
        N: Into<String>,
    {
        let mut languages: Vec<LanguageInfo> = Vec::new();
        for (code, name) in supported {
            let code = normalize_tag(code.as_ref());
            if code.is_empty() {
                return Err(TranslationError::Config("Empty language code".to_string()));
            }
            if languages.iter().any(|l| l.code == code) {
                return Err(TranslationError::Config(format!(
                    "Language `{}` is configured twice",
                    code
                )));
            }
            languages.push(LanguageInfo {
                code,
                name: name.into(),
            });
        }

        if languages.is_empty() {
            return Err(TranslationError::Config(
                "At least one language must be configured".to_string(),
            ));
        }

        let default = normalize_tag(default);
        if !languages.iter().any(|l| l.code == default) {
            return Err(TranslationError::Config(format!(
                "Default language `{}` is not among the supported languages",
                default
            )));
        }

        Ok(Self {
            supported: languages,
            default,
        })
    }

    /// Build the language settings from bare codes, naming them from ISO 639 data
    pub fn from_codes(codes: &[&str], default: &str) -> Result<Self> {
        let pairs = codes
            .iter()
            .map(|code| Ok((code.to_string(), get_language_name(code)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(pairs, default)
    }

    /// Install these settings as the process-wide ones
    ///
    /// Settings can be installed once; later calls fail.
    pub fn install(self) -> Result<&'static Languages> {
        GLOBAL_LANGUAGES
            .set(self)
            .map_err(|_| TranslationError::Config("Languages are already installed".to_string()))?;
        GLOBAL_LANGUAGES
            .get()
            .ok_or_else(|| TranslationError::Config("Languages are not installed".to_string()))
    }

    /// The process-wide settings, if installed
    pub fn global() -> Option<&'static Languages> {
        GLOBAL_LANGUAGES.get()
    }

    /// All supported languages, in configuration order
    pub fn supported(&self) -> &[LanguageInfo] {
        &self.supported
    }

    /// Whether the exact code is supported
    pub fn is_supported(&self, code: &str) -> bool {
        let code = normalize_tag(code);
        self.supported.iter().any(|l| l.code == code)
    }

    /// The default language code
    pub fn default_language(&self) -> &str {
        &self.default
    }

    /// Supported languages other than the default one
    pub fn translation_languages(&self) -> Vec<&LanguageInfo> {
        self.supported
            .iter()
            .filter(|l| l.code != self.default)
            .collect()
    }

    /// Display name of a supported code
    pub fn display_name(&self, code: &str) -> Option<&str> {
        let code = normalize_tag(code);
        self.supported
            .iter()
            .find(|l| l.code == code)
            .map(|l| l.name.as_str())
    }

    /// Resolve a tag to a supported code
    ///
    /// The exact code wins; otherwise its base subtag (`de` for `de-at`) is tried.
    pub fn resolve(&self, code: &str) -> Result<String> {
        let normalized = normalize_tag(code);

        if self.supported.iter().any(|l| l.code == normalized) {
            return Ok(normalized);
        }

        let base = base_subtag(&normalized);
        if self.supported.iter().any(|l| l.code == base) {
            debug!("Resolved language `{}` to `{}`", code, base);
            return Ok(base.to_string());
        }

        Err(TranslationError::UnsupportedLanguage(code.to_string()))
    }

    /// The active language, resolved; the default when none is active
    pub fn active_language(&self) -> Result<String> {
        match active_language_tag() {
            Some(tag) => self.resolve(&tag),
            None => Ok(self.default.clone()),
        }
    }

    /// Resolve an optional tag; `None` means the active language
    pub fn resolve_or_active(&self, code: Option<&str>) -> Result<String> {
        match code {
            Some(code) => self.resolve(code),
            None => self.active_language(),
        }
    }

    /// Resolve a selection of languages
    pub fn resolve_many(&self, selection: impl Into<LanguageSelection>) -> Result<LanguageFilter> {
        match selection.into() {
            LanguageSelection::Active => Ok(LanguageFilter::One(self.active_language()?)),
            LanguageSelection::One(code) => Ok(LanguageFilter::One(self.resolve(&code)?)),
            LanguageSelection::Many(codes) => {
                let mut resolved: Vec<String> = Vec::with_capacity(codes.len());
                for code in &codes {
                    let code = self.resolve(code)?;
                    if !resolved.contains(&code) {
                        resolved.push(code);
                    }
                }
                Ok(LanguageFilter::Many(resolved))
            }
        }
    }
}
