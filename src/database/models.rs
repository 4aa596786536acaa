/*!
 * Translation store records and query fragments.
 *
 * These structures map directly to the `translations` table and to the
 * scoped queries run against it.
 */

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::language_utils::LanguageFilter;

/// Exact key of a translation row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationKey {
    /// Type tag of the owning record
    pub model: String,
    /// Identity of the owning record
    pub object_id: String,
    /// Translated field
    pub field: String,
    /// Language code
    pub language: String,
}

impl TranslationKey {
    /// Create a key
    pub fn new(model: &str, object_id: &str, field: &str, language: &str) -> Self {
        Self {
            model: model.to_string(),
            object_id: object_id.to_string(),
            field: field.to_string(),
            language: language.to_string(),
        }
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}.{}[{}]",
            self.model, self.object_id, self.field, self.language
        )
    }
}

/// Translation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Type tag of the owning record
    pub model: String,
    /// Identity of the owning record
    pub object_id: String,
    /// Translated field
    pub field: String,
    /// Language code
    pub language: String,
    /// Translated text
    pub text: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl TranslationRecord {
    /// The exact key of the row
    pub fn key(&self) -> TranslationKey {
        TranslationKey::new(&self.model, &self.object_id, &self.field, &self.language)
    }
}

/// Disjunction selecting the translation rows of a group of records
///
/// One clause per model, `(model = M AND object_id IN ids)`, joined with OR.
/// Clauses and ids keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    clauses: IndexMap<String, Vec<String>>,
}

impl Scope {
    /// Empty scope, matching nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the clause of its model; duplicates are ignored
    pub fn add(&mut self, model: &str, object_id: &str) {
        let ids = self.clauses.entry(model.to_string()).or_default();
        if !ids.iter().any(|id| id == object_id) {
            ids.push(object_id.to_string());
        }
    }

    /// Whether the scope matches nothing
    pub fn is_empty(&self) -> bool {
        self.clauses.values().all(Vec::is_empty)
    }

    /// Clauses as `(model, ids)` pairs
    pub fn clauses(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.clauses
            .iter()
            .map(|(model, ids)| (model.as_str(), ids.as_slice()))
    }

    /// Whether the scope covers a record
    pub fn contains(&self, model: &str, object_id: &str) -> bool {
        self.clauses
            .get(model)
            .is_some_and(|ids| ids.iter().any(|id| id == object_id))
    }

    /// Render the disjunction as SQL with positional parameters
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let mut parts = Vec::new();
        let mut params = Vec::new();

        for (model, ids) in self.clauses() {
            if ids.is_empty() {
                continue;
            }
            let placeholders = vec!["?"; ids.len()].join(", ");
            parts.push(format!("(model = ? AND object_id IN ({}))", placeholders));
            params.push(model.to_string());
            params.extend(ids.iter().cloned());
        }

        if parts.is_empty() {
            return ("0".to_string(), params);
        }

        (format!("({})", parts.join(" OR ")), params)
    }
}

impl LanguageFilter {
    /// Render the filter as SQL with positional parameters
    pub fn to_sql(&self) -> (String, Vec<String>) {
        match self {
            Self::One(code) => ("language = ?".to_string(), vec![code.clone()]),
            Self::Many(codes) if codes.is_empty() => ("0".to_string(), Vec::new()),
            Self::Many(codes) => (
                format!("language IN ({})", vec!["?"; codes.len()].join(", ")),
                codes.clone(),
            ),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    /// Number of translation rows
    pub translation_count: i64,
    /// Number of distinct models with translations
    pub model_count: i64,
    /// Row count per language
    pub per_language: Vec<(String, i64)>,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Translations: {}, Models: {}, Size: {} KB",
            self.translation_count,
            self.model_count,
            self.file_size_bytes / 1024
        )?;
        for (language, count) in &self.per_language {
            write!(f, ", {}: {}", language, count)?;
        }
        Ok(())
    }
}
