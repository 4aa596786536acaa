/*!
 * Error types for the polyfield library.
 *
 * Every failure the translation engine can report is a variant of
 * `TranslationError`, defined with the thiserror crate. Validation errors
 * (languages, relations, model types) are raised before the translation store
 * is touched; only `DuplicateTranslation` and the transport variants come from
 * the storage layer.
 */

use thiserror::Error;

/// Errors that can occur while resolving or applying translations
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The language code is not in the configured supported set
    #[error("The language code `{0}` is not supported")]
    UnsupportedLanguage(String),

    /// A relation path segment does not exist on the model graph
    #[error("Invalid relation `{segment}` in path `{path}` on model `{model}`")]
    InvalidRelation {
        /// Model the path was resolved against
        model: String,
        /// Full path as given by the caller
        path: String,
        /// First segment that could not be resolved
        segment: String,
    },

    /// A filter path names a field the model does not declare
    #[error("Unknown field `{field}` on model `{model}`")]
    UnknownField {
        /// Model owning the field
        model: String,
        /// Field name as given by the caller
        field: String,
    },

    /// The model is not present in the registry
    #[error("Model `{0}` is not registered")]
    UnknownModel(String),

    /// An entity or related instance cannot be translated
    #[error("Model `{model}` cannot be translated: {reason}")]
    TypeMismatch {
        /// Offending model
        model: String,
        /// What went wrong
        reason: String,
    },

    /// A translation row already exists for the exact key
    #[error("A translation already exists for {model}#{object_id}.{field} in `{language}`")]
    DuplicateTranslation {
        /// Model of the owning record
        model: String,
        /// Identity of the owning record
        object_id: String,
        /// Translated field
        field: String,
        /// Language of the row
        language: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reported by SQLite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Any other error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, TranslationError>;

impl TranslationError {
    /// Shorthand for a type mismatch error
    pub(crate) fn type_mismatch(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// True for failures detected before the store is touched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_)
                | Self::InvalidRelation { .. }
                | Self::UnknownField { .. }
                | Self::UnknownModel(_)
                | Self::TypeMismatch { .. }
        )
    }
}
