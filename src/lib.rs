/*!
 * # polyfield - per-row, per-field, per-language translations
 *
 * A Rust library that stores translations of model fields in one generic
 * side table and overlays them onto live instances, without touching the
 * models' own schema.
 *
 * ## Features
 *
 * - Translations keyed by `(model, object_id, field, language)` in SQLite
 * - Contexts that create, read, update, delete and reset translations over
 *   an instance, a collection or a lazy query, including related instances
 * - Rollback of every overlaid value to its original
 * - Lazy queries that translate their results and can filter on translated
 *   text in chosen languages
 * - ISO 639-1 and ISO 639-3 language code support with base-subtag fallback
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `language_utils`: Supported, default and active languages
 * - `model`: Model declarations, the `Registry` and live instances
 * - `database`: The translation store and its SQLite implementation
 * - `translation`: The translation engine:
 *   - `translation::hierarchy`: Relation trees
 *   - `translation::purview`: Instances and rows an operation covers
 *   - `translation::context`: The create/read/update/delete/reset handle
 *   - `translation::query`: Lazily evaluated translatable queries
 * - `source`: Data sources queries are evaluated against
 * - `translation_service`: Service owning registry, languages and store
 * - `forms`: Choice lists for translation editing forms
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod forms;
pub mod language_utils;
pub mod model;
pub mod source;
pub mod translation;
pub mod translation_service;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{Repository, TranslationStore};
pub use errors::{Result, TranslationError};
pub use language_utils::{activate, LanguageFilter, LanguageSelection, Languages};
pub use model::{instance, Entity, Instance, Model, ModelMeta, Registry, Related};
pub use source::{DataSource, MemorySource};
pub use translation::{Context, TranslatableQuery, NO_RELATIONS, Q};
pub use translation_service::TranslationService;
