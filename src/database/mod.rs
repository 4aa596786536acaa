/*!
 * Database module for persistent storage of translations.
 *
 * This module provides:
 * - The `TranslationStore` trait the engine is written against
 * - A SQLite-backed implementation (`Repository`) of the side table
 * - Scope and record types shared by every store
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;
pub mod store;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{DatabaseStats, Scope, TranslationKey, TranslationRecord};
pub use repository::Repository;
pub use store::TranslationStore;
