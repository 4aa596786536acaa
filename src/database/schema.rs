/*!
 * Database schema definitions.
 *
 * This module contains the SQL schema of the translation side table
 * and the version check run when a database is opened.
 */

use anyhow::{anyhow, Context};
use log::{debug, info};
use rusqlite::Connection;

use crate::errors::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing translation schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version != SCHEMA_VERSION {
        return Err(anyhow!(
            "Unsupported translation schema version {} (expected v{})",
            current_version,
            SCHEMA_VERSION
        )
        .into());
    } else {
        debug!("Translation schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // WAL keeps readers going while another process writes; in-memory databases answer "memory"
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    debug!("Journal mode: {}", journal_mode);

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model TEXT NOT NULL,
            object_id TEXT NOT NULL,
            field TEXT NOT NULL,
            language TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(model, object_id, field, language)
        );

        CREATE INDEX IF NOT EXISTS idx_translations_object ON translations(model, object_id);
        CREATE INDEX IF NOT EXISTS idx_translations_language ON translations(language);
        CREATE INDEX IF NOT EXISTS idx_translations_field ON translations(model, field);
        "#,
    )?;

    info!("Translation schema created successfully");
    Ok(())
}
