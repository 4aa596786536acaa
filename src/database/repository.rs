/*!
 * Repository layer for the translation side table.
 *
 * This module implements `TranslationStore` on top of SQLite, turning
 * scopes and language filters into parameterized SQL, plus the maintenance
 * queries (obsolete rows, statistics) consumed by the CLI.
 */

use log::{debug, info};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{DatabaseStats, Scope, TranslationKey, TranslationRecord};
use super::store::TranslationStore;
use crate::errors::{Result, TranslationError};
use crate::language_utils::LanguageFilter;
use crate::model::Registry;

const SELECT_COLUMNS: &str =
    "SELECT model, object_id, field, language, text, created_at, updated_at FROM translations";

/// Repository for translation rows
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// The underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn parse_row(row: &rusqlite::Row) -> rusqlite::Result<TranslationRecord> {
        Ok(TranslationRecord {
            model: row.get(0)?,
            object_id: row.get(1)?,
            field: row.get(2)?,
            language: row.get(3)?,
            text: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Map a unique-constraint failure on `key` to a duplicate translation error
    fn map_write_error(error: rusqlite::Error, key: &TranslationKey) -> TranslationError {
        match &error {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                TranslationError::DuplicateTranslation {
                    model: key.model.clone(),
                    object_id: key.object_id.clone(),
                    field: key.field.clone(),
                    language: key.language.clone(),
                }
            }
            _ => TranslationError::Database(error),
        }
    }

    fn query_records(
        conn: &Connection,
        sql: &str,
        params: Vec<String>,
    ) -> Result<Vec<TranslationRecord>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), Self::parse_row)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn insert_sync(conn: &Connection, key: &TranslationKey, text: &str, now: &str) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO translations (model, object_id, field, language, text, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![key.model, key.object_id, key.field, key.language, text, now],
        )
        .map_err(|e| Self::map_write_error(e, key))?;
        Ok(())
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Insert a new row, failing if the key already exists
    pub fn insert(&self, key: &TranslationKey, text: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.db.execute(|conn| Self::insert_sync(conn, key, text, &now))
    }

    /// Get the row for an exact key
    pub fn get(&self, key: &TranslationKey) -> Result<Option<TranslationRecord>> {
        self.db.execute(|conn| {
            let record = conn
                .query_row(
                    &format!(
                        "{} WHERE model = ?1 AND object_id = ?2 AND field = ?3 AND language = ?4",
                        SELECT_COLUMNS
                    ),
                    params![key.model, key.object_id, key.field, key.language],
                    Self::parse_row,
                )
                .optional()?;
            Ok(record)
        })
    }

    /// Total number of rows
    pub fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?)
        })
    }

    // =========================================================================
    // Maintenance Operations
    // =========================================================================

    /// `(model, field)` pairs stored in the table but no longer translatable
    fn obsolete_pairs(conn: &Connection, registry: &Registry) -> Result<Vec<(String, String)>> {
        let mut stmt =
            conn.prepare("SELECT DISTINCT model, field FROM translations ORDER BY model, field")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pairs
            .into_iter()
            .filter(|(model, field)| match registry.translatable_fields(model) {
                Ok(fields) => !fields.iter().any(|f| f == field),
                Err(_) => true,
            })
            .collect())
    }

    fn obsolete_with(conn: &Connection, registry: &Registry) -> Result<Vec<TranslationRecord>> {
        let mut records = Vec::new();
        for (model, field) in Self::obsolete_pairs(conn, registry)? {
            records.extend(Self::query_records(
                conn,
                &format!("{} WHERE model = ? AND field = ? ORDER BY id", SELECT_COLUMNS),
                vec![model, field],
            )?);
        }
        Ok(records)
    }

    /// Rows whose `(model, field)` is no longer declared translatable
    pub fn obsolete(&self, registry: &Registry) -> Result<Vec<TranslationRecord>> {
        self.db.execute(|conn| Self::obsolete_with(conn, registry))
    }

    /// Obsolete rows, queried on the blocking pool
    pub async fn obsolete_async(&self, registry: Registry) -> Result<Vec<TranslationRecord>> {
        self.db
            .execute_async(move |conn| Self::obsolete_with(conn, &registry))
            .await
    }

    fn delete_obsolete_with(tx: &rusqlite::Transaction, registry: &Registry) -> Result<usize> {
        let mut deleted = 0;
        for (model, field) in Self::obsolete_pairs(tx, registry)? {
            deleted += tx.execute(
                "DELETE FROM translations WHERE model = ?1 AND field = ?2",
                params![model, field],
            )?;
        }
        info!("Deleted {} obsolete translations", deleted);
        Ok(deleted)
    }

    /// Delete the obsolete rows, returning how many went
    pub fn delete_obsolete(&self, registry: &Registry) -> Result<usize> {
        self.db.transaction(|tx| Self::delete_obsolete_with(tx, registry))
    }

    /// Delete the obsolete rows in one transaction on the blocking pool
    pub async fn delete_obsolete_async(&self, registry: Registry) -> Result<usize> {
        self.db
            .transaction_async(move |tx| Self::delete_obsolete_with(tx, &registry))
            .await
    }

    fn stats_with(conn: &Connection, file_size_bytes: u64) -> Result<DatabaseStats> {
        let translation_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        let model_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT model) FROM translations",
            [],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT language, COUNT(*) FROM translations GROUP BY language ORDER BY language",
        )?;
        let per_language = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;

        Ok(DatabaseStats {
            translation_count,
            model_count,
            per_language,
            file_size_bytes,
        })
    }

    fn file_size(&self) -> u64 {
        if self.db.is_in_memory() {
            return 0;
        }
        std::fs::metadata(self.db.path())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        let file_size_bytes = self.file_size();
        self.db.execute(|conn| Self::stats_with(conn, file_size_bytes))
    }

    /// Statistics, queried on the blocking pool
    pub async fn stats_async(&self) -> Result<DatabaseStats> {
        let file_size_bytes = self.file_size();
        self.db
            .execute_async(move |conn| Self::stats_with(conn, file_size_bytes))
            .await
    }
}

impl TranslationStore for Repository {
    fn fetch(&self, scope: &Scope, languages: &LanguageFilter) -> Result<Vec<TranslationRecord>> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let (scope_sql, mut params) = scope.to_sql();
        let (language_sql, language_params) = languages.to_sql();
        params.extend(language_params);

        let sql = format!(
            "{} WHERE {} AND {} ORDER BY id",
            SELECT_COLUMNS, scope_sql, language_sql
        );

        let records = self.db.execute(|conn| Self::query_records(conn, &sql, params))?;
        debug!("Fetched {} translations for {:?}", records.len(), languages);
        Ok(records)
    }

    fn fetch_all_languages(&self, scope: &Scope) -> Result<Vec<TranslationRecord>> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let (scope_sql, params) = scope.to_sql();
        let sql = format!("{} WHERE {} ORDER BY id", SELECT_COLUMNS, scope_sql);

        self.db.execute(|conn| Self::query_records(conn, &sql, params))
    }

    fn upsert(&self, key: &TranslationKey, text: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        self.db.execute(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM translations WHERE model = ?1 AND object_id = ?2 AND field = ?3 AND language = ?4",
                    params![key.model, key.object_id, key.field, key.language],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(id) => {
                    conn.execute(
                        "UPDATE translations SET text = ?1, updated_at = ?2 WHERE id = ?3",
                        params![text, now, id],
                    )?;
                }
                None => Self::insert_sync(conn, key, text, &now)?,
            }
            Ok(())
        })
    }

    fn delete_object(&self, model: &str, object_id: &str) -> Result<usize> {
        self.db.execute(|conn| {
            let deleted = conn.execute(
                "DELETE FROM translations WHERE model = ?1 AND object_id = ?2",
                params![model, object_id],
            )?;
            debug!("Deleted {} translations of {}#{}", deleted, model, object_id);
            Ok(deleted)
        })
    }

    fn delete(&self, scope: &Scope, languages: &LanguageFilter) -> Result<usize> {
        if scope.is_empty() {
            return Ok(0);
        }

        let (scope_sql, mut params) = scope.to_sql();
        let (language_sql, language_params) = languages.to_sql();
        params.extend(language_params);

        let sql = format!("DELETE FROM translations WHERE {} AND {}", scope_sql, language_sql);

        let deleted = self
            .db
            .execute(|conn| Ok(conn.execute(&sql, params_from_iter(params.iter()))?))?;
        debug!("Deleted {} translations for {:?}", deleted, languages);
        Ok(deleted)
    }
}
