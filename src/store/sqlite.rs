use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{PublicationFields, PublicationRow, PublicationStore, StoreError, StoreTransaction};

/// SQLite-backed publication store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let store = Self {
            conn: Mutex::new(conn),
            path: path_str,
        };
        store.init()?;
        Ok(store)
    }

    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: ":memory:".to_string(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS publication (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                gsc_pub_id TEXT NOT NULL UNIQUE,
                title TEXT,
                link TEXT,
                authors TEXT,
                publication_date TEXT,
                source TEXT,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );
            ",
        )?;
        Ok(())
    }

    pub fn get(&self, canonical_id: &str) -> Result<Option<PublicationRow>, StoreError> {
        let conn = self.lock()?;
        find_row(&conn, canonical_id)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM publication", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl PublicationStore for SqliteStore {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

/// Holds the connection for the whole check-then-write sequence.
struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn find_by_identifier(&mut self, canonical_id: &str) -> Result<Option<PublicationRow>, StoreError> {
        find_row(&self.conn, canonical_id)
    }

    fn insert(&mut self, canonical_id: &str, fields: &PublicationFields) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO publication
                    (gsc_pub_id, title, link, authors, publication_date, source, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    canonical_id,
                    fields.title,
                    fields.link,
                    fields.authors,
                    fields.publication_date,
                    fields.source,
                    fields.description,
                    Utc::now(),
                ],
            )
            .map_err(|e| insert_error(e, canonical_id))?;
        Ok(())
    }

    fn update(
        &mut self,
        canonical_id: &str,
        fields: &PublicationFields,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE publication SET
                title = COALESCE(?1, title),
                link = COALESCE(?2, link),
                authors = COALESCE(?3, authors),
                publication_date = COALESCE(?4, publication_date),
                source = COALESCE(?5, source),
                description = COALESCE(?6, description),
                updated_at = ?7
             WHERE gsc_pub_id = ?8",
            params![
                fields.title,
                fields.link,
                fields.authors,
                fields.publication_date,
                fields.source,
                fields.description,
                updated_at,
                canonical_id,
            ],
        )?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("Rollback failed: {}", e);
            }
        }
    }
}

fn insert_error(err: rusqlite::Error, canonical_id: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Duplicate(canonical_id.to_string())
        }
        other => StoreError::Sqlite(other),
    }
}

fn find_row(conn: &Connection, canonical_id: &str) -> Result<Option<PublicationRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, gsc_pub_id, title, link, authors, publication_date, source, description,
                    created_at, updated_at
             FROM publication WHERE gsc_pub_id = ?1",
            params![canonical_id],
            |row| {
                Ok(PublicationRow {
                    id: row.get(0)?,
                    canonical_id: row.get(1)?,
                    fields: PublicationFields {
                        title: row.get(2)?,
                        link: row.get(3)?,
                        authors: row.get(4)?,
                        publication_date: row.get(5)?,
                        source: row.get(6)?,
                        description: row.get(7)?,
                    },
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}
