use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::{new_document_id, Document, DocumentPayload, DocumentSummary};

use super::DocumentStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    id           TEXT PRIMARY KEY NOT NULL,
    title        TEXT NOT NULL,
    body         TEXT NOT NULL,
    tags         TEXT NOT NULL DEFAULT '[]',
    created_time INTEGER NOT NULL,
    updated_time INTEGER NOT NULL
)";

/// [`DocumentStore`] backed by a SQLite file.
/// Tags live in a JSON array column so their order survives a round trip.
pub struct SqliteStore {
    conn: Connection,
    revision: u64,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    /// WAL first, then busy_timeout, so concurrent readers never block a save.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening document database {}", path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::with_connection(conn)
    }

    /// Throwaway database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("creating documents table")?;
        Ok(Self { conn, revision: 0 })
    }
}

fn decode_tags(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed tag column: {e}");
        Vec::new()
    })
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get::<_, String>(0)?,
        title: row.get::<_, String>(1).unwrap_or_default(),
        body: row.get::<_, String>(2).unwrap_or_default(),
        tags: decode_tags(row.get::<_, String>(3).unwrap_or_default()),
        created_at: row.get::<_, i64>(4)?,
        updated_at: row.get::<_, i64>(5)?,
    })
}

impl DocumentStore for SqliteStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let doc = self
            .conn
            .query_row(
                "SELECT id, title, body, tags, created_time, updated_time
                 FROM documents
                 WHERE id = ?1",
                [id],
                document_from_row,
            )
            .optional()?;
        Ok(doc)
    }

    fn create(&mut self, payload: DocumentPayload) -> Result<Document> {
        let doc = Document {
            id: new_document_id(),
            title: payload.title,
            body: payload.body,
            tags: payload.tags,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
        };
        self.conn.execute(
            "INSERT INTO documents (id, title, body, tags, created_time, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                doc.id,
                doc.title,
                doc.body,
                serde_json::to_string(&doc.tags)?,
                doc.created_at,
                doc.updated_at
            ],
        )?;
        self.revision += 1;
        tracing::debug!(id = %doc.id, "created document");
        Ok(doc)
    }

    fn update(&mut self, id: &str, payload: DocumentPayload) -> Result<Document> {
        let changed = self.conn.execute(
            "UPDATE documents
             SET title = ?2, body = ?3, tags = ?4, updated_time = ?5
             WHERE id = ?1",
            params![
                id,
                payload.title,
                payload.body,
                serde_json::to_string(&payload.tags)?,
                payload.updated_at
            ],
        )?;
        if changed == 0 {
            bail!("document not found: {id}");
        }
        self.revision += 1;
        tracing::debug!(id, "updated document");
        self.find_by_id(id)?
            .with_context(|| format!("document vanished after update: {id}"))
    }

    fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, body, tags, created_time, updated_time
             FROM documents
             ORDER BY updated_time DESC",
        )?;
        let rows = stmt
            .query_map([], document_from_row)?
            .filter_map(|r| {
                r.map_err(|e| tracing::warn!("Skipping malformed row: {e}"))
                    .ok()
            })
            .map(|doc| DocumentSummary::from(&doc))
            .collect();
        Ok(rows)
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
