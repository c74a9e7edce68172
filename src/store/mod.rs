//! Document storage.
//!
//! The editor only ever talks to a [`DocumentStore`]. Two backends exist:
//! [`MemoryStore`] (plain in-process collection) and [`SqliteStore`]
//! (same contract, backed by a SQLite file).
//!
//! Writes are last-write-wins; there are no transactions across calls.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::types::{Document, DocumentPayload, DocumentSummary};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// In-process CRUD over a collection of documents.
pub trait DocumentStore: Send {
    /// Look up a document. Missing ids are `Ok(None)`, not an error.
    fn find_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// Insert a new document. The store assigns the id.
    fn create(&mut self, payload: DocumentPayload) -> Result<Document>;

    /// Merge `payload` into an existing record and refresh `updated_at`.
    /// `id` and `created_at` are never touched. Fails if `id` is unknown.
    fn update(&mut self, id: &str, payload: DocumentPayload) -> Result<Document>;

    /// All documents, most recently updated first.
    fn list(&self) -> Result<Vec<DocumentSummary>>;

    /// Bumped on every successful write. Readers compare it to decide
    /// whether their view of the collection is stale.
    fn revision(&self) -> u64;
}

/// Store handle shared between an editor and its pending persist task.
pub type SharedStore = Arc<Mutex<dyn DocumentStore>>;

/// Wrap a concrete store for sharing.
pub fn shared<S: DocumentStore + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}
