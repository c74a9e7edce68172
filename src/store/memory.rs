use anyhow::{bail, Result};

use crate::types::{new_document_id, Document, DocumentPayload, DocumentSummary};

use super::DocumentStore;

/// Insertion-ordered in-memory collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Vec<Document>,
    revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing documents (e.g. restored from elsewhere).
    pub fn with_documents(docs: Vec<Document>) -> Self {
        Self { docs, revision: 0 }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.docs.iter().find(|d| d.id == id).cloned())
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
        self.docs.push(doc.clone());
        self.revision += 1;
        tracing::debug!(id = %doc.id, "created document");
        Ok(doc)
    }

    fn update(&mut self, id: &str, payload: DocumentPayload) -> Result<Document> {
        let Some(doc) = self.docs.iter_mut().find(|d| d.id == id) else {
            bail!("document not found: {id}");
        };
        doc.title = payload.title;
        doc.body = payload.body;
        doc.tags = payload.tags;
        doc.updated_at = payload.updated_at;
        let updated = doc.clone();
        self.revision += 1;
        tracing::debug!(id, "updated document");
        Ok(updated)
    }

    fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut rows: Vec<DocumentSummary> = self.docs.iter().map(DocumentSummary::from).collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
