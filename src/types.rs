use serde::{Deserialize, Serialize};

/// A user-authored note as held by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String, // 32-char lowercase hex, assigned by the store
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: i64, // Unix timestamp in ms
    pub updated_at: i64, // Unix timestamp in ms
}

/// What a persist call hands to the store.
/// `created_at` is only honoured on create; update keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Listing row without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub updated_at: i64,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            tags: doc.tags.clone(),
            updated_at: doc.updated_at,
        }
    }
}

/// Derived display metrics for a body of text. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub word_count: usize,
    pub char_count: usize,
    pub reading_minutes: usize,
}

impl DocumentStats {
    pub fn from_body(body: &str, words_per_minute: usize) -> Self {
        let word_count = body.split_whitespace().count();
        let char_count = body.chars().count();
        // ceil(words / wpm); 0 words stays 0
        let reading_minutes = word_count.div_ceil(words_per_minute.max(1));
        Self {
            word_count,
            char_count,
            reading_minutes,
        }
    }
}

/// Outcome of the most recent persist, shown in the editor's status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStatus {
    Idle,
    Pending,
    Saved { at: i64 },
    Failed { error: String },
}

/// Current wall-clock time in Unix ms.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Fresh store-assigned identifier: 32 lowercase hex chars (simple-format UUID).
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_for_spaced_words() {
        let stats = DocumentStats::from_body("hello world  foo", 200);
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.char_count, 16);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn stats_for_empty_body() {
        let stats = DocumentStats::from_body("", 200);
        assert_eq!(
            stats,
            DocumentStats {
                word_count: 0,
                char_count: 0,
                reading_minutes: 0
            }
        );
    }

    #[test]
    fn stats_whitespace_only_and_long_bodies() {
        assert_eq!(DocumentStats::from_body(" \n\t ", 200).word_count, 0);
        let body = vec!["word"; 401].join(" ");
        let stats = DocumentStats::from_body(&body, 200);
        assert_eq!(stats.word_count, 401);
        assert_eq!(stats.reading_minutes, 3);
    }

    #[test]
    fn char_count_is_in_characters() {
        assert_eq!(DocumentStats::from_body("écrire", 200).char_count, 6);
    }

    #[test]
    fn generated_ids_are_lowercase_hex() {
        let id = new_document_id();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert_ne!(id, new_document_id());
    }
}
