pub mod boundary;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod store;
pub mod types;
pub mod view;

use anyhow::{Context, Result};

use crate::config::{StoreBackend, StoreConfig};
use crate::store::{shared, MemoryStore, SharedStore, SqliteStore};

pub use crate::boundary::{Component, ErrorBoundary, RenderFailure, ResetHandle};
pub use crate::config::ZenConfig;
pub use crate::debounce::Debouncer;
pub use crate::editor::{EditorState, ZenEditor};
pub use crate::store::DocumentStore;
pub use crate::types::{Document, DocumentPayload, DocumentStats, DocumentSummary, SaveStatus};

/// Install the global `tracing` subscriber.
/// Debug builds log everything; release builds only WARN and above so note
/// content never ends up in logs. Safe to call more than once.
pub fn init_tracing() {
    #[cfg(debug_assertions)]
    let _ = tracing_subscriber::fmt().try_init();
    #[cfg(not(debug_assertions))]
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

/// Build the store selected by `[store]` in the config.
pub fn open_store(config: &StoreConfig) -> Result<SharedStore> {
    match config.backend {
        StoreBackend::Memory => Ok(shared(MemoryStore::new())),
        StoreBackend::Sqlite => {
            let path = config
                .path
                .as_deref()
                .context("store.path is required for the sqlite backend")?;
            tracing::info!(path = %path.display(), "opening document database");
            Ok(shared(SqliteStore::open(path)?))
        }
    }
}
