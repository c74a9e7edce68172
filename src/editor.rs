//! The auto-saving "zen" editor session.
//!
//! A [`ZenEditor`] owns the transient edit state for one document. Input
//! mutates that state synchronously; every mutation restarts the autosave
//! quiet period. When the period elapses the latest state is written to
//! the shared store: `update` when the session is bound to a document,
//! `create` otherwise (after which the session is bound to the new id).
//!
//! Reverse flow (store -> editor) only happens through [`ZenEditor::load`]
//! and [`ZenEditor::sync`].

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};

use crate::boundary::Component;
use crate::config::{EditorConfig, Locale, ZenConfig};
use crate::debounce::Debouncer;
use crate::store::SharedStore;
use crate::types::{now_ms, Document, DocumentPayload, DocumentStats, SaveStatus};
use crate::view::{EditorView, Screen, ROWS_FULLSCREEN, ROWS_NORMAL};

/// Ephemeral per-instance state. Never shared, never partially persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub new_tag: String,
    pub fullscreen: bool,
    pub show_stats: bool,
}

/// The part of the session the persist task needs to see and update.
#[derive(Debug)]
struct Session {
    bound_id: Option<String>,
    status: SaveStatus,
    /// Bumped by every `load`; saves issued under an older binding are dropped.
    epoch: u64,
    /// Bumped by every scheduled or explicit save; only the newest one may
    /// report its outcome in `status`.
    generation: u64,
}

/// Which binding and which save a persist run belongs to.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    epoch: u64,
    generation: u64,
}

type SessionHandle = Arc<Mutex<Session>>;

fn lock(session: &SessionHandle) -> MutexGuard<'_, Session> {
    // Nothing in Session can be left half-written by a panic.
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Snapshot of the persisted fields taken when a save is scheduled.
#[derive(Debug, Clone)]
struct Draft {
    title: String,
    body: String,
    tags: Vec<String>,
}

/// Last (identifier, store revision) the local state was loaded against.
type LoadKey = (Option<String>, u64);

pub struct ZenEditor {
    store: SharedStore,
    config: EditorConfig,
    locale: Locale,
    class_name: String,
    state: EditorState,
    session: SessionHandle,
    loaded: Option<LoadKey>,
    debouncer: Debouncer,
}

impl ZenEditor {
    /// A blank editor: the first save creates a new document.
    pub fn new(store: SharedStore, config: &ZenConfig) -> Self {
        Self {
            store,
            debouncer: Debouncer::new(config.editor.autosave_delay()),
            config: config.editor.clone(),
            locale: config.ui.locale,
            class_name: String::new(),
            state: EditorState::default(),
            session: Arc::new(Mutex::new(Session {
                bound_id: None,
                status: SaveStatus::Idle,
                epoch: 0,
                generation: 0,
            })),
            loaded: None,
        }
    }

    /// Construct and load in one step.
    pub async fn mount(
        store: SharedStore,
        document_id: Option<String>,
        config: &ZenConfig,
    ) -> Result<Self> {
        let mut editor = Self::new(store, config);
        editor.load(document_id).await?;
        Ok(editor)
    }

    /// Styling hint passed through to the view untouched.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Bind the session to `document_id` and initialize local state from it.
    ///
    /// The lookup happens first; on error nothing changes. Otherwise local
    /// state is reset to defaults and an unknown id leaves it there.
    /// Edits still waiting on the previous binding are committed before
    /// switching.
    pub async fn load(&mut self, document_id: Option<String>) -> Result<()> {
        if self.debouncer.is_pending() {
            if let Err(e) = self.commit().await {
                tracing::warn!("Dropping unsaved edits before load: {e:#}");
            }
        }

        let (found, revision) = {
            let store = self.store.lock().await;
            let found = match &document_id {
                Some(id) => store.find_by_id(id)?,
                None => None,
            };
            {
                // Rebind while the store is held so no in-flight save lands
                // between the lookup and the switch.
                let mut session = lock(&self.session);
                session.bound_id = document_id.clone();
                session.status = SaveStatus::Idle;
                session.epoch += 1;
                session.generation += 1;
            }
            (found, store.revision())
        };

        self.state.title.clear();
        self.state.body.clear();
        self.state.tags.clear();
        self.state.new_tag.clear();
        match found {
            Some(doc) => {
                tracing::debug!(id = %doc.id, "loaded document into editor");
                self.apply(doc);
            }
            None => {
                if let Some(id) = &document_id {
                    tracing::debug!(id, "document not found; editor left blank");
                }
            }
        }
        self.loaded = Some((document_id, revision));
        Ok(())
    }

    /// Re-read the bound document if the binding or the store changed since
    /// the last load. Skipped while a save is pending so unsaved input is
    /// never overwritten. Returns whether local state was refreshed.
    pub async fn sync(&mut self) -> Result<bool> {
        if self.debouncer.is_pending() {
            return Ok(false);
        }
        let bound_id = self.document_id();
        let (found, revision) = {
            let store = self.store.lock().await;
            let revision = store.revision();
            let key = (bound_id.clone(), revision);
            if self.loaded.as_ref() == Some(&key) {
                return Ok(false);
            }
            let found = match &bound_id {
                Some(id) => store.find_by_id(id)?,
                None => None,
            };
            (found, revision)
        };
        self.loaded = Some((bound_id, revision));
        match found {
            Some(doc) => {
                self.apply(doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply(&mut self, doc: Document) {
        self.state.title = doc.title;
        self.state.body = doc.body;
        self.state.tags = doc.tags;
    }

    // ─── Input ────────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.state.title = title.into();
        self.schedule_save();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.state.body = body.into();
        self.schedule_save();
    }

    /// Append typed text to the title.
    pub fn type_title(&mut self, text: &str) {
        self.state.title.push_str(text);
        self.schedule_save();
    }

    /// Append typed text to the body.
    pub fn type_body(&mut self, text: &str) {
        self.state.body.push_str(text);
        self.schedule_save();
    }

    /// Edit the pending new-tag field. Not persisted.
    pub fn set_new_tag(&mut self, text: impl Into<String>) {
        self.state.new_tag = text.into();
    }

    /// Add the trimmed pending tag. Empty or duplicate tags are ignored and
    /// leave the pending text as it was.
    pub fn add_tag(&mut self) -> bool {
        let tag = self.state.new_tag.trim();
        if tag.is_empty() || self.state.tags.iter().any(|t| t == tag) {
            return false;
        }
        let tag = tag.to_string();
        self.state.tags.push(tag);
        self.state.new_tag.clear();
        self.schedule_save();
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let Some(pos) = self.state.tags.iter().position(|t| t == tag) else {
            return false;
        };
        self.state.tags.remove(pos);
        self.schedule_save();
        true
    }

    /// Key handler for the tag field: Enter (without Shift) adds the tag.
    pub fn handle_tag_key(&mut self, key: &str, shift: bool) -> bool {
        if key == "Enter" && !shift {
            return self.add_tag();
        }
        false
    }

    pub fn toggle_fullscreen(&mut self) {
        self.state.fullscreen = !self.state.fullscreen;
    }

    pub fn toggle_stats(&mut self) {
        self.state.show_stats = !self.state.show_stats;
    }

    // ─── Persistence ──────────────────────────────────────────────────────

    fn draft(&self) -> Draft {
        Draft {
            title: self.state.title.clone(),
            body: self.state.body.clone(),
            tags: self.state.tags.clone(),
        }
    }

    /// Restart the quiet period with a save of the current state.
    fn schedule_save(&mut self) {
        let ticket = self.next_ticket(SaveStatus::Pending);
        let store = self.store.clone();
        let session = self.session.clone();
        let draft = self.draft();
        let untitled = self.config.untitled_title.clone();
        self.debouncer.schedule(move || async move {
            // Failures are recorded in the session status and logged.
            let _ = persist(store, session, ticket, draft, untitled).await;
        });
    }

    fn next_ticket(&self, status: SaveStatus) -> Ticket {
        let mut session = lock(&self.session);
        session.generation += 1;
        session.status = status;
        Ticket {
            epoch: session.epoch,
            generation: session.generation,
        }
    }

    /// Cancel the pending autosave and write the current state now.
    /// Waits behind any autosave that is already writing.
    pub async fn commit(&mut self) -> Result<Document> {
        self.debouncer.cancel();
        let ticket = self.next_ticket(SaveStatus::Pending);
        persist(
            self.store.clone(),
            self.session.clone(),
            ticket,
            self.draft(),
            self.config.untitled_title.clone(),
        )
        .await?
        .context("save dropped: editor switched documents")
    }

    /// Tear the session down. A pending autosave is cancelled, never run.
    pub fn unmount(mut self) {
        if self.debouncer.cancel() {
            tracing::debug!("editor unmounted with unsaved changes; autosave cancelled");
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The document this session writes to, if any.
    pub fn document_id(&self) -> Option<String> {
        lock(&self.session).bound_id.clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        lock(&self.session).status.clone()
    }

    pub fn has_pending_save(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::from_body(&self.state.body, self.config.words_per_minute)
    }

    pub fn view(&self) -> EditorView {
        let strings = self.locale.strings();
        let stats = self.stats();
        EditorView {
            class_name: self.class_name.clone(),
            title: self.state.title.clone(),
            body: self.state.body.clone(),
            tags: self.state.tags.clone(),
            new_tag: self.state.new_tag.clone(),
            word_count_line: format!("{} {}", stats.word_count, strings.words),
            stats_line: self
                .state
                .show_stats
                .then(|| EditorView::stats_line(&stats, strings)),
            stats_toggle_label: if self.state.show_stats {
                strings.hide_stats
            } else {
                strings.show_stats
            },
            fullscreen: self.state.fullscreen,
            fullscreen_toggle_label: if self.state.fullscreen {
                strings.exit_fullscreen
            } else {
                strings.enter_fullscreen
            },
            rows: if self.state.fullscreen {
                ROWS_FULLSCREEN
            } else {
                ROWS_NORMAL
            },
            status_line: EditorView::status_line(&self.save_status(), strings),
            title_placeholder: strings.title_placeholder,
            body_placeholder: strings.body_placeholder,
            tag_placeholder: strings.tag_placeholder,
        }
    }
}

impl Component for ZenEditor {
    type Output = Screen;

    fn render(&mut self) -> Result<Screen> {
        Ok(self.view().into())
    }
}

/// Write `draft` to the store and record the outcome on the session.
///
/// The target is read and the new binding recorded while the store is
/// held, so concurrent runs for one session are serialized: the first
/// creates, the rest update. Runs from before the last `load` write
/// nothing and return `Ok(None)`.
async fn persist(
    store: SharedStore,
    session: SessionHandle,
    ticket: Ticket,
    draft: Draft,
    untitled: String,
) -> Result<Option<Document>> {
    let now = now_ms();
    let payload = DocumentPayload {
        title: if draft.title.is_empty() {
            untitled
        } else {
            draft.title
        },
        body: draft.body,
        tags: draft.tags,
        created_at: now,
        updated_at: now,
    };

    let mut docs = store.lock().await;
    let target = {
        let session = lock(&session);
        if session.epoch != ticket.epoch {
            tracing::debug!("skipping save issued before the last load");
            return Ok(None);
        }
        session.bound_id.clone()
    };
    let result = match &target {
        Some(id) => docs.update(id, payload),
        None => docs.create(payload),
    };

    let mut session = lock(&session);
    let latest = session.generation == ticket.generation;
    match &result {
        Ok(doc) => {
            tracing::debug!(id = %doc.id, created = target.is_none(), latest, "document saved");
            session.bound_id = Some(doc.id.clone());
            if latest {
                session.status = SaveStatus::Saved { at: doc.updated_at };
            }
        }
        Err(e) => {
            tracing::warn!("Autosave failed: {e:#}");
            if latest {
                session.status = SaveStatus::Failed {
                    error: format!("{e:#}"),
                };
            }
        }
    }
    drop(session);
    drop(docs);
    result.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{shared, MemoryStore};

    fn editor() -> ZenEditor {
        ZenEditor::new(shared(MemoryStore::new()), &ZenConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_concatenate() {
        let mut ed = editor();
        for ch in ["H", "e", "l", "l", "o"] {
            ed.type_body(ch);
        }
        ed.type_title("My ");
        ed.type_title("note");
        assert_eq!(ed.state().body, "Hello");
        assert_eq!(ed.state().title, "My note");
    }

    #[tokio::test(start_paused = true)]
    async fn add_tag_trims_and_clears_pending() {
        let mut ed = editor();
        ed.set_new_tag("  rust  ");
        assert!(ed.add_tag());
        assert_eq!(ed.state().tags, vec!["rust"]);
        assert_eq!(ed.state().new_tag, "");
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_tag_is_rejected_and_pending_kept() {
        let mut ed = editor();
        ed.set_new_tag("rust");
        ed.add_tag();
        ed.set_new_tag(" rust");
        assert!(!ed.add_tag());
        assert_eq!(ed.state().tags, vec!["rust"]);
        assert_eq!(ed.state().new_tag, " rust");
    }

    #[tokio::test(start_paused = true)]
    async fn tags_are_case_sensitive() {
        let mut ed = editor();
        ed.set_new_tag("Rust");
        ed.add_tag();
        ed.set_new_tag("rust");
        assert!(ed.add_tag());
        assert_eq!(ed.state().tags, vec!["Rust", "rust"]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_tag_is_rejected() {
        let mut ed = editor();
        ed.set_new_tag("   ");
        assert!(!ed.add_tag());
        assert!(ed.state().tags.is_empty());
        assert!(!ed.has_pending_save());
    }

    #[tokio::test(start_paused = true)]
    async fn remove_tag_keeps_order() {
        let mut ed = editor();
        for t in ["a", "b", "c"] {
            ed.set_new_tag(t);
            ed.add_tag();
        }
        assert!(!ed.remove_tag("zzz"));
        assert_eq!(ed.state().tags.len(), 3);
        assert!(ed.remove_tag("b"));
        assert_eq!(ed.state().tags, vec!["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_adds_tag_shift_enter_does_not() {
        let mut ed = editor();
        ed.set_new_tag("idea");
        assert!(!ed.handle_tag_key("Enter", true));
        assert!(!ed.handle_tag_key("a", false));
        assert!(ed.handle_tag_key("Enter", false));
        assert_eq!(ed.state().tags, vec!["idea"]);
    }

    #[tokio::test(start_paused = true)]
    async fn toggles_do_not_schedule_saves() {
        let mut ed = editor();
        ed.toggle_fullscreen();
        ed.toggle_stats();
        assert!(ed.state().fullscreen);
        assert!(ed.state().show_stats);
        assert!(!ed.has_pending_save());
        let view = ed.view();
        assert_eq!(view.rows, ROWS_FULLSCREEN);
        assert!(view.stats_line.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn view_carries_localized_placeholders() {
        let mut config = ZenConfig::default();
        config.ui.locale = Locale::En;
        let ed = ZenEditor::new(shared(MemoryStore::new()), &config);
        let view = ed.view();
        assert_eq!(view.title_placeholder, "Document title...");
        assert_eq!(view.body_placeholder, "Begin writing...");
        assert_eq!(view.tag_placeholder, "Add tag...");
        assert_eq!(editor().view().tag_placeholder, "Ajouter un tag...");
    }

    #[tokio::test(start_paused = true)]
    async fn commit_with_empty_title_uses_placeholder() {
        let mut ed = editor();
        ed.set_body("text");
        let doc = ed.commit().await.unwrap();
        assert_eq!(doc.title, "Untitled Document");
        assert!(!ed.has_pending_save());
        assert_eq!(ed.document_id(), Some(doc.id));
    }

    #[tokio::test(start_paused = true)]
    async fn stats_follow_body() {
        let mut ed = editor();
        ed.set_body("hello world  foo");
        let stats = ed.stats();
        assert_eq!((stats.word_count, stats.char_count, stats.reading_minutes), (3, 16, 1));
        ed.set_body("");
        let stats = ed.stats();
        assert_eq!((stats.word_count, stats.char_count, stats.reading_minutes), (0, 0, 0));
    }
}
