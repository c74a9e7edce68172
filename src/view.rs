//! Render-ready snapshots handed to whatever front end draws the editor.
//!
//! Nothing here holds behaviour; front ends read these structs and map
//! the reset/retry handles onto their own buttons.

use serde::Serialize;

use crate::boundary::ResetHandle;
use crate::config::Locale;
use crate::types::{DocumentStats, SaveStatus};

/// Text area height in rows.
pub const ROWS_FULLSCREEN: usize = 30;
pub const ROWS_NORMAL: usize = 20;

/// User-facing strings for one locale.
#[derive(Debug)]
pub struct Strings {
    pub title_placeholder: &'static str,
    pub body_placeholder: &'static str,
    pub tag_placeholder: &'static str,
    pub words: &'static str,
    pub chars: &'static str,
    pub reading: &'static str,
    pub show_stats: &'static str,
    pub hide_stats: &'static str,
    pub enter_fullscreen: &'static str,
    pub exit_fullscreen: &'static str,
    pub autosaving: &'static str,
    pub saved: &'static str,
    pub save_failed: &'static str,
    pub error_title: &'static str,
    pub error_message: &'static str,
    pub retry: &'static str,
}

static FR: Strings = Strings {
    title_placeholder: "Titre du document...",
    body_placeholder: "Commencez à écrire...",
    tag_placeholder: "Ajouter un tag...",
    words: "mots",
    chars: "caractères",
    reading: "min lecture",
    show_stats: "Afficher les stats",
    hide_stats: "Masquer les stats",
    enter_fullscreen: "Plein écran",
    exit_fullscreen: "Quitter plein écran",
    autosaving: "Sauvegarde auto...",
    saved: "Enregistré",
    save_failed: "Échec de l'enregistrement",
    error_title: "Une erreur s'est produite",
    error_message: "Quelque chose s'est mal passé. Veuillez réessayer ou recharger la page.",
    retry: "Réessayer",
};

static EN: Strings = Strings {
    title_placeholder: "Document title...",
    body_placeholder: "Begin writing...",
    tag_placeholder: "Add tag...",
    words: "words",
    chars: "characters",
    reading: "min read",
    show_stats: "Show stats",
    hide_stats: "Hide stats",
    enter_fullscreen: "Fullscreen",
    exit_fullscreen: "Exit fullscreen",
    autosaving: "Auto-saving...",
    saved: "Saved",
    save_failed: "Save failed",
    error_title: "Something went wrong",
    error_message: "Something went wrong. Please retry or reload the page.",
    retry: "Retry",
};

impl Locale {
    pub fn strings(self) -> &'static Strings {
        match self {
            Locale::Fr => &FR,
            Locale::En => &EN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    pub class_name: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub new_tag: String,
    pub word_count_line: String,
    /// Present only while the stats toggle is on.
    pub stats_line: Option<String>,
    pub stats_toggle_label: &'static str,
    pub fullscreen: bool,
    pub fullscreen_toggle_label: &'static str,
    pub rows: usize,
    pub status_line: String,
    pub title_placeholder: &'static str,
    pub body_placeholder: &'static str,
    pub tag_placeholder: &'static str,
}

impl EditorView {
    pub fn stats_line(stats: &DocumentStats, strings: &Strings) -> String {
        format!(
            "{} {} · {} {} · {} {}",
            stats.word_count,
            strings.words,
            stats.char_count,
            strings.chars,
            stats.reading_minutes,
            strings.reading
        )
    }

    pub fn status_line(status: &SaveStatus, strings: &Strings) -> String {
        match status {
            SaveStatus::Idle | SaveStatus::Pending => strings.autosaving.to_string(),
            SaveStatus::Saved { .. } => strings.saved.to_string(),
            SaveStatus::Failed { error } => format!("{}: {error}", strings.save_failed),
        }
    }
}

/// Built-in panel shown by an error boundary without a custom fallback.
#[derive(Debug, Clone)]
pub struct ErrorPanel {
    pub title: &'static str,
    pub message: &'static str,
    pub retry_label: &'static str,
    pub reset: ResetHandle,
}

impl ErrorPanel {
    pub fn new(locale: Locale, reset: ResetHandle) -> Self {
        let strings = locale.strings();
        Self {
            title: strings.error_title,
            message: strings.error_message,
            retry_label: strings.retry,
            reset,
        }
    }

    /// The retry button: clears the failure so the next render tries again.
    pub fn retry(&self) {
        self.reset.reset();
    }
}

/// Everything an editor subtree can put on screen.
#[derive(Debug, Clone)]
pub enum Screen {
    Editor(EditorView),
    Error(ErrorPanel),
}

impl From<EditorView> for Screen {
    fn from(view: EditorView) -> Self {
        Screen::Editor(view)
    }
}

impl From<ErrorPanel> for Screen {
    fn from(panel: ErrorPanel) -> Self {
        Screen::Error(panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_line_is_localized() {
        let stats = DocumentStats::from_body("hello world  foo", 200);
        assert_eq!(
            EditorView::stats_line(&stats, Locale::Fr.strings()),
            "3 mots · 16 caractères · 1 min lecture"
        );
        assert_eq!(
            EditorView::stats_line(&stats, Locale::En.strings()),
            "3 words · 16 characters · 1 min read"
        );
    }

    #[test]
    fn failed_status_carries_error() {
        let line = EditorView::status_line(
            &SaveStatus::Failed {
                error: "disk full".to_string(),
            },
            Locale::En.strings(),
        );
        assert_eq!(line, "Save failed: disk full");
    }

    #[test]
    fn panel_retry_requests_reset() {
        let reset = ResetHandle::default();
        let panel = ErrorPanel::new(Locale::Fr, reset.clone());
        assert_eq!(panel.retry_label, "Réessayer");
        panel.retry();
        assert!(reset.is_requested());
    }
}
