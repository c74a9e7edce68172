use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ZenConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    /// Quiet period after the last edit before an auto-save fires.
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
    /// Title written when the user left it empty.
    #[serde(default = "default_untitled_title")]
    pub untitled_title: String,
}

impl EditorConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: default_autosave_delay_ms(),
            words_per_minute: default_words_per_minute(),
            untitled_title: default_untitled_title(),
        }
    }
}

fn default_autosave_delay_ms() -> u64 {
    2000
}
fn default_words_per_minute() -> usize {
    200
}
fn default_untitled_title() -> String {
    "Untitled Document".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Database file; required for the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub locale: Locale,
}

impl ZenConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ZenConfig =
            toml::from_str(content).with_context(|| "Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.editor.autosave_delay_ms == 0 {
            anyhow::bail!("editor.autosave_delay_ms must be > 0");
        }
        if self.editor.words_per_minute == 0 {
            anyhow::bail!("editor.words_per_minute must be > 0");
        }
        if self.editor.untitled_title.trim().is_empty() {
            anyhow::bail!("editor.untitled_title must not be blank");
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.path.is_none() {
            anyhow::bail!("store.path is required when store.backend is 'sqlite'");
        }
        Ok(())
    }
}
