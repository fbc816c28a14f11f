//! Page fragments driven by the shared store
//!
//! Each fragment keeps only presentation logic; the DOM binding renders
//! whatever these return.

use crate::config::AppConfig;
use crate::error::Result;
use crate::history::HistoryRepository;
use crate::state::flag;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::debug;
use tts_playback::store::keys;
use tts_playback::Store;

// ===== Character counter =====

/// Severity shown next to the character count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharLevel {
    Normal,
    Warning,
    Danger,
}

impl CharLevel {
    /// CSS class for the counter, if any
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Warning => Some("warning"),
            Self::Danger => Some("danger"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCount {
    pub count: usize,
    pub level: CharLevel,
}

/// Counts characters of the active input
#[derive(Debug, Clone, Copy)]
pub struct CharCounter {
    warning_above: usize,
    danger_above: usize,
}

impl Default for CharCounter {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl CharCounter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            warning_above: config.char_warning_threshold,
            danger_above: config.char_danger_threshold,
        }
    }

    pub fn level(&self, count: usize) -> CharLevel {
        if count > self.danger_above {
            CharLevel::Danger
        } else if count > self.warning_above {
            CharLevel::Warning
        } else {
            CharLevel::Normal
        }
    }

    pub fn measure(&self, text: &str) -> CharCount {
        let count = text.chars().count();
        CharCount {
            count,
            level: self.level(count),
        }
    }

    /// Measure whichever input the current mode shows
    pub fn measure_active(&self, store: &Store<Value>, text: &str, ssml: &str) -> CharCount {
        if flag(store, keys::IS_SSML_MODE) {
            self.measure(ssml)
        } else {
            self.measure(text)
        }
    }
}

// ===== Input mode toggle =====

/// Switches between plain-text and SSML input
#[derive(Clone)]
pub struct InputModeToggle {
    store: Store<Value>,
}

impl InputModeToggle {
    pub fn new(store: Store<Value>) -> Self {
        Self { store }
    }

    pub fn is_ssml(&self) -> bool {
        flag(&self.store, keys::IS_SSML_MODE)
    }

    /// Flip the mode; returns the new SSML flag
    pub fn toggle(&self) -> bool {
        let ssml = !self.is_ssml();
        self.store.set(keys::IS_SSML_MODE, json!(ssml));
        debug!(ssml, "Input mode toggled");
        ssml
    }

    /// Button label for the current mode
    pub fn label(&self) -> &'static str {
        if self.is_ssml() {
            "SSML"
        } else {
            "Text"
        }
    }
}

// ===== History panel =====

/// Shown when the history is empty
pub const EMPTY_HISTORY_MESSAGE: &str = "No history yet";

/// One rendered history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub summary: String,
    pub voice: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HistoryView {
    Empty { message: String },
    Rows { rows: Vec<HistoryRow> },
}

/// Slide-out panel listing past syntheses
pub struct HistoryPanel {
    history: Rc<dyn HistoryRepository>,
    open: bool,
}

impl HistoryPanel {
    pub fn new(history: Rc<dyn HistoryRepository>) -> Self {
        Self {
            history,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the panel and render its contents
    pub fn open(&mut self) -> Result<HistoryView> {
        self.open = true;
        self.render()
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Close when open; otherwise open and render
    pub fn toggle(&mut self) -> Result<Option<HistoryView>> {
        if self.open {
            self.close();
            Ok(None)
        } else {
            self.open().map(Some)
        }
    }

    pub fn render(&self) -> Result<HistoryView> {
        let items = self.history.list()?;
        if items.is_empty() {
            return Ok(HistoryView::Empty {
                message: EMPTY_HISTORY_MESSAGE.to_string(),
            });
        }

        let rows = items
            .iter()
            .map(|item| HistoryRow {
                summary: item.summary(),
                voice: item.params.voice.clone(),
                timestamp: item.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect();
        Ok(HistoryView::Rows { rows })
    }
}

// ===== Keyboard shortcuts =====

/// Page-level keyboard actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl+Enter
    Synthesize,
    /// Ctrl+H
    ToggleHistory,
}

impl Shortcut {
    /// Map a keydown to a page action
    pub fn from_key(ctrl: bool, key: &str) -> Option<Self> {
        if !ctrl {
            return None;
        }
        match key {
            "Enter" => Some(Self::Synthesize),
            "h" => Some(Self::ToggleHistory),
            _ => None,
        }
    }
}
