//! Synthesis history

use crate::error::Result;
use crate::state::SynthesisParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Entries kept by [`MemoryHistory`]
pub const MAX_HISTORY_ITEMS: usize = 50;

/// Characters shown in a history summary before truncation
pub const SUMMARY_CHARS: usize = 50;

/// One completed synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(flatten)]
    pub params: SynthesisParams,

    pub audio_url: String,

    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(
        params: SynthesisParams,
        audio_url: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            params,
            audio_url: audio_url.into(),
            timestamp,
        }
    }

    /// Spoken input shortened for list display
    pub fn summary(&self) -> String {
        let input = if self.params.text.is_empty() {
            &self.params.ssml
        } else {
            &self.params.text
        };
        truncate(input, SUMMARY_CHARS)
    }
}

/// Cut `text` to `max_chars` characters, appending "..." when shortened
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Persistence for synthesis history (newest first)
#[cfg_attr(test, mockall::automock)]
pub trait HistoryRepository {
    fn add(&self, item: HistoryItem) -> Result<()>;

    /// All entries, newest first
    fn list(&self) -> Result<Vec<HistoryItem>>;

    fn clear(&self) -> Result<()>;
}

/// In-memory history capped at a fixed number of entries
#[derive(Debug)]
pub struct MemoryHistory {
    items: RefCell<VecDeque<HistoryItem>>,
    capacity: usize,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ITEMS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RefCell::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl HistoryRepository for MemoryHistory {
    fn add(&self, item: HistoryItem) -> Result<()> {
        let mut items = self.items.borrow_mut();
        items.push_front(item);
        items.truncate(self.capacity);
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryItem>> {
        Ok(self.items.borrow().iter().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        self.items.borrow_mut().clear();
        Ok(())
    }
}
