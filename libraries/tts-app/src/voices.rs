//! Voice catalog: search, labels and style lists

use crate::config::AppConfig;
use crate::state::DEFAULT_STYLE;
use serde::{Deserialize, Serialize};
use tts_playback::TimerManager;

/// One voice as listed by the voices endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Voice {
    pub short_name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub local_name: String,

    #[serde(default)]
    pub gender: String,

    #[serde(default)]
    pub style_list: Vec<String>,
}

impl Voice {
    /// Option label: local name when known, then the gender
    pub fn label(&self) -> String {
        let name = if self.local_name.is_empty() {
            &self.display_name
        } else {
            &self.local_name
        };
        format!("{} ({})", name, self.gender)
    }

    /// Selectable styles, always starting with the default one
    pub fn styles(&self) -> Vec<&str> {
        std::iter::once(DEFAULT_STYLE)
            .chain(
                self.style_list
                    .iter()
                    .map(String::as_str)
                    .filter(|style| *style != DEFAULT_STYLE),
            )
            .collect()
    }
}

/// Response body of the voices endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceList {
    #[serde(default)]
    pub voices: Vec<Voice>,
}

/// Loaded voices plus the current search filter
#[derive(Debug, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    query: String,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            query: String::new(),
        }
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        let list: VoiceList = serde_json::from_str(json)?;
        Ok(Self::new(list.voices))
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    /// Voices matching the query by display, local or short name
    pub fn filtered(&self) -> Vec<&Voice> {
        if self.query.is_empty() {
            return self.voices.iter().collect();
        }
        self.voices
            .iter()
            .filter(|voice| {
                [&voice.display_name, &voice.local_name, &voice.short_name]
                    .iter()
                    .any(|name| name.to_lowercase().contains(&self.query))
            })
            .collect()
    }

    pub fn find(&self, short_name: &str) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.short_name == short_name)
    }

    /// First candidate present in the filtered list (saved choice, then default)
    pub fn preferred<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        let visible = self.filtered();
        candidates
            .iter()
            .copied()
            .filter(|candidate| !candidate.is_empty())
            .find(|candidate| visible.iter().any(|voice| voice.short_name == *candidate))
    }
}

const SEARCH_KEY: &str = "voice-search";

/// Debounces search input before filtering the catalog
#[derive(Debug)]
pub struct VoiceSearch {
    timers: TimerManager<&'static str>,
    delay_ms: u64,
    pending: Option<String>,
}

impl VoiceSearch {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            timers: TimerManager::new(),
            delay_ms: config.search_debounce_ms,
            pending: None,
        }
    }

    /// Record a keystroke; replaces any query not yet applied
    pub fn input(&mut self, query: &str, now_ms: u64) {
        self.pending = Some(query.to_string());
        self.timers.debounce(SEARCH_KEY, now_ms, self.delay_ms);
    }

    /// Apply the pending query once the debounce window has passed
    ///
    /// Returns true if the catalog filter changed.
    pub fn poll(&mut self, now_ms: u64, catalog: &mut VoiceCatalog) -> bool {
        if self.timers.take_due(now_ms).is_empty() {
            return false;
        }
        match self.pending.take() {
            Some(query) => {
                catalog.set_query(&query);
                true
            }
            None => false,
        }
    }

    /// Next time `poll` has work, if any
    pub fn next_due(&self) -> Option<u64> {
        self.timers.next_due()
    }
}
