//! Page state: synthesis parameters and the shared store layout

use crate::config::AppConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tts_playback::store::keys;
use tts_playback::Store;

/// Style used when a voice offers none or nothing is selected
pub const DEFAULT_STYLE: &str = "general";

/// Parameters of one synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// Plain text input (empty in SSML mode)
    #[serde(default)]
    pub text: String,

    /// SSML input (empty in text mode)
    #[serde(default)]
    pub ssml: String,

    #[serde(default)]
    pub voice: String,

    #[serde(default = "default_style")]
    pub style: String,

    /// Speaking rate adjustment in percent (-100 to 100)
    #[serde(default)]
    pub rate: i32,

    /// Pitch adjustment in percent (-100 to 100)
    #[serde(default)]
    pub pitch: i32,

    /// Output format; empty lets the server choose
    #[serde(default)]
    pub format: String,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            text: String::new(),
            ssml: String::new(),
            voice: String::new(),
            style: default_style(),
            rate: 0,
            pitch: 0,
            format: String::new(),
        }
    }
}

impl SynthesisParams {
    /// The input that will be spoken (SSML wins when present)
    pub fn input(&self) -> &str {
        if self.ssml.is_empty() {
            &self.text
        } else {
            &self.ssml
        }
    }
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

/// Raw form contents, as persisted between visits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub ssml: String,

    #[serde(default)]
    pub voice: String,

    #[serde(default = "default_style")]
    pub style: String,

    #[serde(default)]
    pub rate: i32,

    #[serde(default)]
    pub pitch: i32,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            text: String::new(),
            ssml: String::new(),
            voice: String::new(),
            style: default_style(),
            rate: 0,
            pitch: 0,
        }
    }
}

impl FormData {
    /// Form seeded from the page configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            voice: config.default_voice.clone(),
            rate: config.default_rate,
            pitch: config.default_pitch,
            ..Self::default()
        }
    }

    /// Build request parameters; only the active input is sent
    pub fn to_params(&self, ssml_mode: bool, format: &str) -> SynthesisParams {
        let style = if self.style.is_empty() {
            default_style()
        } else {
            self.style.clone()
        };

        SynthesisParams {
            text: if ssml_mode { String::new() } else { self.text.clone() },
            ssml: if ssml_mode { self.ssml.clone() } else { String::new() },
            voice: self.voice.clone(),
            style,
            rate: self.rate,
            pitch: self.pitch,
            format: format.to_string(),
        }
    }
}

/// Store populated with every key the page fragments share
pub fn initial_store() -> Store<Value> {
    Store::with_state([
        (keys::IS_SSML_MODE, json!(false)),
        (keys::IS_LOADING, json!(false)),
        (keys::VOICES, json!([])),
        (keys::CURRENT_VOICE, Value::Null),
        (keys::CURRENT_STYLE, json!(DEFAULT_STYLE)),
        (keys::CURRENT_AUDIO, Value::Null),
        (keys::IS_PLAYING, json!(false)),
        (keys::HISTORY, json!([])),
        (
            keys::FORM_DATA,
            serde_json::to_value(FormData::default()).unwrap_or(Value::Null),
        ),
    ])
}

/// Read a boolean flag; absent or non-boolean values read as false
pub fn flag(store: &Store<Value>, key: &str) -> bool {
    store
        .get(key)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}
