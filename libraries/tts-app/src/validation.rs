//! Synthesis parameter validation
//!
//! Every check contributes a user-facing message; a request is valid when
//! no messages were collected.

use crate::error::{AppError, Result};
use crate::state::SynthesisParams;

/// Longest accepted plain-text input, in characters
pub const MAX_TEXT_CHARS: usize = 5000;

/// Accepted range for rate and pitch adjustments, in percent
pub const ADJUSTMENT_RANGE: std::ops::RangeInclusive<i32> = -100..=100;

/// Placeholder value the voice list shows while loading
const LOADING_VOICE: &str = "loading";

pub fn check_text(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return Some("Enter some text to synthesize".to_string());
    }

    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Some(format!(
            "Text is too long: at most {MAX_TEXT_CHARS} characters, got {chars}"
        ));
    }
    None
}

/// Structural SSML check: a `<speak>` root and balanced tag counts
pub fn check_ssml(ssml: &str) -> Option<String> {
    if ssml.trim().is_empty() {
        return Some("Enter SSML content".to_string());
    }

    let has_root = ssml.contains("<speak>") || ssml.contains("<speak ");
    if !has_root || !ssml.contains("</speak>") {
        return Some("Malformed SSML: missing <speak> element".to_string());
    }

    let (open, close) = count_tags(ssml);
    if open != close {
        return Some("Malformed SSML: unbalanced tags".to_string());
    }
    None
}

pub fn check_voice(voice: &str) -> Option<String> {
    if voice.is_empty() || voice == LOADING_VOICE {
        return Some("Select a voice".to_string());
    }
    None
}

/// Validate a full request, collecting every failure
pub fn validate_params(params: &SynthesisParams) -> Result<()> {
    let mut errors = Vec::new();

    let input = if params.ssml.is_empty() {
        check_text(&params.text)
    } else {
        check_ssml(&params.ssml)
    };
    errors.extend(input);
    errors.extend(check_voice(&params.voice));

    if !ADJUSTMENT_RANGE.contains(&params.rate) {
        errors.push("Invalid rate".to_string());
    }
    if !ADJUSTMENT_RANGE.contains(&params.pitch) {
        errors.push("Invalid pitch".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Count opening tags (`<name ...>`) and closing tags (`</name>`)
///
/// Self-closing elements such as `<break time="500ms"/>` count as neither.
fn count_tags(ssml: &str) -> (usize, usize) {
    let mut open = 0;
    let mut close = 0;

    let mut rest = ssml;
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let Some(end) = rest.find('>') else {
            break;
        };
        let tag = &rest[..end];
        if let Some(name) = tag.strip_prefix('/') {
            if is_tag_name(name) {
                close += 1;
            }
        } else if is_tag_name(tag) && !tag.ends_with('/') {
            open += 1;
        }
        rest = &rest[end + 1..];
    }
    (open, close)
}

fn is_tag_name(tag: &str) -> bool {
    tag.chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
