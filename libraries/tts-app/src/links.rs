//! Share links for third-party reader apps and download names

use crate::config::AppConfig;
use crate::state::SynthesisParams;
use urlencoding::encode;

/// Source name used when no voice is selected
pub const DEFAULT_SOURCE_NAME: &str = "AzureTTS";

/// Import link for the "Legado" reader app (`reader.json`)
pub fn reader_link(origin: &str, config: &AppConfig, params: &SynthesisParams) -> String {
    share_link(origin, config, "reader.json", params)
}

/// Import link for the "iFreeTime" reader app (`ifreetime.json`)
pub fn ifreetime_link(origin: &str, config: &AppConfig, params: &SynthesisParams) -> String {
    share_link(origin, config, "ifreetime.json", params)
}

fn share_link(
    origin: &str,
    config: &AppConfig,
    endpoint: &str,
    params: &SynthesisParams,
) -> String {
    let name = if params.voice.is_empty() {
        DEFAULT_SOURCE_NAME
    } else {
        params.voice.as_str()
    };

    let mut query = vec![
        format!("v={}", encode(&params.voice)),
        format!("r={}", params.rate),
        format!("p={}", params.pitch),
    ];
    if !params.style.is_empty() {
        query.push(format!("s={}", encode(&params.style)));
    }
    if !params.format.is_empty() {
        query.push(format!("f={}", encode(&params.format)));
    }
    query.push(format!("n={}", encode(name)));

    format!(
        "{}{}/{}?{}",
        origin.trim_end_matches('/'),
        config.base_path,
        endpoint,
        query.join("&")
    )
}

/// File name offered when downloading the current audio
pub fn download_file_name(timestamp_ms: i64) -> String {
    format!("tts_{timestamp_ms}.mp3")
}
