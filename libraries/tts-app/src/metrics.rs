//! Server metrics strip
//!
//! The server exposes Prometheus text; the page shows request count,
//! success rate and mean response time, refreshed on a fixed interval.

use crate::config::AppConfig;
use serde::Serialize;
use std::collections::HashMap;
use tts_playback::TimerManager;

pub const REQUESTS_TOTAL: &str = "tts_requests_total";
pub const ERRORS_TOTAL: &str = "tts_errors_total";
pub const REQUEST_DURATION: &str = "tts_request_duration_seconds";

/// Parse Prometheus exposition text into `name -> value`
///
/// Comment and blank lines are skipped, label sets are dropped, and lines
/// whose value is not a number are ignored. Later samples of the same name
/// overwrite earlier ones.
pub fn parse_metrics(text: &str) -> HashMap<String, f64> {
    let mut metrics = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, rest) = match line.find(['{', ' ', '\t']) {
            Some(at) => line.split_at(at),
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            continue;
        }

        let rest = match rest.strip_prefix('{') {
            Some(labels) => match labels.find('}') {
                Some(end) => &labels[end + 1..],
                None => continue,
            },
            None => rest,
        };

        let Some(value) = rest.split_whitespace().next() else {
            continue;
        };
        if let Ok(value) = value.parse::<f64>() {
            metrics.insert(name.to_string(), value);
        }
    }
    metrics
}

/// Percentage of successful requests, rounded to one decimal
///
/// 100 when nothing has been served yet.
pub fn success_rate(total: f64, errors: f64) -> f64 {
    if total <= 0.0 {
        return 100.0;
    }
    ((total - errors) / total * 1000.0).round() / 10.0
}

/// Values rendered in the metrics strip
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_requests: f64,
    pub success_rate: f64,
    pub mean_duration_secs: f64,
}

impl MetricsSummary {
    pub fn from_metrics(metrics: &HashMap<String, f64>) -> Self {
        let get = |name: &str| metrics.get(name).copied().unwrap_or(0.0);
        let total = get(REQUESTS_TOTAL);
        Self {
            total_requests: total,
            success_rate: success_rate(total, get(ERRORS_TOTAL)),
            mean_duration_secs: get(REQUEST_DURATION),
        }
    }

    pub fn success_rate_text(&self) -> String {
        format!("{:.1}%", self.success_rate)
    }

    pub fn duration_text(&self) -> String {
        format!("{:.2}s", self.mean_duration_secs)
    }
}

const POLL_KEY: &str = "metrics";

/// Decides when the metrics strip refreshes
#[derive(Debug)]
pub struct MetricsPoller {
    timers: TimerManager<&'static str>,
    interval_ms: u64,
}

impl MetricsPoller {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            timers: TimerManager::new(),
            interval_ms: config.metrics_interval_ms,
        }
    }

    /// Whether a fetch is due at `now_ms`; the first call always is
    pub fn should_poll(&mut self, now_ms: u64) -> bool {
        self.timers.throttle(POLL_KEY, now_ms, self.interval_ms)
    }
}
