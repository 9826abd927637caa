//! Log setup for the quiz server.
//!
//! - LOG_LEVEL takes EnvFilter directives, e.g. "info,quiz=trace". An invalid
//!   value falls back to the default filter and is reported once logging is up.
//! - LOG_FORMAT picks "pretty" (default), "compact" or "json".
//!
//! Quiz events log under the "quiz" target, startup and shutdown under
//! "mathquiz_backend". Per-request spans come from the router's TraceLayer.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,quiz=debug,mathquiz_backend=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Unknown or missing values mean `Pretty`.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Parse LOG_LEVEL directives, keeping the rejected value for reporting.
fn filter_from(value: Option<&str>) -> (EnvFilter, Option<String>) {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => match EnvFilter::try_new(v) {
            Ok(f) => (f, None),
            Err(_) => (EnvFilter::new(DEFAULT_FILTER), Some(v.to_string())),
        },
        None => (EnvFilter::new(DEFAULT_FILTER), None),
    }
}

pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok();
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let (filter, rejected) = filter_from(level.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Each format is a different subscriber type, so init inside the match.
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }

    if let Some(bad) = rejected {
        warn!(target: "mathquiz_backend", log_level = %bad, default = DEFAULT_FILTER, "Invalid LOG_LEVEL; using default filter");
    }
    info!(target: "mathquiz_backend", ?format, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!(LogFormat::from_env_value(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some(" compact ")), LogFormat::Compact);
        assert_eq!(LogFormat::from_env_value(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_env_value(Some("xml")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Pretty);
    }

    #[test]
    fn bad_log_level_falls_back_to_default() {
        let (_, rejected) = filter_from(Some("quiz=notalevel"));
        assert_eq!(rejected.as_deref(), Some("quiz=notalevel"));

        let (f, rejected) = filter_from(Some("warn,quiz=trace"));
        assert!(rejected.is_none());
        assert!(f.to_string().contains("quiz=trace"));

        let (f, rejected) = filter_from(Some("  "));
        assert!(rejected.is_none());
        assert!(f.to_string().contains("mathquiz_backend=debug"));
    }
}
