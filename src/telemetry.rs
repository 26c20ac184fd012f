//! One JSON object per line on stderr, for the binaries' lifecycle events.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Optional correlation fields attached to a log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogContext<'a> {
    pub match_id: Option<&'a str>,
    pub session: Option<&'a str>,
    pub scenario: Option<&'a str>,
    pub seed: Option<u32>,
    pub tick: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine<'a> {
    timestamp: String,
    level: LogLevel,
    event: &'a str,
    #[serde(rename = "matchId", skip_serializing_if = "Option::is_none")]
    match_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

pub fn format_log_line(level: LogLevel, event: &str, context: LogContext<'_>, details: Value) -> String {
    let line = StructuredLogLine {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        event,
        match_id: context.match_id,
        session: context.session,
        scenario: context.scenario,
        seed: context.seed,
        tick: context.tick,
        details,
    };
    match serde_json::to_string(&line) {
        Ok(text) => text,
        Err(error) => format!(r#"{{"level":"error","event":"log_encode_failed","error":"{error}"}}"#),
    }
}

pub fn emit_log(level: LogLevel, event: &str, context: LogContext<'_>, details: Value) {
    eprintln!("{}", format_log_line(level, event, context, details));
}
