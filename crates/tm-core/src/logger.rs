//! Logging sink for migration progress events.
//!
//! The migrator reports through a [`MigrationLogger`] held per instance, so
//! each embedding application decides where progress goes.

use serde_json::Value;
use std::collections::BTreeMap;

/// Structured fields attached to a log event.
pub type LogFields = BTreeMap<String, Value>;

/// Receives migration progress events.
pub trait MigrationLogger: Send + Sync {
    fn log(&self, message: &str, fields: &LogFields);
}

impl<F> MigrationLogger for F
where
    F: Fn(&str, &LogFields) + Send + Sync,
{
    fn log(&self, message: &str, fields: &LogFields) {
        self(message, fields)
    }
}

/// Default sink: one line per event on standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLogger;

impl MigrationLogger for StdoutLogger {
    fn log(&self, message: &str, fields: &LogFields) {
        println!("{}", format_event(message, fields));
    }
}

/// Forwards events to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacadeLogger;

impl MigrationLogger for LogFacadeLogger {
    fn log(&self, message: &str, fields: &LogFields) {
        log::info!("{}", format_event(message, fields));
    }
}

/// Render `message {"field":value,...}`, or the bare message without fields.
pub(crate) fn format_event(message: &str, fields: &LogFields) -> String {
    if fields.is_empty() {
        return message.to_string();
    }
    match serde_json::to_string(fields) {
        Ok(json) => format!("{message} {json}"),
        Err(_) => message.to_string(),
    }
}

/// Build a [`LogFields`] map from `key => value` pairs.
macro_rules! log_fields {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut fields = $crate::logger::LogFields::new();
        $(fields.insert($key.to_string(), ::serde_json::json!($value));)*
        fields
    }};
}
pub(crate) use log_fields;
