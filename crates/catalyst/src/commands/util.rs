//! Shared helpers for command handlers.

use serde_json::Value;

use catalyst_core::{PageRequest, RawFilters};

use crate::cli::{FilterArgs, PageArgs, TimeArgs};
use crate::error::CliError;

/// Parse repeated `--filter key=value` flags. A later flag for the same
/// key replaces an earlier one.
pub fn parse_filters(args: &FilterArgs) -> Result<RawFilters, CliError> {
    let mut filters = RawFilters::new();
    for raw in &args.filters {
        let (key, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "filter".into(),
                reason: format!("missing key in '{raw}'"),
            });
        }
        filters.insert(key.to_owned(), Value::String(value.to_owned()));
    }
    Ok(filters)
}

/// Fold `--time` / `--start` / `--end` into the time filter keys.
pub fn apply_time_args(filters: &mut RawFilters, time: &TimeArgs) {
    if let Some(ref range) = time.time {
        filters.insert("timeRange".into(), Value::String(range.clone()));
    }
    if let Some(ref start) = time.start {
        filters.insert("startTime".into(), Value::String(start.clone()));
    }
    if let Some(ref end) = time.end {
        filters.insert("endTime".into(), Value::String(end.clone()));
    }
}

pub fn page_request(page: &PageArgs) -> PageRequest {
    PageRequest::new(page.limit, page.offset)
}

// ── JSON field access ────────────────────────────────────────────────

/// Render a top-level field as display text; missing and null are empty.
pub fn text(item: &Value, key: &str) -> String {
    match item.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// First non-empty field among `keys`.
pub fn first_text(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text(item, key))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Multi-line `key: value` listing for single-record table output.
pub fn detail_lines(item: &Value) -> String {
    match item {
        Value::Object(map) => {
            let width = map.keys().map(String::len).max().unwrap_or(0);
            map.iter()
                .map(|(key, value)| {
                    let rendered = match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    format!("{key:<width$}  {rendered}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        other => other.to_string(),
    }
}
