// ── Time range normalization ──
//
// Turns "last 24 hours", "yesterday", or a pair of literal timestamps into
// the epoch-millisecond window the assurance API expects. Pure apart from
// reading the clock in `normalize`; `normalize_at` takes the instant.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

static LAST_N: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:last|past)\s+(?:(\d+)\s*)?([a-z]+)$")
        .expect("static pattern is valid")
});

/// Naive date-time layouts, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A validated `[start, end]` window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    /// Build a range, enforcing `0 <= start <= end`.
    pub fn new(start_ms: i64, end_ms: i64) -> Option<Self> {
        (0 <= start_ms && start_ms <= end_ms).then_some(Self { start_ms, end_ms })
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// What a caller can say about time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeExpression {
    /// Natural-language window: `last 24 hours`, `yesterday`, `this week`.
    Relative(String),
    /// Literal endpoints: epoch millis, `YYYY-MM-DD`, date-time, or RFC 3339.
    /// A missing end means "now"; a missing start is an error.
    Explicit {
        start: Option<String>,
        end: Option<String>,
    },
}

impl TimeExpression {
    fn describe(&self) -> String {
        match self {
            Self::Relative(text) => text.clone(),
            Self::Explicit { start, end } => format!(
                "{}..{}",
                start.as_deref().unwrap_or(""),
                end.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Resolves [`TimeExpression`]s against a fixed zone.
///
/// Calendar boundaries ("today", "yesterday") and timestamps written
/// without an offset are interpreted in `zone`.
#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    zone: FixedOffset,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new(crate::config::utc())
    }
}

impl TimeNormalizer {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    /// Normalize against the current instant.
    pub fn normalize(&self, input: &TimeExpression) -> Result<TimeRange, CoreError> {
        self.normalize_at(input, Utc::now())
    }

    /// Normalize against `now`.
    pub fn normalize_at(
        &self,
        input: &TimeExpression,
        now: DateTime<Utc>,
    ) -> Result<TimeRange, CoreError> {
        let (start, end) = match input {
            TimeExpression::Relative(text) => self.relative(text, now)?,
            TimeExpression::Explicit { start, end } => {
                let start = start
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::invalid_time(input.describe(), "a start time is required")
                    })?;
                let start = self.parse_instant(start)?;
                let end = match end.as_deref().filter(|s| !s.trim().is_empty()) {
                    Some(end) => self.parse_instant(end)?,
                    None => now.timestamp_millis(),
                };
                (start, end)
            }
        };

        if start < 0 || end < 0 {
            return Err(CoreError::invalid_time(
                input.describe(),
                "times before 1970-01-01 are not supported",
            ));
        }
        TimeRange::new(start, end).ok_or_else(|| {
            CoreError::invalid_time(input.describe(), "start is after end")
        })
    }

    // ── Relative vocabulary ──────────────────────────────────────────

    fn relative(&self, text: &str, now: DateTime<Utc>) -> Result<(i64, i64), CoreError> {
        let normalized = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        let now_ms = now.timestamp_millis();
        let today = now.with_timezone(&self.zone).date_naive();

        match normalized.as_str() {
            "today" => {
                let tomorrow = today.succ_opt().ok_or_else(|| out_of_range(text))?;
                return Ok((self.day_start(today, text)?, self.day_start(tomorrow, text)?));
            }
            "yesterday" => {
                let yesterday = today.pred_opt().ok_or_else(|| out_of_range(text))?;
                return Ok((self.day_start(yesterday, text)?, self.day_start(today, text)?));
            }
            "this week" => {
                let back = i64::from(today.weekday().num_days_from_monday());
                let monday = today - Duration::days(back);
                return Ok((self.day_start(monday, text)?, now_ms));
            }
            "this month" => {
                let first = today.with_day(1).ok_or_else(|| out_of_range(text))?;
                return Ok((self.day_start(first, text)?, now_ms));
            }
            _ => {}
        }

        let caps = LAST_N
            .captures(&normalized)
            .ok_or_else(|| unrecognized(text))?;
        let count: i64 = match caps.get(1) {
            Some(m) => m.as_str().parse().map_err(|_| out_of_range(text))?,
            None => 1,
        };
        if count == 0 {
            return Err(CoreError::invalid_time(text, "the window must be at least 1 unit"));
        }
        let unit_ms = caps
            .get(2)
            .and_then(|m| unit_millis(m.as_str()))
            .ok_or_else(|| unrecognized(text))?;
        let span = count.checked_mul(unit_ms).ok_or_else(|| out_of_range(text))?;

        Ok((now_ms - span, now_ms))
    }

    fn day_start(&self, day: NaiveDate, text: &str) -> Result<i64, CoreError> {
        self.localize(day.and_time(NaiveTime::MIN), text)
    }

    fn localize(&self, naive: NaiveDateTime, text: &str) -> Result<i64, CoreError> {
        self.zone
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.timestamp_millis())
            .ok_or_else(|| out_of_range(text))
    }

    // ── Literals ─────────────────────────────────────────────────────

    /// Parse one literal endpoint to epoch milliseconds, zero-filling
    /// whatever precision the literal leaves out.
    pub fn parse_instant(&self, literal: &str) -> Result<i64, CoreError> {
        let trimmed = literal.trim();

        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed.parse::<i64>().map_err(|_| out_of_range(literal));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.timestamp_millis());
        }

        for format in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return self.localize(naive, literal);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return self.day_start(date, literal);
        }

        Err(CoreError::invalid_time(
            literal,
            "expected epoch milliseconds, YYYY-MM-DD, YYYY-MM-DD HH:MM[:SS], or RFC 3339",
        ))
    }
}

fn unit_millis(unit: &str) -> Option<i64> {
    match unit {
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE_MS),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR_MS),
        "d" | "day" | "days" => Some(DAY_MS),
        "w" | "wk" | "wks" | "week" | "weeks" => Some(WEEK_MS),
        _ => None,
    }
}

fn unrecognized(text: &str) -> CoreError {
    CoreError::invalid_time(
        text,
        "expected 'last N minutes|hours|days|weeks', 'today', 'yesterday', 'this week', or 'this month'",
    )
}

fn out_of_range(text: &str) -> CoreError {
    CoreError::invalid_time(text, "value is out of range")
}
