// ── Filter composition ──
//
// Validates caller-supplied filters against the per-kind table in
// `schema` and renders them as upstream query parameters. Output is a
// `BTreeMap`, so the same filters always compose to the same query.

pub mod schema;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::time::{TimeExpression, TimeNormalizer};

pub use schema::{FieldSpec, FieldType, PageLimits, PatternSyntax, ResourceKind, ResourceSchema};

use schema::{END_TIME_PARAM, START_TIME_PARAM};

/// Caller filters: key → string, number, or null.
pub type RawFilters = BTreeMap<String, Value>;

/// What the caller asked for. `offset` is 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageRequest {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self { limit, offset }
    }
}

/// What was applied after defaults and clamping. `offset` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

/// Canonical query for one fetch. Pagination is kept apart from `params`
/// because each API spells it differently (or not at all).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedQuery {
    pub params: BTreeMap<String, String>,
    pub pagination: Option<Pagination>,
}

/// Builds [`ComposedQuery`]s. Time-bearing filters go through the
/// embedded [`TimeNormalizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterComposer {
    normalizer: TimeNormalizer,
}

#[derive(Default)]
struct TimeInputs {
    start: Option<String>,
    end: Option<String>,
    range: Option<String>,
}

impl FilterComposer {
    pub fn new(normalizer: TimeNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn compose(
        &self,
        kind: ResourceKind,
        filters: &RawFilters,
        page: PageRequest,
    ) -> Result<ComposedQuery, CoreError> {
        self.compose_at(kind, filters, page, Utc::now())
    }

    /// Compose with relative time expressions resolved against `now`.
    pub fn compose_at(
        &self,
        kind: ResourceKind,
        filters: &RawFilters,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<ComposedQuery, CoreError> {
        let schema = kind.schema();
        let mut params = BTreeMap::new();
        let mut time = TimeInputs::default();

        for (key, value) in filters {
            let spec = schema
                .field(key)
                .ok_or_else(|| CoreError::UnsupportedFilter {
                    resource: kind.to_string(),
                    field: key.clone(),
                    supported: schema.keys(),
                })?;
            let Some(text) = value_text(key, value)? else {
                continue;
            };

            match spec.ty {
                FieldType::Exact => {
                    params.insert(spec.param.to_owned(), text);
                }
                FieldType::Contains(syntax) => {
                    params.insert(spec.param.to_owned(), contains_pattern(&text, syntax));
                }
                FieldType::Enum(allowed) => {
                    params.insert(spec.param.to_owned(), canonical_enum(key, &text, allowed)?);
                }
                FieldType::Integer { min, max } => {
                    let n = bounded_integer(key, &text, min, max)?;
                    params.insert(spec.param.to_owned(), n.to_string());
                }
                FieldType::TimeStart => time.start = Some(text),
                FieldType::TimeEnd => time.end = Some(text),
                FieldType::TimeRange => time.range = Some(text),
            }
        }

        if let Some(expression) = time_expression(time)? {
            let range = self.normalizer.normalize_at(&expression, now)?;
            params.insert(START_TIME_PARAM.to_owned(), range.start_ms.to_string());
            params.insert(END_TIME_PARAM.to_owned(), range.end_ms.to_string());
        }

        let pagination = paginate(schema, page)?;
        Ok(ComposedQuery { params, pagination })
    }
}

/// Fold the three time inputs into one expression, if any were set.
fn time_expression(time: TimeInputs) -> Result<Option<TimeExpression>, CoreError> {
    match time {
        TimeInputs {
            range: Some(range),
            start,
            end,
        } => {
            if start.is_some() || end.is_some() {
                return Err(CoreError::invalid_value(
                    "timeRange",
                    range,
                    "cannot be combined with startTime or endTime",
                ));
            }
            Ok(Some(TimeExpression::Relative(range)))
        }
        TimeInputs {
            start: None,
            end: None,
            range: None,
        } => Ok(None),
        TimeInputs { start, end, .. } => Ok(Some(TimeExpression::Explicit { start, end })),
    }
}

// ── Value handling ───────────────────────────────────────────────────

/// Render a filter value as text. `None` means "unset".
fn value_text(key: &str, value: &Value) -> Result<Option<String>, CoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(CoreError::invalid_value(
            key,
            value.to_string(),
            "expected a string or number",
        )),
    }
}

fn contains_pattern(text: &str, syntax: PatternSyntax) -> String {
    match syntax {
        PatternSyntax::Regex => format!(".*{}.*", regex::escape(text)),
        PatternSyntax::Wildcard => format!("*{text}*"),
    }
}

fn canonical_enum(key: &str, text: &str, allowed: &[&str]) -> Result<String, CoreError> {
    allowed
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(text))
        .map(|candidate| (*candidate).to_owned())
        .ok_or_else(|| CoreError::InvalidFilterValue {
            field: key.to_owned(),
            value: text.to_owned(),
            reason: format!("must be one of: {}", allowed.join(", ")),
            allowed: allowed.iter().map(|a| (*a).to_owned()).collect(),
        })
}

fn bounded_integer(key: &str, text: &str, min: i64, max: i64) -> Result<i64, CoreError> {
    let n: i64 = text
        .parse()
        .map_err(|_| CoreError::invalid_value(key, text, "expected an integer"))?;
    if n < min || n > max {
        return Err(CoreError::invalid_value(
            key,
            text,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(n)
}

fn paginate(schema: &ResourceSchema, page: PageRequest) -> Result<Option<Pagination>, CoreError> {
    let Some(limits) = schema.paging else {
        if let Some(limit) = page.limit {
            return Err(CoreError::invalid_value(
                "limit",
                limit.to_string(),
                format!("{} does not paginate", schema.kind),
            ));
        }
        if let Some(offset) = page.offset {
            return Err(CoreError::invalid_value(
                "offset",
                offset.to_string(),
                format!("{} does not paginate", schema.kind),
            ));
        }
        return Ok(None);
    };

    let limit = match page.limit {
        Some(0) => {
            return Err(CoreError::invalid_value("limit", "0", "must be at least 1"));
        }
        Some(requested) => requested.min(limits.max_limit),
        None => limits.default_limit,
    };

    Ok(Some(Pagination {
        limit,
        offset: page.offset.unwrap_or(0),
    }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn filters(pairs: &[(&str, Value)]) -> RawFilters {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .expect("valid instant")
            .with_timezone(&Utc)
    }

    fn compose(
        kind: ResourceKind,
        raw: &RawFilters,
        page: PageRequest,
    ) -> Result<ComposedQuery, CoreError> {
        FilterComposer::default().compose_at(kind, raw, page, now())
    }

    #[test]
    fn clients_limit_is_clamped_to_cap() {
        let query = compose(
            ResourceKind::Clients,
            &filters(&[("ssid", json!("Corporate-WiFi"))]),
            PageRequest::new(Some(500), None),
        )
        .expect("valid filters");

        assert_eq!(
            query.params,
            BTreeMap::from([("ssid".to_owned(), "Corporate-WiFi".to_owned())])
        );
        assert_eq!(query.pagination, Some(Pagination { limit: 100, offset: 0 }));
    }

    #[test]
    fn unknown_os_type_names_field_and_allowed_set() {
        let err = compose(
            ResourceKind::Clients,
            &filters(&[("osType", json!("BeOS"))]),
            PageRequest::default(),
        )
        .expect_err("BeOS is not an accepted osType");

        match err {
            CoreError::InvalidFilterValue {
                field,
                value,
                allowed,
                ..
            } => {
                assert_eq!(field, "osType");
                assert_eq!(value, "BeOS");
                assert!(allowed.iter().any(|a| a == "Windows"));
                assert_eq!(allowed.len(), schema::OS_TYPES.len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn devices_hostname_only_yields_one_param() {
        let query = compose(
            ResourceKind::Devices,
            &filters(&[("hostname", json!("edge")), ("role", Value::Null)]),
            PageRequest::default(),
        )
        .expect("valid filters");

        assert_eq!(query.params.len(), 1);
        assert_eq!(query.params.get("hostname").map(String::as_str), Some(".*edge.*"));
        assert_eq!(query.pagination, Some(Pagination { limit: 100, offset: 0 }));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let query = compose(
            ResourceKind::Devices,
            &filters(&[("hostname", json!("sw1.lab"))]),
            PageRequest::default(),
        )
        .expect("valid filters");
        assert_eq!(query.params["hostname"], r".*sw1\.lab.*");
    }

    #[test]
    fn renamed_keys_and_wildcards_for_clients() {
        let query = compose(
            ResourceKind::Clients,
            &filters(&[
                ("ipAddress", json!("10.10.20.5")),
                ("connectedDevice", json!("AP-3F")),
                ("connectionType", json!("wireless")),
            ]),
            PageRequest::default(),
        )
        .expect("valid filters");

        assert_eq!(
            query.params,
            BTreeMap::from([
                ("connectedNetworkDeviceName".to_owned(), "*AP-3F*".to_owned()),
                ("ipv4Address".to_owned(), "10.10.20.5".to_owned()),
                ("type".to_owned(), "Wireless".to_owned()),
            ])
        );
        assert_eq!(query.pagination, Some(Pagination { limit: 25, offset: 0 }));
    }

    #[test]
    fn enum_match_is_case_insensitive_and_canonical() {
        let query = compose(
            ResourceKind::Devices,
            &filters(&[("reachability", json!("ping reachable"))]),
            PageRequest::default(),
        )
        .expect("valid filters");
        assert_eq!(query.params["reachabilityStatus"], "Ping Reachable");
    }

    #[test]
    fn blank_strings_are_unset() {
        let query = compose(
            ResourceKind::Sites,
            &filters(&[("name", json!("   ")), ("type", json!("")), ("siteId", Value::Null)]),
            PageRequest::default(),
        )
        .expect("valid filters");
        assert!(query.params.is_empty());
    }

    #[test]
    fn unsupported_key_lists_what_is_supported() {
        let err = compose(
            ResourceKind::Sites,
            &filters(&[("hostname", json!("x"))]),
            PageRequest::default(),
        )
        .expect_err("sites have no hostname");
        match err {
            CoreError::UnsupportedFilter {
                resource,
                field,
                supported,
            } => {
                assert_eq!(resource, "sites");
                assert_eq!(field, "hostname");
                assert_eq!(supported, vec!["name", "siteId", "type"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn integer_fields_are_range_checked() {
        let ok = compose(
            ResourceKind::Devices,
            &filters(&[("notSyncedForMinutes", json!(30))]),
            PageRequest::default(),
        )
        .expect("in range");
        assert_eq!(ok.params["notSyncedForMinutes"], "30");

        for bad in [json!(-1), json!("lots"), json!(600_000), json!(1.5)] {
            let err = compose(
                ResourceKind::Devices,
                &filters(&[("notSyncedForMinutes", bad.clone())]),
                PageRequest::default(),
            )
            .expect_err("out of range");
            assert!(
                matches!(err, CoreError::InvalidFilterValue { ref field, .. } if field == "notSyncedForMinutes"),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn time_range_expands_to_both_params() {
        let query = compose(
            ResourceKind::Clients,
            &filters(&[("timeRange", json!("last 3 hours"))]),
            PageRequest::default(),
        )
        .expect("valid filters");

        let end = now().timestamp_millis();
        assert_eq!(query.params["endTime"], end.to_string());
        assert_eq!(query.params["startTime"], (end - 3 * 3_600_000).to_string());
    }

    #[test]
    fn explicit_start_without_end_runs_to_now() {
        let query = compose(
            ResourceKind::ClientDetail,
            &filters(&[("startTime", json!("2024-06-15"))]),
            PageRequest::default(),
        )
        .expect("valid filters");
        assert_eq!(query.params["endTime"], now().timestamp_millis().to_string());
        assert_eq!(query.pagination, None);
    }

    #[test]
    fn time_range_and_literals_are_exclusive() {
        let err = compose(
            ResourceKind::Clients,
            &filters(&[
                ("timeRange", json!("today")),
                ("startTime", json!("2024-06-15")),
            ]),
            PageRequest::default(),
        )
        .expect_err("mutually exclusive");
        assert!(
            matches!(err, CoreError::InvalidFilterValue { ref field, .. } if field == "timeRange")
        );
    }

    #[test]
    fn bad_time_expression_surfaces_from_normalizer() {
        let err = compose(
            ResourceKind::Clients,
            &filters(&[("timeRange", json!("a while ago"))]),
            PageRequest::default(),
        )
        .expect_err("unrecognized vocabulary");
        assert!(matches!(err, CoreError::InvalidTimeExpression { .. }));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = compose(
            ResourceKind::Devices,
            &RawFilters::new(),
            PageRequest::new(Some(0), None),
        )
        .expect_err("limit must be positive");
        assert!(matches!(err, CoreError::InvalidFilterValue { ref field, .. } if field == "limit"));
    }

    #[test]
    fn offset_is_carried_through() {
        let query = compose(
            ResourceKind::Sites,
            &RawFilters::new(),
            PageRequest::new(Some(10), Some(40)),
        )
        .expect("valid page");
        assert_eq!(query.pagination, Some(Pagination { limit: 10, offset: 40 }));
    }

    #[test]
    fn count_rejects_pagination() {
        let err = compose(
            ResourceKind::ClientCount,
            &RawFilters::new(),
            PageRequest::new(Some(10), None),
        )
        .expect_err("count has no pages");
        assert!(err.is_validation());
    }

    #[test]
    fn structured_values_are_rejected() {
        let err = compose(
            ResourceKind::Clients,
            &filters(&[("ssid", json!(["a", "b"]))]),
            PageRequest::default(),
        )
        .expect_err("arrays are not filter values");
        assert!(matches!(err, CoreError::InvalidFilterValue { .. }));
    }
}
