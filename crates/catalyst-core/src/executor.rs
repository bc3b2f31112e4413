// ── Query execution ──
//
// One fetch end to end: compose the query, obtain a token, send it, and
// shape the controller's envelope into a `ResourceResult`. A rejected
// token is refreshed and the request retried exactly once.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use catalyst_api::{ApiRequest, CatalystClient, RawResponse, Transport, paths};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::filter::{ComposedQuery, FilterComposer, PageRequest, Pagination, RawFilters, ResourceKind};
use crate::time::TimeNormalizer;
use crate::token::{Token, TokenManager};

// ── Request / result ─────────────────────────────────────────────────

/// One resource fetch, as the caller describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceQuery {
    pub kind: ResourceKind,
    pub filters: RawFilters,
    pub page: PageRequest,
    /// Device id for interfaces, MAC address for client detail.
    pub identifier: Option<String>,
}

impl ResourceQuery {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            filters: RawFilters::new(),
            page: PageRequest::default(),
            identifier: None,
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: RawFilters) -> Self {
        self.filters.extend(filters);
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// Shaped response, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResult {
    pub items: Vec<Value>,
    /// Total matching records, when the controller reports it.
    pub total_count: Option<u64>,
    /// What was applied after defaults and clamping.
    pub pagination: Option<Pagination>,
}

// ── QueryExecutor ────────────────────────────────────────────────────

/// Entry point for resource queries. Cheaply cloneable; clones share the
/// transport and the cached token.
pub struct QueryExecutor<T: Transport = CatalystClient> {
    transport: Arc<T>,
    tokens: TokenManager<T>,
    composer: FilterComposer,
    timeout: Duration,
}

impl<T: Transport> Clone for QueryExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tokens: self.tokens.clone(),
            composer: self.composer,
            timeout: self.timeout,
        }
    }
}

impl QueryExecutor<CatalystClient> {
    /// Build an executor over the HTTP client. No network I/O happens
    /// until the first fetch.
    pub fn connect(config: &ControllerConfig) -> Result<Self, CoreError> {
        let client = CatalystClient::new(config.url.clone(), &config.transport())?;
        Ok(Self::with_transport(Arc::new(client), config))
    }
}

impl<T: Transport> QueryExecutor<T> {
    pub fn with_transport(transport: Arc<T>, config: &ControllerConfig) -> Self {
        let tokens = TokenManager::new(
            Arc::clone(&transport),
            config.credential(),
            config.token,
            config.timeout,
        );
        Self {
            transport,
            tokens,
            composer: FilterComposer::new(TimeNormalizer::new(config.time_zone)),
            timeout: config.timeout,
        }
    }

    pub fn tokens(&self) -> &TokenManager<T> {
        &self.tokens
    }

    // ── Typed helpers ────────────────────────────────────────────────

    pub async fn devices(
        &self,
        filters: RawFilters,
        page: PageRequest,
    ) -> Result<ResourceResult, CoreError> {
        let query = ResourceQuery::new(ResourceKind::Devices)
            .with_filters(filters)
            .with_page(page);
        self.fetch(&query).await
    }

    pub async fn sites(
        &self,
        filters: RawFilters,
        page: PageRequest,
    ) -> Result<ResourceResult, CoreError> {
        let query = ResourceQuery::new(ResourceKind::Sites)
            .with_filters(filters)
            .with_page(page);
        self.fetch(&query).await
    }

    pub async fn interfaces(
        &self,
        device_id: &str,
        page: PageRequest,
    ) -> Result<ResourceResult, CoreError> {
        let query = ResourceQuery::new(ResourceKind::Interfaces)
            .with_identifier(device_id)
            .with_page(page);
        self.fetch(&query).await
    }

    pub async fn clients(
        &self,
        filters: RawFilters,
        page: PageRequest,
    ) -> Result<ResourceResult, CoreError> {
        let query = ResourceQuery::new(ResourceKind::Clients)
            .with_filters(filters)
            .with_page(page);
        self.fetch(&query).await
    }

    /// Detail for one client; `None` when the controller does not know it.
    pub async fn client(&self, mac: &str, filters: RawFilters) -> Result<Option<Value>, CoreError> {
        let query = ResourceQuery::new(ResourceKind::ClientDetail)
            .with_identifier(mac)
            .with_filters(filters);
        Ok(self.fetch(&query).await?.items.into_iter().next())
    }

    pub async fn client_count(&self, filters: RawFilters) -> Result<u64, CoreError> {
        let query = ResourceQuery::new(ResourceKind::ClientCount).with_filters(filters);
        Ok(self.fetch(&query).await?.total_count.unwrap_or(0))
    }

    // ── Generic fetch ────────────────────────────────────────────────

    pub async fn fetch(&self, query: &ResourceQuery) -> Result<ResourceResult, CoreError> {
        let kind = query.kind;
        let identifier = checked_identifier(query)?;
        let composed = self
            .composer
            .compose(kind, &query.filters, query.page)?;
        let request = build_request(kind, identifier, &composed);

        debug!(kind = %kind, params = composed.params.len(), "fetching");
        let body = match self.send_authorized(&request).await {
            Ok(raw) => raw.body,
            Err(CoreError::Transport {
                status: Some(404), ..
            }) if kind == ResourceKind::ClientDetail => Value::Null,
            Err(err) => return Err(err),
        };

        let result = shape(kind, body, composed.pagination)?;
        debug!(
            kind = %kind,
            items = result.items.len(),
            total = ?result.total_count,
            "fetched"
        );
        Ok(result)
    }

    /// Send with a valid token; on an authentication error, refresh the
    /// token and send once more.
    async fn send_authorized(&self, request: &ApiRequest) -> Result<RawResponse, CoreError> {
        let token = self.tokens.get_valid_token().await?;
        match self.send_once(request, &token).await {
            Err(err) if err.is_auth_expired() => {
                warn!(path = %request.path, "token rejected, re-authenticating");
                self.tokens.invalidate_token(&token);
            }
            other => return other.map_err(CoreError::from),
        }

        let fresh = self.tokens.get_valid_token().await?;
        match self.send_once(request, &fresh).await {
            Err(err) if err.is_auth_expired() => {
                self.tokens.invalidate_token(&fresh);
                Err(CoreError::AuthenticationFailed {
                    status: err.status(),
                    message: "controller rejected a freshly issued token".into(),
                })
            }
            other => other.map_err(CoreError::from),
        }
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        token: &Token,
    ) -> Result<RawResponse, catalyst_api::Error> {
        tokio::time::timeout(self.timeout, self.transport.send(request, token.value()))
            .await
            .unwrap_or(Err(catalyst_api::Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }))
    }
}

// ── Request building ─────────────────────────────────────────────────

/// Enforce "identifier iff the kind is addressed through one".
fn checked_identifier(query: &ResourceQuery) -> Result<Option<&str>, CoreError> {
    if !query.kind.requires_identifier() {
        return match &query.identifier {
            Some(id) => Err(CoreError::invalid_value(
                "identifier",
                id.as_str(),
                format!("{} does not take an identifier", query.kind),
            )),
            None => Ok(None),
        };
    }

    let field = if query.kind == ResourceKind::Interfaces {
        "deviceId"
    } else {
        "macAddress"
    };

    let id = query.identifier.as_deref().map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(CoreError::invalid_value(
            field,
            id,
            format!("{} requires an identifier", query.kind),
        ));
    }
    if id.contains(['/', '?', '#']) || id.contains(char::is_whitespace) {
        return Err(CoreError::invalid_value(
            field,
            id,
            "must not contain '/', '?', '#', or whitespace",
        ));
    }
    Ok(Some(id))
}

fn build_request(kind: ResourceKind, identifier: Option<&str>, composed: &ComposedQuery) -> ApiRequest {
    let id = identifier.unwrap_or_default();
    let path = match kind {
        ResourceKind::Devices => paths::NETWORK_DEVICES.to_owned(),
        ResourceKind::Sites => paths::SITES.to_owned(),
        ResourceKind::Interfaces => paths::device_interfaces(id),
        ResourceKind::Clients => paths::CLIENTS.to_owned(),
        ResourceKind::ClientDetail => paths::client(id),
        ResourceKind::ClientCount => paths::CLIENT_COUNT.to_owned(),
    };

    let mut params: Vec<(String, String)> = composed
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let local = kind.schema().paging.is_some_and(|p| p.local);
    if let (Some(page), false) = (composed.pagination, local) {
        // Catalyst Center offsets are 1-based.
        params.push(("offset".into(), page.offset.saturating_add(1).to_string()));
        params.push(("limit".into(), page.limit.to_string()));
    }

    ApiRequest::get(path).with_params(params)
}

// ── Response shaping ─────────────────────────────────────────────────

fn shape(
    kind: ResourceKind,
    body: Value,
    pagination: Option<Pagination>,
) -> Result<ResourceResult, CoreError> {
    match kind {
        ResourceKind::ClientCount => {
            let count = read_count(&body).ok_or_else(|| unexpected(kind, "no count in response"))?;
            Ok(ResourceResult {
                items: Vec::new(),
                total_count: Some(count),
                pagination: None,
            })
        }
        ResourceKind::ClientDetail => {
            let items = match unwrap_envelope(body) {
                Value::Null => Vec::new(),
                Value::Object(map) if map.is_empty() => Vec::new(),
                Value::Array(list) => list,
                other => vec![other],
            };
            Ok(ResourceResult {
                items,
                total_count: None,
                pagination: None,
            })
        }
        ResourceKind::Devices
        | ResourceKind::Sites
        | ResourceKind::Interfaces
        | ResourceKind::Clients => {
            let reported = read_total(&body);
            let mut items = match unwrap_envelope(body) {
                Value::Null => Vec::new(),
                Value::Array(list) => list,
                _ => return Err(unexpected(kind, "expected a list")),
            };

            let local = kind.schema().paging.is_some_and(|p| p.local);
            let total_count = if local {
                u64::try_from(items.len()).ok()
            } else {
                reported
            };

            if let Some(page) = pagination {
                let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
                if local {
                    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
                    items = items.into_iter().skip(offset).take(limit).collect();
                } else {
                    items.truncate(limit);
                }
            }

            Ok(ResourceResult {
                items,
                total_count,
                pagination,
            })
        }
    }
}

/// Strip the `{"response": ...}` envelope when present.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("response") => {
            map.remove("response").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn read_total(body: &Value) -> Option<u64> {
    body.pointer("/page/count")
        .or_else(|| body.pointer("/page/totalCount"))
        .or_else(|| body.get("totalCount"))
        .and_then(Value::as_u64)
}

fn read_count(body: &Value) -> Option<u64> {
    body.pointer("/response/count")
        .or_else(|| body.get("response"))
        .or_else(|| body.get("count"))
        .and_then(Value::as_u64)
        .or_else(|| body.as_u64())
}

fn unexpected(kind: ResourceKind, what: &str) -> CoreError {
    CoreError::Transport {
        message: format!("unexpected {kind} response: {what}"),
        status: None,
    }
}
