// Catalyst Center HTTP client
//
// Wraps `reqwest::Client` with controller URL construction, the token
// exchange, and error-envelope decoding. Resource paths live in
// `crate::paths`; this module only knows about transport mechanics.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{AUTH_TOKEN_HEADER, AUTH_TOKEN_PATH, Credential, TokenGrant};
use crate::error::Error;
use crate::transport::{ApiRequest, RawResponse, Transport, TransportConfig};

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AuthTokenResponse {
    #[serde(rename = "Token")]
    token: String,
}

/// The controller reports failures in a few shapes:
/// `{"response": {"errorCode", "message", "detail"}}`, `{"error": "..."}`,
/// or a bare `{"message": "..."}`.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    response: Option<ErrorDetail>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        if let Some(detail) = self.response {
            let text = detail.message.or(detail.detail)?;
            return Some(match detail.error_code {
                Some(code) => format!("{code}: {text}"),
                None => text,
            });
        }
        self.error.or(self.message)
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Raw HTTP client for the Catalyst Center REST API.
///
/// Stateless apart from the connection pool: the token is passed in on
/// every call, so the token manager stays the single owner of auth state.
pub struct CatalystClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl CatalystClient {
    /// Create a client for the controller at `base_url`
    /// (e.g. `https://sandboxdnac.cisco.com`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: TransportConfig::default().timeout,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append an absolute API path to the base URL, keeping any path
    /// prefix the base carries (reverse-proxied controllers).
    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange username/password for a session token.
    ///
    /// `POST /dna/system/api/v1/auth/token` with HTTP Basic auth.
    pub async fn authenticate(&self, credential: &Credential) -> Result<TokenGrant, Error> {
        let url = self.url(AUTH_TOKEN_PATH)?;
        debug!("requesting token at {url}");

        let resp = self
            .http
            .post(url)
            .basic_auth(&credential.username, Some(credential.secret.expose_secret()))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let raw = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                status: status.as_u16(),
                message: error_message(&raw)
                    .unwrap_or_else(|| "controller rejected the credentials".into()),
            });
        }
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: AuthTokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("token response: {e}"),
                // Never keep the body around: it carries the token.
                body: String::new(),
            }
        })?;

        debug!("token issued");
        Ok(TokenGrant::new(parsed.token))
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Send a request with the token attached and decode the JSON body.
    pub async fn request(&self, request: &ApiRequest, token: &str) -> Result<RawResponse, Error> {
        let url = self.url(&request.path)?;
        debug!(params = ?request.params, "{} {url}", request.method);

        let resp = self
            .http
            .request(request.method.clone(), url)
            .query(&request.params)
            .header(AUTH_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                status: status.as_u16(),
                message: "token rejected by controller".into(),
            });
        }
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(bytes = body.len(), "response body received");

        let decoded = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..floor_char_boundary(&body, 200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body: body.clone(),
                }
            })?
        };

        Ok(RawResponse {
            status: status.as_u16(),
            body: decoded,
        })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = error_message(&raw).unwrap_or_else(|| {
            if raw.trim().is_empty() {
                status.to_string()
            } else {
                raw[..floor_char_boundary(&raw, 200)].to_owned()
            }
        });
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl Transport for CatalystClient {
    async fn exchange_credential(&self, credential: &Credential) -> Result<TokenGrant, Error> {
        self.authenticate(credential).await
    }

    async fn send(&self, request: &ApiRequest, token: &str) -> Result<RawResponse, Error> {
        self.request(request, token).await
    }
}

fn error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(raw)
        .ok()
        .and_then(ErrorResponse::into_message)
}

/// Largest index `<= max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_nested_response() {
        let raw = r#"{"response":{"errorCode":"NCND01050","message":"Device not found"}}"#;
        assert_eq!(
            error_message(raw).as_deref(),
            Some("NCND01050: Device not found")
        );
    }

    #[test]
    fn error_message_reads_flat_error() {
        let raw = r#"{"error":"Authentication has failed."}"#;
        assert_eq!(
            error_message(raw).as_deref(),
            Some("Authentication has failed.")
        );
    }

    #[test]
    fn error_message_ignores_non_json() {
        assert!(error_message("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn preview_cut_respects_utf8() {
        let s = "ééééé";
        let cut = floor_char_boundary(s, 3);
        assert!(s.is_char_boundary(cut));
        assert_eq!(cut, 2);
    }

    #[test]
    fn url_keeps_base_prefix() {
        let client = CatalystClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://proxy.example.net/dnac/").expect("valid url"),
        );
        let url = client.url("/dna/intent/api/v1/site").expect("valid path");
        assert_eq!(
            url.as_str(),
            "https://proxy.example.net/dnac/dna/intent/api/v1/site"
        );
    }
}
