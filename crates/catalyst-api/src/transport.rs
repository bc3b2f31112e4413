// Transport seam and shared HTTP client configuration.
//
// `Transport` is the contract the facade consumes: one credential exchange
// and one authorized request. `TransportConfig` carries the TLS and timeout
// settings used to build the `reqwest::Client` behind `CatalystClient`.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::auth::{Credential, TokenGrant};
use crate::error::Error;

// ── Transport contract ──────────────────────────────────────────────

/// The network collaborator behind the token manager and query executor.
///
/// Implementations must report a rejected token as
/// [`Error::Authentication`] so callers can tell "refresh and retry"
/// apart from every other failure.
pub trait Transport: Send + Sync + 'static {
    /// Trade the credential for a fresh token.
    fn exchange_credential(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<TokenGrant, Error>> + Send;

    /// Send one authorized request and return the decoded body.
    fn send(
        &self,
        request: &ApiRequest,
        token: &str,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

/// A single controller request: method, path relative to the host root,
/// and query parameters in the order they should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }
}

/// Decoded controller response. An empty body decodes to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

// ── HTTP client configuration ───────────────────────────────────────

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (lab and sandbox controllers are self-signed).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Every request advertises `Accept: application/json`; the controller
    /// otherwise answers some error paths with HTML.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("catalyst/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
