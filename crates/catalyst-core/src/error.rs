// ── Core error types ──
//
// Caller-facing errors from catalyst-core. Validation failures name the
// offending field; transport failures are folded into a small taxonomy so
// callers never match on reqwest or JSON errors directly.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so a single credential-exchange outcome can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Validation (never retried) ───────────────────────────────────
    #[error("Invalid time expression '{expression}': {reason}")]
    InvalidTimeExpression { expression: String, reason: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidFilterValue {
        field: String,
        value: String,
        reason: String,
        /// Accepted values, for enumerated fields.
        allowed: Vec<String>,
    },

    #[error("Unsupported filter '{field}' for {resource} (supported: {})", .supported.join(", "))]
    UnsupportedFilter {
        resource: String,
        field: String,
        supported: Vec<String>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    AuthenticationFailed {
        status: Option<u16>,
        message: String,
    },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Controller request timed out after {timeout_secs}s")]
    TransportTimeout { timeout_secs: u64 },

    #[error("Controller request failed: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Caller-input defects: surfaced immediately, never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimeExpression { .. }
                | Self::InvalidFilterValue { .. }
                | Self::UnsupportedFilter { .. }
        )
    }

    pub(crate) fn invalid_time(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFilterValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            allowed: Vec::new(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<catalyst_api::Error> for CoreError {
    fn from(err: catalyst_api::Error) -> Self {
        match err {
            catalyst_api::Error::Authentication { status, message } => {
                CoreError::AuthenticationFailed {
                    status: Some(status),
                    message,
                }
            }
            catalyst_api::Error::Timeout { timeout_secs } => {
                CoreError::TransportTimeout { timeout_secs }
            }
            catalyst_api::Error::Transport(e) => CoreError::Transport {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            catalyst_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            catalyst_api::Error::Tls(msg) => CoreError::Transport {
                message: format!("TLS error: {msg}"),
                status: None,
            },
            catalyst_api::Error::Api { status, message } => CoreError::Transport {
                message,
                status: Some(status),
            },
            catalyst_api::Error::Deserialization { message, body: _ } => CoreError::Transport {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn api_auth_error_maps_with_status() {
        let err: CoreError = catalyst_api::Error::Authentication {
            status: 401,
            message: "token rejected by controller".into(),
        }
        .into();
        assert_eq!(
            err,
            CoreError::AuthenticationFailed {
                status: Some(401),
                message: "token rejected by controller".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Authentication failed (HTTP 401): token rejected by controller"
        );
    }

    #[test]
    fn api_timeout_maps_to_transport_timeout() {
        let err: CoreError = catalyst_api::Error::Timeout { timeout_secs: 30 }.into();
        assert_eq!(err, CoreError::TransportTimeout { timeout_secs: 30 });
        assert!(!err.is_validation());
    }

    #[test]
    fn unsupported_filter_lists_supported_keys() {
        let err = CoreError::UnsupportedFilter {
            resource: "sites".into(),
            field: "hostname".into(),
            supported: vec!["name".into(), "siteId".into(), "type".into()],
        };
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Unsupported filter 'hostname' for sites (supported: name, siteId, type)"
        );
    }
}
