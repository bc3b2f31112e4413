//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use catalyst_config::ConfigError;
use catalyst_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Controller request failed: {message}")]
    #[diagnostic(
        code(catalyst::request_failed),
        help(
            "Check that the controller is reachable and the URL is correct.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    RequestFailed {
        message: String,
        status: Option<u16>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(catalyst::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(catalyst::auth_failed),
        help(
            "Verify the username and password for this controller.\n\
             Store a password with: catalyst config set-password --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(catalyst::no_credentials),
        help(
            "Set CATALYST_USERNAME and CATALYST_PASSWORD, add username/password_env\n\
             to the profile, or run: catalyst config set-password --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(catalyst::not_found),
        help("Run: catalyst {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid time expression '{expression}': {reason}")]
    #[diagnostic(
        code(catalyst::invalid_time),
        help(
            "Use \"last N minutes|hours|days|weeks\", today, yesterday, this week,\n\
             this month, or timestamps like 2024-06-14, 2024-06-14 08:30, epoch ms."
        )
    )]
    InvalidTime { expression: String, reason: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    #[diagnostic(code(catalyst::invalid_filter))]
    InvalidFilter {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported filter '{field}' for {resource}")]
    #[diagnostic(code(catalyst::unsupported_filter), help("Supported filters: {supported}"))]
    UnsupportedFilter {
        resource: String,
        field: String,
        supported: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(catalyst::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(catalyst::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(catalyst::no_config),
        help(
            "Pass --controller (or CATALYST_CONTROLLER), or add a profile to\n\
             the config file at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(catalyst::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(catalyst::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RequestFailed {
                status: Some(404), ..
            }
            | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::RequestFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::InvalidTime { .. }
            | Self::InvalidFilter { .. }
            | Self::UnsupportedFilter { .. }
            | Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            Self::Config(_) | Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTimeExpression { expression, reason } => {
                Self::InvalidTime { expression, reason }
            }

            CoreError::InvalidFilterValue {
                field,
                value,
                reason,
                allowed: _,
            } => Self::InvalidFilter {
                field,
                value,
                reason,
            },

            CoreError::UnsupportedFilter {
                resource,
                field,
                supported,
            } => Self::UnsupportedFilter {
                resource,
                field,
                supported: supported.join(", "),
            },

            CoreError::AuthenticationFailed { status: _, message } => Self::AuthFailed { message },

            CoreError::TransportTimeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Transport { message, status } => Self::RequestFailed { message, status },

            CoreError::Config { message } => Self::Config(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Io(err) => Self::Io(err),
            other => Self::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_exit_with_usage() {
        let err: CliError = CoreError::UnsupportedFilter {
            resource: "devices".into(),
            field: "color".into(),
            supported: vec!["hostname".into(), "family".into()],
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(matches!(
            err,
            CliError::UnsupportedFilter { ref supported, .. } if supported == "hostname, family"
        ));
    }

    #[test]
    fn auth_and_transport_codes() {
        let auth: CliError = CoreError::AuthenticationFailed {
            status: Some(401),
            message: "bad credentials".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let timeout: CliError = CoreError::TransportTimeout { timeout_secs: 30 }.into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let upstream: CliError = CoreError::Transport {
            message: "HTTP 500".into(),
            status: Some(500),
        }
        .into();
        assert_eq!(upstream.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn missing_credentials_exit_with_auth() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "lab".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
