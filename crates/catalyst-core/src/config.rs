// ── Runtime connection configuration ──
//
// These types describe *how* to talk to a Catalyst Center controller.
// They carry credential data and tuning, but never touch disk: the CLI
// (through catalyst-config) constructs a `ControllerConfig` and hands it in.

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use url::Url;

use catalyst_api::{Credential, TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed lab and sandbox controllers).
    DangerAcceptInvalid,
}

/// Token lifetime policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Lifetime applied when the controller does not report one.
    /// Catalyst Center tokens are valid for one hour.
    pub ttl: Duration,
    /// Subtracted from the expiry so a token is never used right as it lapses.
    pub safety_margin: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            safety_margin: Duration::from_secs(60),
        }
    }
}

/// Configuration for one controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://sandboxdnac.cisco.com`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Upper bound for every network call (token exchange and fetches).
    pub timeout: Duration,
    pub token: TokenPolicy,
    /// Zone for calendar-day boundaries ("today", "yesterday") and for
    /// timestamps written without an offset.
    pub time_zone: FixedOffset,
}

impl ControllerConfig {
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            token: TokenPolicy::default(),
            time_zone: utc(),
        }
    }

    /// The immutable credential handed to the token manager.
    pub fn credential(&self) -> Credential {
        Credential::new(self.url.clone(), self.username.clone(), self.password.clone())
    }

    /// Transport settings for the HTTP client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

/// The UTC offset, the default zone.
pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse a zone written as `UTC`, `Z`, or a `+HH:MM` / `-HH:MM` offset.
pub fn parse_time_zone(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Some(utc());
    }
    trimmed.parse::<FixedOffset>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets_and_utc_aliases() {
        assert_eq!(parse_time_zone("UTC"), Some(utc()));
        assert_eq!(parse_time_zone(" z "), Some(utc()));
        assert_eq!(
            parse_time_zone("+02:00").map(|z| z.local_minus_utc()),
            Some(7200)
        );
        assert_eq!(
            parse_time_zone("-05:30").map(|z| z.local_minus_utc()),
            Some(-19800)
        );
        assert_eq!(parse_time_zone("Mars/Olympus"), None);
    }

    #[test]
    fn transport_mirrors_tls_choice() {
        let mut cfg = ControllerConfig::new(
            "https://sandboxdnac.cisco.com".parse().expect("valid url"),
            "devnetuser",
            SecretString::from("Cisco123!".to_string()),
        );
        cfg.tls = TlsVerification::DangerAcceptInvalid;
        cfg.timeout = Duration::from_secs(5);

        let transport = cfg.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(cfg.credential().username, "devnetuser");
    }
}
