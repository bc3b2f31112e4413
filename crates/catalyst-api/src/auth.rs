use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Header carrying the session token on every authorized request.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Credential-exchange endpoint (HTTP Basic auth in, `{"Token": "..."}` out).
pub const AUTH_TOKEN_PATH: &str = "/dna/system/api/v1/auth/token";

/// Credentials for authenticating with a Catalyst Center controller.
///
/// Supplied once at startup and never mutated. The secret stays wrapped in
/// a [`SecretString`], so `Debug` output shows `[REDACTED]` in its place.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Controller root (e.g. `https://sandboxdnac.cisco.com`).
    pub host: Url,
    pub username: String,
    pub secret: SecretString,
}

impl Credential {
    pub fn new(host: Url, username: impl Into<String>, secret: SecretString) -> Self {
        Self {
            host,
            username: username.into(),
            secret,
        }
    }
}

/// A token handed out by the credential exchange.
///
/// Catalyst Center does not report a lifetime alongside the token, so
/// `ttl` is usually `None` and the token manager applies its configured TTL.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub value: String,
    pub ttl: Option<Duration>,
}

impl TokenGrant {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("value", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_hides_secret() {
        let cred = Credential::new(
            Url::parse("https://dnac.example.net").expect("valid url"),
            "devnetuser",
            SecretString::from("Cisco123!".to_string()),
        );
        let dbg = format!("{cred:?}");
        assert!(dbg.contains("devnetuser"));
        assert!(!dbg.contains("Cisco123!"));
    }

    #[test]
    fn grant_debug_hides_token_value() {
        let grant = TokenGrant::new("eyJhbGciOi").with_ttl(Duration::from_secs(60));
        let dbg = format!("{grant:?}");
        assert!(!dbg.contains("eyJhbGciOi"));
        assert!(dbg.contains("60s"));
    }
}
