// ── Token lifecycle ──
//
// Owns the controller credential and the one cached session token.
// Concurrent callers that find no fresh token share a single credential
// exchange: the first one spawns it, the rest subscribe to its outcome.
// The slot lock is a std mutex and is never held across an await.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use strum::Display;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use catalyst_api::{CatalystClient, Credential, Transport};

use crate::config::TokenPolicy;
use crate::error::CoreError;

// ── Token ────────────────────────────────────────────────────────────

/// A session token with its issue time and lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    issued_at: Instant,
    ttl: Duration,
}

impl Token {
    pub fn new(value: impl Into<String>, issued_at: Instant, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            issued_at,
            ttl,
        }
    }

    /// The raw value for the `X-Auth-Token` header.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn expires_at(&self) -> Instant {
        self.issued_at + self.ttl
    }

    /// Valid iff `now < issued_at + ttl - margin`.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now() < self.issued_at + self.ttl.saturating_sub(margin)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

// ── State ────────────────────────────────────────────────────────────

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TokenState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expired,
}

/// Outcome of one exchange; `None` until the exchange settles.
type Outcome = Option<Result<Token, CoreError>>;

enum Slot {
    Unauthenticated,
    Authenticating(watch::Receiver<Outcome>),
    Authenticated(Token),
    Expired,
}

// ── TokenManager ─────────────────────────────────────────────────────

/// Single-flight token cache over a [`Transport`].
///
/// Cheaply cloneable; clones share the cached token.
pub struct TokenManager<T: Transport = CatalystClient> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for TokenManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    transport: Arc<T>,
    credential: Credential,
    policy: TokenPolicy,
    /// Upper bound on one credential exchange.
    timeout: Duration,
    slot: Mutex<Slot>,
}

impl<T: Transport> TokenManager<T> {
    pub fn new(
        transport: Arc<T>,
        credential: Credential,
        policy: TokenPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                credential,
                policy,
                timeout,
                slot: Mutex::new(Slot::Unauthenticated),
            }),
        }
    }

    /// Return the cached token if still fresh, otherwise start (or join)
    /// a credential exchange and return its outcome.
    ///
    /// The exchange runs on its own task: dropping this future does not
    /// cancel it, and its result still lands in the cache.
    pub async fn get_valid_token(&self) -> Result<Token, CoreError> {
        let mut outcome = {
            let mut slot = self.inner.lock_slot();
            match &*slot {
                Slot::Authenticated(token) if token.is_fresh(self.inner.policy.safety_margin) => {
                    trace!("using cached token");
                    return Ok(token.clone());
                }
                // A closed channel means the exchange task died before settling.
                Slot::Authenticating(rx) if rx.has_changed().is_ok() => {
                    debug!("joining in-flight credential exchange");
                    rx.clone()
                }
                Slot::Unauthenticated
                | Slot::Authenticating(_)
                | Slot::Authenticated(_)
                | Slot::Expired => {
                    let rx = self.spawn_exchange();
                    *slot = Slot::Authenticating(rx.clone());
                    rx
                }
            }
        };

        match outcome.wait_for(Option::is_some).await {
            Ok(settled) => settled.clone().unwrap_or_else(|| Err(abandoned())),
            Err(_) => {
                self.inner.reset_if_abandoned();
                Err(abandoned())
            }
        }
    }

    /// Mark the cached token expired so the next caller re-authenticates.
    /// No effect while an exchange is in flight.
    pub fn invalidate(&self) {
        let mut slot = self.inner.lock_slot();
        if matches!(*slot, Slot::Authenticated(_)) {
            debug!("token invalidated");
            *slot = Slot::Expired;
        }
    }

    /// Expire the cache only if it still holds `token`. Returns whether it did.
    ///
    /// A request that was rejected with an older token must not discard a
    /// replacement another caller already obtained.
    pub fn invalidate_token(&self, token: &Token) -> bool {
        let mut slot = self.inner.lock_slot();
        match &*slot {
            Slot::Authenticated(current) if current.value == token.value => {
                debug!("rejected token invalidated");
                *slot = Slot::Expired;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> TokenState {
        match &*self.inner.lock_slot() {
            Slot::Unauthenticated => TokenState::Unauthenticated,
            Slot::Authenticating(_) => TokenState::Authenticating,
            Slot::Authenticated(token) if token.is_fresh(self.inner.policy.safety_margin) => {
                TokenState::Authenticated
            }
            Slot::Authenticated(_) | Slot::Expired => TokenState::Expired,
        }
    }

    pub fn username(&self) -> &str {
        &self.inner.credential.username
    }

    fn spawn_exchange(&self) -> watch::Receiver<Outcome> {
        let (tx, rx) = watch::channel(None);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = inner.exchange().await;
            inner.settle(&outcome);
            tx.send_replace(Some(outcome));
        });
        rx
    }
}

impl<T: Transport> Inner<T> {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn exchange(&self) -> Result<Token, CoreError> {
        debug!(
            username = %self.credential.username,
            host = %self.credential.host,
            "starting credential exchange"
        );

        let exchange = self.transport.exchange_credential(&self.credential);
        let grant = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(grant)) => grant,
            Ok(Err(err)) => {
                warn!(status = ?err.status(), "credential exchange failed");
                return Err(match CoreError::from(err) {
                    timeout @ CoreError::TransportTimeout { .. } => timeout,
                    CoreError::AuthenticationFailed { status, message }
                    | CoreError::Transport { status, message } => {
                        CoreError::AuthenticationFailed { status, message }
                    }
                    other => CoreError::AuthenticationFailed {
                        status: None,
                        message: other.to_string(),
                    },
                });
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "credential exchange timed out");
                return Err(CoreError::TransportTimeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let ttl = grant.ttl.unwrap_or(self.policy.ttl);
        info!(ttl_secs = ttl.as_secs(), "authenticated with controller");
        Ok(Token::new(grant.value, Instant::now(), ttl))
    }

    fn settle(&self, outcome: &Result<Token, CoreError>) {
        let mut slot = self.lock_slot();
        *slot = match outcome {
            Ok(token) => Slot::Authenticated(token.clone()),
            Err(_) => Slot::Unauthenticated,
        };
    }

    fn reset_if_abandoned(&self) {
        let mut slot = self.lock_slot();
        if let Slot::Authenticating(rx) = &*slot {
            if rx.has_changed().is_err() {
                *slot = Slot::Unauthenticated;
            }
        }
    }
}

fn abandoned() -> CoreError {
    CoreError::AuthenticationFailed {
        status: None,
        message: "credential exchange ended without a result".into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use catalyst_api::{ApiRequest, Error, RawResponse, TokenGrant};
    use secrecy::SecretString;
    use url::Url;

    use super::*;

    /// Scripted transport: counts exchanges, optionally delays them, and
    /// fails them on demand. `send` is unused here.
    struct FakeTransport {
        exchanges: AtomicUsize,
        delay: Duration,
        reject: bool,
        ttl: Option<Duration>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                exchanges: AtomicUsize::new(0),
                delay: Duration::from_millis(50),
                reject: false,
                ttl: None,
            }
        }

        fn exchanges(&self) -> usize {
            self.exchanges.load(Ordering::SeqCst)
        }
    }

    impl Transport for FakeTransport {
        async fn exchange_credential(&self, _credential: &Credential) -> Result<TokenGrant, Error> {
            let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.reject {
                return Err(Error::Authentication {
                    status: 401,
                    message: "Authentication has failed".into(),
                });
            }
            let grant = TokenGrant::new(format!("tok-{n}"));
            Ok(match self.ttl {
                Some(ttl) => grant.with_ttl(ttl),
                None => grant,
            })
        }

        async fn send(&self, _request: &ApiRequest, _token: &str) -> Result<RawResponse, Error> {
            Ok(RawResponse {
                status: 200,
                body: serde_json::Value::Null,
            })
        }
    }

    fn credential() -> Credential {
        Credential::new(
            Url::parse("https://sandboxdnac.cisco.com").expect("valid url"),
            "devnetuser",
            SecretString::from("Cisco123!".to_string()),
        )
    }

    fn manager(transport: FakeTransport) -> (TokenManager<FakeTransport>, Arc<FakeTransport>) {
        let transport = Arc::new(transport);
        let mgr = TokenManager::new(
            Arc::clone(&transport),
            credential(),
            TokenPolicy::default(),
            Duration::from_secs(30),
        );
        (mgr, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_exchange() {
        let (mgr, transport) = manager(FakeTransport::new());

        let (a, b) = tokio::join!(mgr.get_valid_token(), mgr.get_valid_token());

        assert_eq!(transport.exchanges(), 1);
        assert_eq!(a.expect("token").value(), "tok-1");
        assert_eq!(b.expect("token").value(), "tok-1");
        assert_eq!(mgr.state(), TokenState::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_failure() {
        let mut fake = FakeTransport::new();
        fake.reject = true;
        let (mgr, transport) = manager(fake);

        let (a, b) = tokio::join!(mgr.get_valid_token(), mgr.get_valid_token());

        assert_eq!(transport.exchanges(), 1);
        for result in [a, b] {
            assert_eq!(
                result.expect_err("exchange was rejected"),
                CoreError::AuthenticationFailed {
                    status: Some(401),
                    message: "Authentication has failed".into(),
                }
            );
        }
        assert_eq!(mgr.state(), TokenState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_token_is_reused_within_ttl() {
        let (mgr, transport) = manager(FakeTransport::new());

        let first = mgr.get_valid_token().await.expect("token");
        tokio::time::advance(Duration::from_secs(10)).await;
        let second = mgr.get_valid_token().await.expect("token");

        assert_eq!(first.value(), second.value());
        assert_eq!(transport.exchanges(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn token_inside_safety_margin_is_refreshed() {
        let (mgr, transport) = manager(FakeTransport::new());

        mgr.get_valid_token().await.expect("token");
        // 3600 s TTL, 60 s margin: stale from 3540 s on.
        tokio::time::advance(Duration::from_secs(3545)).await;
        assert_eq!(mgr.state(), TokenState::Expired);

        let refreshed = mgr.get_valid_token().await.expect("token");
        assert_eq!(refreshed.value(), "tok-2");
        assert_eq!(transport.exchanges(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reported_ttl_overrides_policy() {
        let mut fake = FakeTransport::new();
        fake.ttl = Some(Duration::from_secs(120));
        let (mgr, _transport) = manager(fake);

        let token = mgr.get_valid_token().await.expect("token");
        assert_eq!(token.ttl(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_reauthentication() {
        let (mgr, transport) = manager(FakeTransport::new());

        mgr.get_valid_token().await.expect("token");
        mgr.invalidate();
        assert_eq!(mgr.state(), TokenState::Expired);

        let token = mgr.get_valid_token().await.expect("token");
        assert_eq!(token.value(), "tok-2");
        assert_eq!(transport.exchanges(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_token_ignores_superseded_tokens() {
        let (mgr, _transport) = manager(FakeTransport::new());

        let old = mgr.get_valid_token().await.expect("token");
        assert!(mgr.invalidate_token(&old));
        let new = mgr.get_valid_token().await.expect("token");

        assert!(!mgr.invalidate_token(&old));
        assert_eq!(mgr.state(), TokenState::Authenticated);
        assert!(mgr.invalidate_token(&new));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_exchange_times_out() {
        let mut fake = FakeTransport::new();
        fake.delay = Duration::from_secs(120);
        let (mgr, _transport) = manager(fake);

        let err = mgr.get_valid_token().await.expect_err("exchange is too slow");
        assert_eq!(err, CoreError::TransportTimeout { timeout_secs: 30 });
        assert_eq!(mgr.state(), TokenState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_caller_does_not_cancel_exchange() {
        let (mgr, transport) = manager(FakeTransport::new());

        let waiter = tokio::spawn({
            let mgr = mgr.clone();
            async move { mgr.get_valid_token().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();
        assert_eq!(mgr.state(), TokenState::Authenticating);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(mgr.state(), TokenState::Authenticated);

        let token = mgr.get_valid_token().await.expect("token");
        assert_eq!(token.value(), "tok-1");
        assert_eq!(transport.exchanges(), 1);
    }

    #[test]
    fn token_debug_hides_value() {
        let token = Token::new("super-secret", Instant::now(), Duration::from_secs(60));
        let dbg = format!("{token:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }
}
