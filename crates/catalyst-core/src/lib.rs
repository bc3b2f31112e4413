//! Stateful facade over `catalyst-api` for the Catalyst Center CLI workspace.
//!
//! - **[`QueryExecutor`]**: One call per resource fetch: composes the
//!   query, attaches a valid token, retries once when the controller
//!   rejects the token, and shapes the `{"response": ...}` envelope into a
//!   [`ResourceResult`].
//!
//! - **[`TokenManager`]**: Owns the credential and the single cached
//!   token. Concurrent callers share one in-flight credential exchange.
//!
//! - **[`FilterComposer`]**: Validates caller filters against a fixed
//!   per-[`ResourceKind`] table and renders deterministic query parameters
//!   with clamped pagination.
//!
//! - **[`TimeNormalizer`]**: Turns `last 24 hours`, `yesterday`, or literal
//!   timestamps into epoch-millisecond [`TimeRange`]s.

pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod time;
pub mod token;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification, TokenPolicy, parse_time_zone};
pub use error::CoreError;
pub use executor::{QueryExecutor, ResourceQuery, ResourceResult};
pub use filter::{
    ComposedQuery, FilterComposer, PageRequest, Pagination, RawFilters, ResourceKind,
};
pub use time::{TimeExpression, TimeNormalizer, TimeRange};
pub use token::{Token, TokenManager, TokenState};
