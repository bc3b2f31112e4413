// catalyst-api: async transport for the Cisco Catalyst Center REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod paths;
pub mod transport;

pub use auth::{AUTH_TOKEN_HEADER, Credential, TokenGrant};
pub use client::CatalystClient;
pub use error::Error;
pub use transport::{ApiRequest, RawResponse, TlsMode, Transport, TransportConfig};
