//! # Hoodquery Core
//!
//! Read-only brokerage account queries with a small authenticated session
//! layer in front of them.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`accessors`] | Validated query operations (quote, positions, historicals, ...) |
//! | [`adapters`] | Brokerage client implementations (Robinhood REST) |
//! | [`broker`] | The [`Brokerage`] contract every client implements |
//! | [`context`] | Once-only login guard and the named operation catalog |
//! | [`credentials`] | Explicit/environment credential resolution |
//! | [`domain`] | Symbol, interval and span parameter types |
//! | [`error`] | `AuthError`, `QueryError` and friends |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`session`] | Login, logout and session probing |
//! | [`totp`] | RFC 6238 one-time codes |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hoodquery_core::{RobinhoodClient, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials come from ROBINHOOD_USERNAME / ROBINHOOD_PASSWORD /
//!     // ROBINHOOD_TOTP_SECRET unless passed explicitly.
//!     let mut context = SessionContext::new(Arc::new(RobinhoodClient::default()));
//!
//!     let accessors = context.ensure_ready().await?;
//!     let quote = accessors.get_quote("aapl").await?;
//!     println!("{}", quote["last_trade_price"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Two error kinds reach callers. [`AuthError`] comes from session
//! establishment; [`QueryError`] from every accessor and from
//! [`SessionContext::ensure_ready`]. Both carry only a message. Nothing is
//! retried internally.
//!
//! ## Security
//!
//! - Passwords, TOTP secrets and bearer tokens are redacted from `Debug`
//!   output and never logged
//! - The bearer token is only attached to requests for the configured API host

pub mod accessors;
pub mod adapters;
pub mod broker;
pub mod context;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod session;
pub mod totp;

pub use accessors::{Accessors, LookupOutcome, DEFAULT_WATCHLIST};
pub use adapters::RobinhoodClient;
pub use broker::{BrokerFuture, Brokerage, LoginRequest};
pub use context::{SessionContext, Tool, ToolCall, SESSION_EXPIRED_MESSAGE};
pub use credentials::{
    process_env, resolve_totp_secret, CredentialOverrides, Credentials, EnvLookup, PASSWORD_ENV,
    TOTP_SECRET_ENV, USERNAME_ENV,
};
pub use domain::{Interval, Span, Symbol};
pub use error::{AuthError, BrokerError, QueryError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use session::{LoginSession, LogoutOutcome, SessionManager, SessionProbe};
pub use totp::{generate_totp_code, totp_at, TotpError, TOTP_STEP_SECS};
