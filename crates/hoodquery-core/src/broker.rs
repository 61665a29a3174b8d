//! Brokerage client contract.
//!
//! The session manager and accessor layer only ever look at the *shape* of
//! what comes back (null, list, mapping), so every operation yields a raw
//! [`serde_json::Value`]. [`RobinhoodClient`](crate::RobinhoodClient) is the
//! production implementation; tests substitute recording fakes.
//!
//! | Method | Used by |
//! |--------|---------|
//! | [`login`](Brokerage::login) / [`logout`](Brokerage::logout) | session manager |
//! | [`load_account_profile`](Brokerage::load_account_profile) | session probe |
//! | everything else | one accessor each |

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::{BrokerError, Interval, Span, Symbol};

/// Boxed future returned by every [`Brokerage`] method.
pub type BrokerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BrokerError>> + Send + 'a>>;

/// Arguments of a single login request.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub mfa_code: Option<String>,
    pub store_session: bool,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("mfa_code", &self.mfa_code)
            .field("store_session", &self.store_session)
            .finish()
    }
}

/// Upstream brokerage operations.
///
/// Implementations must be `Send + Sync`; one client is shared by the session
/// manager and the accessor layer.
pub trait Brokerage: Send + Sync {
    /// Authenticates and, when `store_session` is set, keeps the session for
    /// later calls. An empty or null value means the login produced nothing.
    fn login<'a>(&'a self, request: LoginRequest) -> BrokerFuture<'a, Value>;

    fn logout<'a>(&'a self) -> BrokerFuture<'a, ()>;

    fn load_account_profile<'a>(&'a self) -> BrokerFuture<'a, Value>;

    fn load_portfolio_profile<'a>(&'a self) -> BrokerFuture<'a, Value>;

    /// Mapping of symbol to position details.
    fn build_holdings<'a>(&'a self) -> BrokerFuture<'a, Value>;

    fn get_watchlist_by_name<'a>(&'a self, name: &'a str) -> BrokerFuture<'a, Value>;

    fn get_quotes<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value>;

    fn get_fundamentals<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value>;

    fn get_stock_historicals<'a>(
        &'a self,
        symbol: &'a Symbol,
        interval: Interval,
        span: Span,
    ) -> BrokerFuture<'a, Value>;

    fn get_news<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value>;

    fn get_earnings<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value>;

    fn get_ratings<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value>;

    fn get_dividends<'a>(&'a self) -> BrokerFuture<'a, Value>;

    fn get_open_option_positions<'a>(&'a self) -> BrokerFuture<'a, Value>;

    /// Exact instrument lookup by ticker.
    fn get_instruments_by_symbols<'a>(&'a self, symbols: &'a str) -> BrokerFuture<'a, Value>;

    /// Fuzzy instrument search by free text.
    fn find_instrument_data<'a>(&'a self, query: &'a str) -> BrokerFuture<'a, Value>;
}
