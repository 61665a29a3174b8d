//! Serving-layer session handling and the operation catalog.
//!
//! The first [`SessionContext::ensure_ready`] performs the login. Its
//! outcome is kept for the lifetime of the context and never retried.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::accessors::Accessors;
use crate::broker::Brokerage;
use crate::credentials::{CredentialOverrides, EnvLookup};
use crate::session::SessionManager;
use crate::{Interval, QueryError, Span};

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please restart the server.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoginState {
    NotAttempted,
    Succeeded,
    Failed(String),
}

/// Holds the shared brokerage session for a long-lived caller.
pub struct SessionContext {
    session: SessionManager,
    accessors: Accessors,
    overrides: CredentialOverrides,
    login_state: LoginState,
}

impl SessionContext {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self {
            session: SessionManager::new(broker.clone()),
            accessors: Accessors::new(broker),
            overrides: CredentialOverrides::default(),
            login_state: LoginState::NotAttempted,
        }
    }

    pub fn with_credentials(mut self, overrides: CredentialOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.session = self.session.with_env_lookup(env);
        self
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn login_attempted(&self) -> bool {
        self.login_state != LoginState::NotAttempted
    }

    /// Logs in on first use, then checks the session is still alive.
    ///
    /// A failed first login is remembered and reported on every later call
    /// as `Not logged in: <reason>`; a dead session is reported as
    /// [`SESSION_EXPIRED_MESSAGE`].
    pub async fn ensure_ready(&mut self) -> Result<&Accessors, QueryError> {
        if self.login_state == LoginState::NotAttempted {
            self.login_state = match self.session.login(&self.overrides).await {
                Ok(login) => {
                    info!(used_totp = login.used_totp, "logged in to brokerage");
                    LoginState::Succeeded
                }
                Err(error) => {
                    warn!(%error, "brokerage login failed");
                    LoginState::Failed(error.message().to_owned())
                }
            };
        }

        if let LoginState::Failed(reason) = &self.login_state {
            return Err(QueryError::new(format!("Not logged in: {reason}")));
        }

        if !self.session.is_logged_in().await {
            return Err(QueryError::new(SESSION_EXPIRED_MESSAGE));
        }

        Ok(&self.accessors)
    }

    /// Runs one catalog operation after [`ensure_ready`](Self::ensure_ready).
    pub async fn invoke(&mut self, call: &ToolCall) -> Result<Value, QueryError> {
        let accessors = self.ensure_ready().await?;
        debug!(tool = %call.tool(), "running catalog operation");
        call.run(accessors).await
    }
}

/// Named operations exposed to callers. Serializes as `{name, description}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    GetPortfolio,
    GetPositions,
    GetWatchlist,
    GetQuote,
    GetFundamentals,
    GetHistoricals,
    GetNews,
    GetEarnings,
    GetRatings,
    GetDividends,
    GetOptionsPositions,
    SearchSymbols,
}

impl Tool {
    pub const ALL: [Self; 12] = [
        Self::GetPortfolio,
        Self::GetPositions,
        Self::GetWatchlist,
        Self::GetQuote,
        Self::GetFundamentals,
        Self::GetHistoricals,
        Self::GetNews,
        Self::GetEarnings,
        Self::GetRatings,
        Self::GetDividends,
        Self::GetOptionsPositions,
        Self::SearchSymbols,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::GetPortfolio => "robinhood_get_portfolio",
            Self::GetPositions => "robinhood_get_positions",
            Self::GetWatchlist => "robinhood_get_watchlist",
            Self::GetQuote => "robinhood_get_quote",
            Self::GetFundamentals => "robinhood_get_fundamentals",
            Self::GetHistoricals => "robinhood_get_historicals",
            Self::GetNews => "robinhood_get_news",
            Self::GetEarnings => "robinhood_get_earnings",
            Self::GetRatings => "robinhood_get_ratings",
            Self::GetDividends => "robinhood_get_dividends",
            Self::GetOptionsPositions => "robinhood_get_options_positions",
            Self::SearchSymbols => "robinhood_search_symbols",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::GetPortfolio => "Get current portfolio value and performance metrics.",
            Self::GetPositions => "Get all current stock positions with details.",
            Self::GetWatchlist => "Get stocks in a watchlist (default: \"Default\").",
            Self::GetQuote => "Get real-time quote for a stock symbol.",
            Self::GetFundamentals => "Get fundamental data for a stock.",
            Self::GetHistoricals => "Get historical price data for a stock.",
            Self::GetNews => "Get recent news articles for a stock.",
            Self::GetEarnings => "Get earnings data for a stock.",
            Self::GetRatings => "Get analyst ratings summary for a stock.",
            Self::GetDividends => "Get all dividend payments received.",
            Self::GetOptionsPositions => "Get all current options positions (read-only).",
            Self::SearchSymbols => "Search for stock symbols by company name or ticker.",
        }
    }
}

impl Serialize for Tool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entry = serializer.serialize_struct("Tool", 2)?;
        entry.serialize_field("name", self.name())?;
        entry.serialize_field("description", self.description())?;
        entry.end()
    }
}

impl Display for Tool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A catalog operation together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetPortfolio,
    GetPositions,
    GetWatchlist { name: Option<String> },
    GetQuote { symbol: String },
    GetFundamentals { symbol: String },
    GetHistoricals {
        symbol: String,
        interval: String,
        span: String,
    },
    GetNews { symbol: String },
    GetEarnings { symbol: String },
    GetRatings { symbol: String },
    GetDividends,
    GetOptionsPositions,
    SearchSymbols { query: String },
}

impl ToolCall {
    /// Historicals call with the default interval and span.
    pub fn historicals(symbol: impl Into<String>) -> Self {
        Self::GetHistoricals {
            symbol: symbol.into(),
            interval: Interval::default().as_str().to_owned(),
            span: Span::default().as_str().to_owned(),
        }
    }

    pub const fn tool(&self) -> Tool {
        match self {
            Self::GetPortfolio => Tool::GetPortfolio,
            Self::GetPositions => Tool::GetPositions,
            Self::GetWatchlist { .. } => Tool::GetWatchlist,
            Self::GetQuote { .. } => Tool::GetQuote,
            Self::GetFundamentals { .. } => Tool::GetFundamentals,
            Self::GetHistoricals { .. } => Tool::GetHistoricals,
            Self::GetNews { .. } => Tool::GetNews,
            Self::GetEarnings { .. } => Tool::GetEarnings,
            Self::GetRatings { .. } => Tool::GetRatings,
            Self::GetDividends => Tool::GetDividends,
            Self::GetOptionsPositions => Tool::GetOptionsPositions,
            Self::SearchSymbols { .. } => Tool::SearchSymbols,
        }
    }

    pub async fn run(&self, accessors: &Accessors) -> Result<Value, QueryError> {
        Ok(match self {
            Self::GetPortfolio => accessors.get_portfolio().await?,
            Self::GetPositions => accessors.get_positions().await?,
            Self::GetWatchlist { name } => {
                Value::Array(accessors.get_watchlist(name.as_deref()).await?)
            }
            Self::GetQuote { symbol } => accessors.get_quote(symbol).await?,
            Self::GetFundamentals { symbol } => accessors.get_fundamentals(symbol).await?,
            Self::GetHistoricals {
                symbol,
                interval,
                span,
            } => Value::Array(accessors.get_historicals(symbol, interval, span).await?),
            Self::GetNews { symbol } => Value::Array(accessors.get_news(symbol).await?),
            Self::GetEarnings { symbol } => Value::Array(accessors.get_earnings(symbol).await?),
            Self::GetRatings { symbol } => Value::Object(accessors.get_ratings(symbol).await?),
            Self::GetDividends => Value::Array(accessors.get_dividends().await?),
            Self::GetOptionsPositions => Value::Array(accessors.get_options_positions().await?),
            Self::SearchSymbols { query } => Value::Array(accessors.search_symbols(query).await?),
        })
    }
}
