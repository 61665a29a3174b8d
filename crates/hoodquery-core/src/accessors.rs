//! Read-only accessors over a [`Brokerage`].
//!
//! Each accessor validates its parameters, makes exactly one upstream call
//! (symbol search: at most two) and normalizes the result shape:
//!
//! | Accessor | Returns | Non-conforming result |
//! |----------|---------|-----------------------|
//! | [`get_portfolio`](Accessors::get_portfolio) | mapping | null → error |
//! | [`get_positions`](Accessors::get_positions) | mapping | null → error |
//! | [`get_watchlist`](Accessors::get_watchlist) | list | non-list → `[]` |
//! | [`get_quote`](Accessors::get_quote) | first element | empty → error |
//! | [`get_fundamentals`](Accessors::get_fundamentals) | first element | empty → error |
//! | [`get_historicals`](Accessors::get_historicals) | list | non-list → `[]` |
//! | [`get_news`](Accessors::get_news) | list | non-list → `[]` |
//! | [`get_earnings`](Accessors::get_earnings) | list | non-list → `[]` |
//! | [`get_ratings`](Accessors::get_ratings) | mapping | non-mapping → error |
//! | [`get_dividends`](Accessors::get_dividends) | list | non-list → `[]` |
//! | [`get_options_positions`](Accessors::get_options_positions) | list | non-list → `[]` |
//! | [`search_symbols`](Accessors::search_symbols) | list | non-list → `[]` |
//!
//! A null result from any single-call accessor is an error, as is any
//! upstream failure.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::broker::{BrokerFuture, Brokerage};
use crate::{Interval, QueryError, Span, Symbol, ValidationError};

pub const DEFAULT_WATCHLIST: &str = "Default";
pub const NULL_RESULT_MESSAGE: &str = "API returned None - you may need to login first";

/// Outcome of the exact-match step of [`Accessors::search_symbols`].
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Vec<Value>),
    /// Null, empty or not a list.
    Empty,
    Failed(String),
}

#[derive(Clone)]
pub struct Accessors {
    broker: Arc<dyn Brokerage>,
}

impl Accessors {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }

    /// Portfolio profile: equity, extended hours equity, market value.
    pub async fn get_portfolio(&self) -> Result<Value, QueryError> {
        safe_call(self.broker.load_portfolio_profile()).await
    }

    /// Holdings keyed by symbol.
    pub async fn get_positions(&self) -> Result<Value, QueryError> {
        safe_call(self.broker.build_holdings()).await
    }

    /// Items of the named watchlist; `None` selects [`DEFAULT_WATCHLIST`].
    pub async fn get_watchlist(&self, name: Option<&str>) -> Result<Vec<Value>, QueryError> {
        let name = name.unwrap_or(DEFAULT_WATCHLIST);
        let result = safe_call(self.broker.get_watchlist_by_name(name)).await?;
        Ok(list_or_empty(result))
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<Value, QueryError> {
        let symbol = Symbol::parse(symbol)?;
        let result = safe_call(self.broker.get_quotes(&symbol)).await?;
        first_element(result)
            .ok_or_else(|| QueryError::new(format!("No quote found for symbol: {symbol}")))
    }

    pub async fn get_fundamentals(&self, symbol: &str) -> Result<Value, QueryError> {
        let symbol = Symbol::parse(symbol)?;
        let result = safe_call(self.broker.get_fundamentals(&symbol)).await?;
        first_element(result)
            .ok_or_else(|| QueryError::new(format!("No fundamentals found for symbol: {symbol}")))
    }

    /// OHLCV points. `interval` and `span` must be one of the values listed
    /// by [`Interval::ALL`] and [`Span::ALL`].
    pub async fn get_historicals(
        &self,
        symbol: &str,
        interval: &str,
        span: &str,
    ) -> Result<Vec<Value>, QueryError> {
        let symbol = Symbol::parse(symbol)?;
        let interval = Interval::from_str(interval)?;
        let span = Span::from_str(span)?;

        let result = safe_call(self.broker.get_stock_historicals(&symbol, interval, span)).await?;
        Ok(list_or_empty(result))
    }

    pub async fn get_news(&self, symbol: &str) -> Result<Vec<Value>, QueryError> {
        let symbol = Symbol::parse(symbol)?;
        let result = safe_call(self.broker.get_news(&symbol)).await?;
        Ok(list_or_empty(result))
    }

    pub async fn get_earnings(&self, symbol: &str) -> Result<Vec<Value>, QueryError> {
        let symbol = Symbol::parse(symbol)?;
        let result = safe_call(self.broker.get_earnings(&symbol)).await?;
        Ok(list_or_empty(result))
    }

    pub async fn get_ratings(&self, symbol: &str) -> Result<Map<String, Value>, QueryError> {
        let symbol = Symbol::parse(symbol)?;
        match safe_call(self.broker.get_ratings(&symbol)).await? {
            Value::Object(ratings) => Ok(ratings),
            _ => Err(QueryError::new(format!(
                "No ratings found for symbol: {symbol}"
            ))),
        }
    }

    pub async fn get_dividends(&self) -> Result<Vec<Value>, QueryError> {
        let result = safe_call(self.broker.get_dividends()).await?;
        Ok(list_or_empty(result))
    }

    pub async fn get_options_positions(&self) -> Result<Vec<Value>, QueryError> {
        let result = safe_call(self.broker.get_open_option_positions()).await?;
        Ok(list_or_empty(result))
    }

    /// Exact ticker lookup on the uppercased query, falling back to a fuzzy
    /// search on the trimmed query. Only a fallback failure is reported.
    pub async fn search_symbols(&self, query: &str) -> Result<Vec<Value>, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        match self.exact_lookup(&query.to_uppercase()).await {
            LookupOutcome::Found(instruments) => return Ok(instruments),
            LookupOutcome::Empty => debug!(query, "no exact instrument match"),
            LookupOutcome::Failed(reason) => debug!(query, %reason, "exact lookup failed"),
        }

        match self.broker.find_instrument_data(query).await {
            Ok(result) => Ok(list_or_empty(result)),
            Err(error) => Err(QueryError::new(format!("Search failed: {error}"))),
        }
    }

    async fn exact_lookup(&self, ticker: &str) -> LookupOutcome {
        match self.broker.get_instruments_by_symbols(ticker).await {
            Ok(Value::Array(items)) if !items.is_empty() => LookupOutcome::Found(items),
            Ok(_) => LookupOutcome::Empty,
            Err(error) => LookupOutcome::Failed(error.message().to_owned()),
        }
    }
}

async fn safe_call(call: BrokerFuture<'_, Value>) -> Result<Value, QueryError> {
    match call.await {
        Ok(Value::Null) => Err(QueryError::new(NULL_RESULT_MESSAGE)),
        Ok(value) => Ok(value),
        Err(error) => Err(QueryError::new(format!("API call failed: {error}"))),
    }
}

fn list_or_empty(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn first_element(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().next(),
        _ => None,
    }
}
