use std::sync::{Arc, RwLock};

use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::broker::{BrokerFuture, Brokerage, LoginRequest};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::{BrokerError, Interval, Span, Symbol};

pub const DEFAULT_BASE_URL: &str = "https://api.robinhood.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// Public OAuth client id used by the Robinhood web and mobile apps.
const CLIENT_ID: &str = "c82SH0WZOsabOXGP2sxqcj34FxkvfnWRZBKlBjFS";
const SESSION_EXPIRES_IN_SECS: u64 = 86_400;
const MAX_PAGES: usize = 100;

/// Robinhood REST client.
///
/// The bearer token obtained by [`Brokerage::login`] lives in memory only and
/// is attached to requests aimed at the configured base URL. Requests to any
/// other host (for example instrument links embedded in responses that point
/// elsewhere) go out unauthenticated.
#[derive(Clone)]
pub struct RobinhoodClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
    device_token: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl Default for RobinhoodClient {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()))
    }
}

impl RobinhoodClient {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            device_token: Uuid::new_v4().to_string(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_session(&self) -> bool {
        self.access_token
            .read()
            .map(|token| token.is_some())
            .unwrap_or(false)
    }

    fn current_token(&self) -> Option<String> {
        self.access_token
            .read()
            .ok()
            .and_then(|token| token.clone())
    }

    fn store_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = token;
        }
    }

    fn token_for(&self, url: &str) -> Option<String> {
        if !self.is_api_url(url) {
            return None;
        }
        self.current_token()
    }

    /// True for the base URL itself or a path below it. A lookalike host
    /// such as `<base>.example` or `<base>:8443` does not match.
    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BrokerError> {
        let token = self.token_for(&request.url);
        let request = request
            .with_header("accept", "application/json")
            .with_bearer_token(token.as_deref())
            .with_timeout_ms(self.timeout_ms);

        debug!(method = ?request.method, url = %request.url, "brokerage request");
        Ok(self.http_client.execute(request).await?)
    }

    async fn get_json(&self, url: &str) -> Result<Value, BrokerError> {
        let response = self.send(HttpRequest::get(url)).await?;
        check_status(&response)?;
        parse_body(&response.body)
    }

    /// `results` member of a single page, or null when absent.
    async fn get_results(&self, url: &str) -> Result<Value, BrokerError> {
        Ok(take_results(self.get_json(url).await?))
    }

    async fn get_first(&self, url: &str) -> Result<Value, BrokerError> {
        Ok(match self.get_results(url).await? {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        })
    }

    /// Concatenated `results` of every page reachable through `next` links.
    async fn get_paginated(&self, url: &str) -> Result<Value, BrokerError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_owned());
        let mut pages = 0_usize;

        while let Some(page_url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(BrokerError::new(format!(
                    "pagination exceeded {MAX_PAGES} pages"
                )));
            }

            if let Value::Object(mut page) = self.get_json(&page_url).await? {
                next = page
                    .remove("next")
                    .and_then(|link| link.as_str().map(str::to_owned));
                if let Some(Value::Array(results)) = page.remove("results") {
                    items.extend(results);
                }
            }
        }

        Ok(Value::Array(items))
    }

    async fn instrument_id(&self, symbol: &Symbol) -> Result<String, BrokerError> {
        let url = self.endpoint(&format!(
            "instruments/?symbol={}",
            urlencoding::encode(symbol.as_str())
        ));
        let instrument = self.get_first(&url).await?;
        instrument
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| BrokerError::new(format!("no instrument found for symbol {symbol}")))
    }

    async fn submit_login(&self, request: LoginRequest) -> Result<Value, BrokerError> {
        let mut payload = json!({
            "client_id": CLIENT_ID,
            "expires_in": SESSION_EXPIRES_IN_SECS,
            "grant_type": "password",
            "scope": "internal",
            "username": request.username,
            "password": request.password,
            "device_token": self.device_token,
        });
        if let (Some(code), Some(fields)) = (request.mfa_code.as_ref(), payload.as_object_mut()) {
            fields.insert(String::from("mfa_code"), Value::String(code.clone()));
        }

        let http_request =
            HttpRequest::post(self.endpoint("oauth2/token/")).with_json_body(&payload);
        let response = self.send(http_request).await?;

        let body = match parse_body(&response.body) {
            Ok(body) => body,
            Err(_) if !response.is_success() => {
                return Err(BrokerError::new(format!(
                    "login rejected with status {}",
                    response.status
                )));
            }
            Err(error) => return Err(error),
        };

        if body.get("mfa_required").and_then(Value::as_bool) == Some(true) {
            let mfa_type = body
                .get("mfa_type")
                .and_then(Value::as_str)
                .unwrap_or("app");
            return Err(BrokerError::new(format!(
                "mfa code required (mfa_type: {mfa_type})"
            )));
        }

        if let Some(workflow) = body.get("verification_workflow") {
            let workflow_id = workflow
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(BrokerError::new(format!(
                "device verification required (workflow {workflow_id})"
            )));
        }

        if !response.is_success() {
            let detail = body
                .get("detail")
                .or_else(|| body.get("error_description"))
                .and_then(Value::as_str);
            return Err(BrokerError::new(match detail {
                Some(detail) => detail.to_owned(),
                None => format!("login rejected with status {}", response.status),
            }));
        }

        let Some(token) = body
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_owned)
        else {
            return Ok(Value::Null);
        };

        if request.store_session {
            self.store_token(Some(token));
        }
        Ok(redact_tokens(body))
    }

    async fn revoke_session(&self) -> Result<(), BrokerError> {
        let Some(token) = self.current_token() else {
            return Ok(());
        };
        self.store_token(None);

        let payload = json!({ "client_id": CLIENT_ID, "token": token });
        let request =
            HttpRequest::post(self.endpoint("oauth2/revoke_token/")).with_json_body(&payload);
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(BrokerError::new(format!(
                "token revocation returned status {}",
                response.status
            )));
        }
        Ok(())
    }

    async fn holdings(&self) -> Result<Value, BrokerError> {
        let positions = self
            .get_paginated(&self.endpoint("positions/?nonzero=true"))
            .await?;
        let total_equity = self.total_equity().await?;
        let mut holdings = Map::new();

        for position in positions.as_array().into_iter().flatten() {
            let Some(instrument_url) = position.get("instrument").and_then(Value::as_str) else {
                continue;
            };
            let instrument = self.get_json(instrument_url).await?;
            let Some(symbol) = instrument.get("symbol").and_then(Value::as_str) else {
                continue;
            };
            let quote = self
                .get_json(&self.endpoint(&format!(
                    "marketdata/quotes/{}/",
                    urlencoding::encode(symbol)
                )))
                .await?;
            let fundamentals = self
                .get_first(&self.endpoint(&format!(
                    "fundamentals/?symbols={}",
                    urlencoding::encode(symbol)
                )))
                .await?;

            let price = number_field(&quote, "last_trade_price");
            let quantity = number_field(position, "quantity");
            let average_buy_price = number_field(position, "average_buy_price");
            let equity = quantity * price;
            let percent_change = if average_buy_price > 0.0 {
                (price - average_buy_price) * 100.0 / average_buy_price
            } else {
                0.0
            };
            let equity_change = equity - quantity * average_buy_price;
            let percentage = if total_equity > 0.0 {
                equity * 100.0 / total_equity
            } else {
                0.0
            };
            let name = instrument
                .get("simple_name")
                .filter(|value| !value.is_null())
                .or_else(|| instrument.get("name"))
                .cloned()
                .unwrap_or(Value::Null);

            holdings.insert(
                symbol.to_owned(),
                json!({
                    "price": format!("{price:.2}"),
                    "quantity": position.get("quantity").cloned().unwrap_or(Value::Null),
                    "average_buy_price": format!("{average_buy_price:.2}"),
                    "equity": format!("{equity:.2}"),
                    "percent_change": format!("{percent_change:.2}"),
                    "equity_change": format!("{equity_change:.2}"),
                    "percentage": format!("{percentage:.2}"),
                    "pe_ratio": fundamentals.get("pe_ratio").cloned().unwrap_or(Value::Null),
                    "type": instrument.get("type").cloned().unwrap_or(Value::Null),
                    "name": name,
                    "id": instrument.get("id").cloned().unwrap_or(Value::Null),
                }),
            );
        }

        Ok(Value::Object(holdings))
    }

    /// Portfolio equity, taking extended-hours equity when it is higher.
    async fn total_equity(&self) -> Result<f64, BrokerError> {
        let portfolio = self.get_first(&self.endpoint("portfolios/")).await?;
        let equity = number_field(&portfolio, "equity");
        Ok(equity.max(number_field(&portfolio, "extended_hours_equity")))
    }

    async fn watchlist_items(&self, name: &str) -> Result<Value, BrokerError> {
        let lists = self
            .get_paginated(&self.endpoint("midlands/lists/user_items/"))
            .await?;
        let list_id = lists
            .as_array()
            .into_iter()
            .flatten()
            .find(|list| list.get("display_name").and_then(Value::as_str) == Some(name))
            .and_then(|list| list.get("id").and_then(Value::as_str))
            .ok_or_else(|| BrokerError::new(format!("watchlist '{name}' not found")))?;

        self.get_paginated(&self.endpoint(&format!(
            "midlands/lists/items/?list_id={}",
            urlencoding::encode(list_id)
        )))
        .await
    }

    async fn historicals(
        &self,
        symbol: &Symbol,
        interval: Interval,
        span: Span,
    ) -> Result<Value, BrokerError> {
        let url = self.endpoint(&format!(
            "marketdata/historicals/?symbols={}&interval={interval}&span={span}&bounds=regular",
            urlencoding::encode(symbol.as_str())
        ));
        let Value::Array(series) = self.get_results(&url).await? else {
            return Ok(Value::Null);
        };

        let mut points = Vec::new();
        for entry in series {
            let entry_symbol = entry.get("symbol").cloned().unwrap_or(Value::Null);
            let Some(Value::Array(bars)) = entry.get("historicals").cloned() else {
                continue;
            };
            for mut bar in bars {
                if let Some(fields) = bar.as_object_mut() {
                    fields.insert(String::from("symbol"), entry_symbol.clone());
                }
                points.push(bar);
            }
        }
        Ok(Value::Array(points))
    }

    async fn instruments_by_symbol(&self, symbols: &str) -> Result<Value, BrokerError> {
        let mut found = Vec::new();
        for symbol in symbols.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let url = self.endpoint(&format!(
                "instruments/?symbol={}",
                urlencoding::encode(symbol)
            ));
            let instrument = self.get_first(&url).await?;
            if !instrument.is_null() {
                found.push(instrument);
            }
        }
        Ok(Value::Array(found))
    }
}

impl Brokerage for RobinhoodClient {
    fn login<'a>(&'a self, request: LoginRequest) -> BrokerFuture<'a, Value> {
        Box::pin(self.submit_login(request))
    }

    fn logout<'a>(&'a self) -> BrokerFuture<'a, ()> {
        Box::pin(self.revoke_session())
    }

    fn load_account_profile<'a>(&'a self) -> BrokerFuture<'a, Value> {
        Box::pin(async move { self.get_first(&self.endpoint("accounts/")).await })
    }

    fn load_portfolio_profile<'a>(&'a self) -> BrokerFuture<'a, Value> {
        Box::pin(async move { self.get_first(&self.endpoint("portfolios/")).await })
    }

    fn build_holdings<'a>(&'a self) -> BrokerFuture<'a, Value> {
        Box::pin(self.holdings())
    }

    fn get_watchlist_by_name<'a>(&'a self, name: &'a str) -> BrokerFuture<'a, Value> {
        Box::pin(self.watchlist_items(name))
    }

    fn get_quotes<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "marketdata/quotes/?symbols={}",
                urlencoding::encode(symbol.as_str())
            ));
            Ok(drop_nulls(self.get_results(&url).await?))
        })
    }

    fn get_fundamentals<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "fundamentals/?symbols={}",
                urlencoding::encode(symbol.as_str())
            ));
            Ok(drop_nulls(self.get_results(&url).await?))
        })
    }

    fn get_stock_historicals<'a>(
        &'a self,
        symbol: &'a Symbol,
        interval: Interval,
        span: Span,
    ) -> BrokerFuture<'a, Value> {
        Box::pin(self.historicals(symbol, interval, span))
    }

    fn get_news<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "midlands/news/{}/",
                urlencoding::encode(symbol.as_str())
            ));
            self.get_results(&url).await
        })
    }

    fn get_earnings<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "marketdata/earnings/?symbol={}",
                urlencoding::encode(symbol.as_str())
            ));
            self.get_results(&url).await
        })
    }

    fn get_ratings<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            let instrument_id = self.instrument_id(symbol).await?;
            let url = self.endpoint(&format!("midlands/ratings/{instrument_id}/"));
            self.get_json(&url).await
        })
    }

    fn get_dividends<'a>(&'a self) -> BrokerFuture<'a, Value> {
        Box::pin(async move { self.get_paginated(&self.endpoint("dividends/")).await })
    }

    fn get_open_option_positions<'a>(&'a self) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            self.get_paginated(&self.endpoint("options/positions/?nonzero=True"))
                .await
        })
    }

    fn get_instruments_by_symbols<'a>(&'a self, symbols: &'a str) -> BrokerFuture<'a, Value> {
        Box::pin(self.instruments_by_symbol(symbols))
    }

    fn find_instrument_data<'a>(&'a self, query: &'a str) -> BrokerFuture<'a, Value> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "instruments/?query={}",
                urlencoding::encode(query)
            ));
            self.get_paginated(&url).await
        })
    }
}

fn check_status(response: &HttpResponse) -> Result<(), BrokerError> {
    if response.is_unauthorized() {
        return Err(BrokerError::new(format!(
            "not authenticated (status {})",
            response.status
        )));
    }
    if !response.is_success() {
        return Err(BrokerError::new(format!(
            "upstream returned status {}",
            response.status
        )));
    }
    Ok(())
}

fn parse_body(body: &str) -> Result<Value, BrokerError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

fn take_results(body: Value) -> Value {
    match body {
        Value::Object(mut fields) => fields.remove("results").unwrap_or(Value::Null),
        other => other,
    }
}

fn drop_nulls(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.into_iter().filter(|item| !item.is_null()).collect())
        }
        other => other,
    }
}

fn redact_tokens(body: Value) -> Value {
    match body {
        Value::Object(mut fields) => {
            fields.remove("access_token");
            fields.remove("refresh_token");
            Value::Object(fields)
        }
        other => other,
    }
}

fn number_field(value: &Value, field: &str) -> f64 {
    match value.get(field) {
        Some(Value::String(raw)) => raw.parse().unwrap_or(0.0),
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}
