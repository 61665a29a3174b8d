//! Shared fakes for behavior tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use hoodquery_core::{
    BrokerError, BrokerFuture, Brokerage, EnvLookup, HttpClient, HttpError, HttpRequest,
    HttpResponse, Interval, LoginRequest, Span, Symbol,
};
use serde_json::Value;

/// One recorded brokerage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub args: Vec<String>,
}

/// Brokerage fake answering each method with a scripted result (null when
/// unscripted) and recording every call.
#[derive(Default)]
pub struct FakeBroker {
    responses: Mutex<HashMap<&'static str, Result<Value, BrokerError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    logins: Mutex<Vec<LoginRequest>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: &'static str, value: Value) -> Self {
        self.responses
            .get_mut()
            .expect("responses should not be poisoned")
            .insert(method, Ok(value));
        self
    }

    pub fn fail(mut self, method: &'static str, message: &str) -> Self {
        self.responses
            .get_mut()
            .expect("responses should not be poisoned")
            .insert(method, Err(BrokerError::new(message)));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    pub fn logins(&self) -> Vec<LoginRequest> {
        self.logins
            .lock()
            .expect("login log should not be poisoned")
            .clone()
    }

    fn answer(&self, method: &'static str, args: Vec<String>) -> BrokerFuture<'_, Value> {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .push(RecordedCall { method, args });
        let result = self
            .responses
            .lock()
            .expect("responses should not be poisoned")
            .get(method)
            .cloned()
            .unwrap_or(Ok(Value::Null));
        Box::pin(async move { result })
    }
}

impl Brokerage for FakeBroker {
    fn login<'a>(&'a self, request: LoginRequest) -> BrokerFuture<'a, Value> {
        self.logins
            .lock()
            .expect("login log should not be poisoned")
            .push(request);
        self.answer("login", Vec::new())
    }

    fn logout<'a>(&'a self) -> BrokerFuture<'a, ()> {
        let answer = self.answer("logout", Vec::new());
        Box::pin(async move { answer.await.map(|_| ()) })
    }

    fn load_account_profile<'a>(&'a self) -> BrokerFuture<'a, Value> {
        self.answer("load_account_profile", Vec::new())
    }

    fn load_portfolio_profile<'a>(&'a self) -> BrokerFuture<'a, Value> {
        self.answer("load_portfolio_profile", Vec::new())
    }

    fn build_holdings<'a>(&'a self) -> BrokerFuture<'a, Value> {
        self.answer("build_holdings", Vec::new())
    }

    fn get_watchlist_by_name<'a>(&'a self, name: &'a str) -> BrokerFuture<'a, Value> {
        self.answer("get_watchlist_by_name", vec![name.to_owned()])
    }

    fn get_quotes<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        self.answer("get_quotes", vec![symbol.to_string()])
    }

    fn get_fundamentals<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        self.answer("get_fundamentals", vec![symbol.to_string()])
    }

    fn get_stock_historicals<'a>(
        &'a self,
        symbol: &'a Symbol,
        interval: Interval,
        span: Span,
    ) -> BrokerFuture<'a, Value> {
        self.answer(
            "get_stock_historicals",
            vec![symbol.to_string(), interval.to_string(), span.to_string()],
        )
    }

    fn get_news<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        self.answer("get_news", vec![symbol.to_string()])
    }

    fn get_earnings<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        self.answer("get_earnings", vec![symbol.to_string()])
    }

    fn get_ratings<'a>(&'a self, symbol: &'a Symbol) -> BrokerFuture<'a, Value> {
        self.answer("get_ratings", vec![symbol.to_string()])
    }

    fn get_dividends<'a>(&'a self) -> BrokerFuture<'a, Value> {
        self.answer("get_dividends", Vec::new())
    }

    fn get_open_option_positions<'a>(&'a self) -> BrokerFuture<'a, Value> {
        self.answer("get_open_option_positions", Vec::new())
    }

    fn get_instruments_by_symbols<'a>(&'a self, symbols: &'a str) -> BrokerFuture<'a, Value> {
        self.answer("get_instruments_by_symbols", vec![symbols.to_owned()])
    }

    fn find_instrument_data<'a>(&'a self, query: &'a str) -> BrokerFuture<'a, Value> {
        self.answer("find_instrument_data", vec![query.to_owned()])
    }
}

/// Environment lookup backed by a fixed set of variables.
pub fn env_from(pairs: &[(&str, &str)]) -> EnvLookup {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect();
    Arc::new(move |name: &str| vars.get(name).cloned())
}

pub fn empty_env() -> EnvLookup {
    env_from(&[])
}

/// HTTP transport answering by URL fragment, 404 otherwise.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Vec<(String, HttpResponse)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn route(mut self, fragment: &str, body: Value) -> Self {
        self.routes
            .push((fragment.to_owned(), HttpResponse::ok_json(body.to_string())));
        self
    }

    pub fn route_status(mut self, fragment: &str, status: u16) -> Self {
        self.routes
            .push((fragment.to_owned(), HttpResponse::with_status(status, "")));
        self
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| HttpResponse::with_status(404, ""));
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        Box::pin(async move { Ok(response) })
    }
}
