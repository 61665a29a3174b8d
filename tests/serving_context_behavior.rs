//! Behavior tests for the long-lived serving context.
//!
//! `SessionContext` logs in on first use and remembers the outcome; these
//! tests check that memo and the messages callers see when the session is
//! unusable.

mod support;

use std::sync::Arc;

use hoodquery_core::{
    CredentialOverrides, RobinhoodClient, SessionContext, Tool, ToolCall, PASSWORD_ENV,
    SESSION_EXPIRED_MESSAGE, USERNAME_ENV,
};
use serde_json::json;

use support::{empty_env, env_from, FakeBroker, ScriptedHttpClient};

fn logged_in_broker() -> FakeBroker {
    FakeBroker::new()
        .respond("login", json!({ "token_type": "Bearer" }))
        .respond("load_account_profile", json!({ "account_number": "5QR" }))
}

fn context_for(broker: &Arc<FakeBroker>) -> SessionContext {
    SessionContext::new(broker.clone())
        .with_env_lookup(env_from(&[(USERNAME_ENV, "u"), (PASSWORD_ENV, "p")]))
}

// =============================================================================
// Login memo
// =============================================================================

#[tokio::test]
async fn login_happens_once_across_many_calls() {
    // Given: A fresh context over a working brokerage
    let broker = logged_in_broker()
        .respond("load_portfolio_profile", json!({ "equity": "10.00" }))
        .shared();
    let mut context = context_for(&broker);
    assert!(!context.login_attempted());

    // When: Three operations run back to back
    for _ in 0..3 {
        context
            .invoke(&ToolCall::GetPortfolio)
            .await
            .expect("portfolio should load");
    }

    // Then: Exactly one login went out, and every call probed the session
    assert!(context.login_attempted());
    assert_eq!(broker.logins().len(), 1);
    assert_eq!(broker.calls_to("load_account_profile").len(), 3);
    assert_eq!(broker.calls_to("load_portfolio_profile").len(), 3);
}

#[tokio::test]
async fn a_failed_login_is_remembered_and_never_retried() {
    // Given: No credentials anywhere
    let broker = logged_in_broker().shared();
    let mut context = SessionContext::new(broker.clone()).with_env_lookup(empty_env());

    // When: Two operations are attempted
    let first = context
        .invoke(&ToolCall::GetDividends)
        .await
        .expect_err("login should fail");
    let second = context
        .invoke(&ToolCall::GetDividends)
        .await
        .expect_err("failure should be memoized");

    // Then: Both report the original reason and nothing reached the brokerage
    assert!(first.message().starts_with("Not logged in: "));
    assert!(first.message().contains(USERNAME_ENV));
    assert_eq!(first, second);
    assert!(broker.calls().is_empty());
}

#[tokio::test]
async fn an_expired_session_asks_for_a_restart() {
    // Given: Login succeeds but the account probe comes back empty
    let broker = FakeBroker::new()
        .respond("login", json!({ "token_type": "Bearer" }))
        .shared();
    let mut context = context_for(&broker);

    // When: An operation runs
    let err = context
        .invoke(&ToolCall::GetPositions)
        .await
        .expect_err("dead session");

    // Then: The caller is told to restart and the operation never ran
    assert_eq!(err.message(), SESSION_EXPIRED_MESSAGE);
    assert!(broker.calls_to("build_holdings").is_empty());
}

#[tokio::test]
async fn explicit_credentials_reach_the_login_request() {
    let broker = logged_in_broker().shared();
    let mut context = SessionContext::new(broker.clone())
        .with_env_lookup(empty_env())
        .with_credentials(CredentialOverrides::new("cli-user", "cli-pass"));

    context.ensure_ready().await.expect("ready");

    assert_eq!(broker.logins()[0].username, "cli-user");
}

// =============================================================================
// Operation dispatch
// =============================================================================

#[tokio::test]
async fn invoke_runs_the_named_operation_with_its_arguments() {
    let broker = logged_in_broker()
        .respond("get_news", json!([{ "title": "Earnings beat" }]))
        .shared();
    let mut context = context_for(&broker);

    let call = ToolCall::GetNews {
        symbol: String::from("msft"),
    };
    let news = context.invoke(&call).await.expect("news");

    assert_eq!(call.tool(), Tool::GetNews);
    assert_eq!(news, json!([{ "title": "Earnings beat" }]));
    assert_eq!(broker.calls_to("get_news")[0].args, vec![String::from("MSFT")]);
}

#[tokio::test]
async fn validation_errors_pass_through_invoke_unchanged() {
    let broker = logged_in_broker().shared();
    let mut context = context_for(&broker);

    let err = context
        .invoke(&ToolCall::GetHistoricals {
            symbol: String::from("AAPL"),
            interval: String::from("minute"),
            span: String::from("day"),
        })
        .await
        .expect_err("bad interval");

    assert!(err.message().starts_with("Invalid interval. Must be one of:"));
}

#[test]
fn every_tool_is_read_only_and_documented() {
    for tool in Tool::ALL {
        assert!(
            tool.name().starts_with("robinhood_get_")
                || tool.name() == "robinhood_search_symbols"
        );
        assert!(!tool.description().is_empty());
    }
}

// =============================================================================
// End to end over the REST client
// =============================================================================

#[tokio::test]
async fn quote_lookup_over_http_authenticates_then_fetches() {
    // Given: A scripted Robinhood API
    let http = Arc::new(
        ScriptedHttpClient::default()
            .route(
                "oauth2/token/",
                json!({ "access_token": "secret-token", "token_type": "Bearer", "expires_in": 86400 }),
            )
            .route("accounts/", json!({ "results": [{ "account_number": "5QR" }] }))
            .route(
                "marketdata/quotes/?symbols=AAPL",
                json!({ "results": [{ "symbol": "AAPL", "last_trade_price": "190.10" }] }),
            ),
    );
    let client = RobinhoodClient::with_http_client(http.clone()).with_base_url("https://api.test");
    let mut context = SessionContext::new(Arc::new(client))
        .with_env_lookup(env_from(&[(USERNAME_ENV, "u"), (PASSWORD_ENV, "p")]));

    // When: The caller asks for a quote
    let quote = context
        .invoke(&ToolCall::GetQuote {
            symbol: String::from("aapl"),
        })
        .await
        .expect("quote over http");

    // Then: Login, probe and quote went out in order with the bearer token
    assert_eq!(quote["last_trade_price"], "190.10");

    let requests = http.recorded_requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].url.ends_with("/oauth2/token/"));
    assert!(requests[1].url.ends_with("/accounts/"));
    assert!(requests[2].url.contains("marketdata/quotes/?symbols=AAPL"));
    for request in &requests[1..] {
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer secret-token")
        );
    }
}

#[tokio::test]
async fn rejected_http_login_is_reported_on_every_call() {
    let http = Arc::new(ScriptedHttpClient::default().route_status("oauth2/token/", 401));
    let client = RobinhoodClient::with_http_client(http.clone()).with_base_url("https://api.test");
    let mut context = SessionContext::new(Arc::new(client))
        .with_env_lookup(env_from(&[(USERNAME_ENV, "u"), (PASSWORD_ENV, "p")]));

    let err = context
        .invoke(&ToolCall::GetPortfolio)
        .await
        .expect_err("login rejected");
    context
        .invoke(&ToolCall::GetPortfolio)
        .await
        .expect_err("still rejected");

    assert_eq!(
        err.message(),
        "Not logged in: Login failed: login rejected with status 401"
    );
    assert_eq!(http.recorded_requests().len(), 1);
}
