//! Minimal HTTP transport used by the brokerage adapter.
//!
//! Requests and responses are plain values so adapters can be exercised
//! against a scripted [`HttpClient`] in tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outgoing call. Header names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_json_body(self, payload: &serde_json::Value) -> Self {
        let mut request = self.with_header("content-type", "application/json");
        request.body = Some(payload.to_string());
        request
    }

    /// Adds `Authorization: Bearer <token>` when a token is given.
    pub fn with_bearer_token(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.with_header("authorization", format!("Bearer {token}")),
            None => self,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// 401 and 403 both mean the session token was missing or rejected.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

/// The request never produced a response (timeout, connect failure, broken
/// body stream).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// reqwest-backed transport identifying itself as `hoodquery/<version>`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        let inner = reqwest::Client::builder()
            .user_agent(concat!("hoodquery/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { inner }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
                timeout_ms,
            } = request;

            let mut builder = match method {
                HttpMethod::Get => self.inner.get(&url),
                HttpMethod::Post => self.inner.post(&url),
            }
            .timeout(Duration::from_millis(timeout_ms));
            for (name, value) in &headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(send_failure)?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|error| HttpError::new(format!("reading response body: {error}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

fn send_failure(error: reqwest::Error) -> HttpError {
    let stage = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    HttpError::new(format!("{stage}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_sets_authorization_only_when_present() {
        let signed = HttpRequest::get("https://example.test/accounts/")
            .with_bearer_token(Some("token-123"));
        let anonymous = HttpRequest::get("https://example.test/accounts/").with_bearer_token(None);

        assert_eq!(
            signed.headers.get("authorization").map(String::as_str),
            Some("Bearer token-123")
        );
        assert!(anonymous.headers.is_empty());
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::post("https://example.test/oauth2/token/")
            .with_json_body(&serde_json::json!({ "grant_type": "password" }));

        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(request.body.as_deref(), Some(r#"{"grant_type":"password"}"#));
    }

    #[test]
    fn header_names_are_lowercased() {
        let request = HttpRequest::get("https://example.test/").with_header("Accept", "x");
        assert_eq!(request.headers.get("accept").map(String::as_str), Some("x"));
        assert_eq!(request.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn unauthorized_covers_401_and_403() {
        assert!(HttpResponse::with_status(401, "").is_unauthorized());
        assert!(HttpResponse::with_status(403, "").is_unauthorized());
        assert!(!HttpResponse::with_status(500, "").is_unauthorized());
        assert!(HttpResponse::with_status(204, "").is_success());
    }
}
