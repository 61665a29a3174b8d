use thiserror::Error;

/// Session establishment and session-check failures.
///
/// The message is the only differentiator between causes (missing
/// credentials, rejected login, two-factor problems, bad TOTP secret).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Accessor and serving-layer failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure raised by a [`Brokerage`](crate::Brokerage) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BrokerError {
    message: String,
}

impl BrokerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<crate::http_client::HttpError> for BrokerError {
    fn from(error: crate::http_client::HttpError) -> Self {
        Self::new(format!("transport error: {}", error.message()))
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(format!("invalid JSON: {error}"))
    }
}

/// Parameter validation failures raised before any upstream call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Symbol must be a non-empty string")]
    EmptySymbol,
    #[error("Query must be a non-empty string")]
    EmptyQuery,
    #[error("Invalid interval. Must be one of: {allowed}")]
    InvalidInterval { value: String, allowed: String },
    #[error("Invalid span. Must be one of: {allowed}")]
    InvalidSpan { value: String, allowed: String },
}

impl From<ValidationError> for QueryError {
    fn from(error: ValidationError) -> Self {
        Self::new(error.to_string())
    }
}
