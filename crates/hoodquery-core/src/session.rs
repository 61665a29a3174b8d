//! Login, logout and session checks against a [`Brokerage`].
//!
//! Every failure collapses into [`AuthError`]; there is no retry and no
//! automatic re-authentication. Logout and the session probe never fail:
//! their outcome is returned as a value ([`LogoutOutcome`], [`SessionProbe`]).

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::broker::{Brokerage, LoginRequest};
use crate::credentials::{process_env, CredentialOverrides, Credentials, EnvLookup};
use crate::totp::generate_totp_code;
use crate::AuthError;

pub const EMPTY_LOGIN_MESSAGE: &str = "Login returned empty result";
pub const TWO_FACTOR_MESSAGE: &str =
    "2FA required but ROBINHOOD_TOTP_SECRET not provided or invalid";

/// Successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    /// Login payload as returned by the brokerage client (tokens stripped).
    pub response: Value,
    /// Whether a one-time code was sent with the login.
    pub used_totp: bool,
}

/// Result of a best-effort logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    Completed,
    /// The upstream call failed; the failure is informational only.
    Failed(String),
}

/// Result of the authenticated probe behind [`SessionManager::is_logged_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionProbe {
    Active,
    /// The probe succeeded but returned nothing.
    Empty,
    Failed(String),
}

impl SessionProbe {
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Clone)]
pub struct SessionManager {
    broker: Arc<dyn Brokerage>,
    env: EnvLookup,
}

impl SessionManager {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self {
            broker,
            env: process_env(),
        }
    }

    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn broker(&self) -> &Arc<dyn Brokerage> {
        &self.broker
    }

    /// Resolves credentials, computes a one-time code when a secret is
    /// available and issues a single login request with session storage on.
    pub async fn login(&self, overrides: &CredentialOverrides) -> Result<LoginSession, AuthError> {
        let Credentials {
            username,
            password,
            totp_secret,
        } = Credentials::resolve(overrides, &self.env)?;

        let mfa_code = generate_totp_code(totp_secret.as_deref())?;
        let used_totp = mfa_code.is_some();
        let request = LoginRequest {
            username,
            password,
            mfa_code,
            store_session: true,
        };

        let response = self
            .broker
            .login(request)
            .await
            .map_err(|error| login_failure(error.message()))?;

        if is_empty_payload(&response) {
            return Err(AuthError::new(EMPTY_LOGIN_MESSAGE));
        }

        Ok(LoginSession {
            response,
            used_totp,
        })
    }

    pub async fn logout(&self) -> LogoutOutcome {
        match self.broker.logout().await {
            Ok(()) => LogoutOutcome::Completed,
            Err(error) => {
                debug!(%error, "logout failed; ignoring");
                LogoutOutcome::Failed(error.message().to_owned())
            }
        }
    }

    pub async fn probe(&self) -> SessionProbe {
        match self.broker.load_account_profile().await {
            Ok(Value::Null) => SessionProbe::Empty,
            Ok(_) => SessionProbe::Active,
            Err(error) => {
                debug!(%error, "session probe failed");
                SessionProbe::Failed(error.message().to_owned())
            }
        }
    }

    /// True only when the account-profile probe returns a non-null result.
    pub async fn is_logged_in(&self) -> bool {
        self.probe().await.is_active()
    }
}

fn login_failure(message: &str) -> AuthError {
    let lowered = message.to_lowercase();
    if lowered.contains("mfa") || lowered.contains("2fa") {
        AuthError::new(TWO_FACTOR_MESSAGE)
    } else {
        AuthError::new(format!("Login failed: {message}"))
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(true) | Value::Number(_) => false,
    }
}
