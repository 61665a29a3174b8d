//! Credential resolution: explicit values first, then the environment.

use std::fmt;
use std::sync::Arc;

use crate::AuthError;

pub const USERNAME_ENV: &str = "ROBINHOOD_USERNAME";
pub const PASSWORD_ENV: &str = "ROBINHOOD_PASSWORD";
pub const TOTP_SECRET_ENV: &str = "ROBINHOOD_TOTP_SECRET";

/// Environment lookup used during resolution. Tests inject a map instead of
/// touching the process environment.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub fn process_env() -> EnvLookup {
    Arc::new(|name: &str| std::env::var(name).ok())
}

/// Values passed explicitly by the caller; any `None` falls back to the
/// environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub totp_secret: Option<String>,
}

impl CredentialOverrides {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            totp_secret: None,
        }
    }

    pub fn with_totp_secret(mut self, secret: impl Into<String>) -> Self {
        self.totp_secret = Some(secret.into());
        self
    }
}

impl fmt::Debug for CredentialOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOverrides")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fully resolved login credentials. Lives only for one login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub totp_secret: Option<String>,
}

impl Credentials {
    /// Resolve each value from `overrides`, then from `env`. Empty strings
    /// count as absent.
    pub fn resolve(overrides: &CredentialOverrides, env: &EnvLookup) -> Result<Self, AuthError> {
        let username = pick(overrides.username.as_deref(), env, USERNAME_ENV);
        let password = pick(overrides.password.as_deref(), env, PASSWORD_ENV);
        let totp_secret = resolve_totp_secret(overrides, env);

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self {
                username,
                password,
                totp_secret,
            }),
            _ => Err(AuthError::new(format!(
                "{USERNAME_ENV} and {PASSWORD_ENV} environment variables required"
            ))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The TOTP secret alone, for callers that only need a code.
pub fn resolve_totp_secret(overrides: &CredentialOverrides, env: &EnvLookup) -> Option<String> {
    pick(overrides.totp_secret.as_deref(), env, TOTP_SECRET_ENV)
}

fn pick(explicit: Option<&str>, env: &EnvLookup, name: &str) -> Option<String> {
    explicit
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| (**env)(name).filter(|value| !value.is_empty()))
}
