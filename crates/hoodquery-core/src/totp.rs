//! RFC 6238 time-based one-time codes for the brokerage second factor.

use data_encoding::{Encoding, Specification};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;
use time::OffsetDateTime;

use crate::AuthError;

type HmacSha1 = Hmac<Sha1>;

pub const TOTP_DIGITS: u32 = 6;
pub const TOTP_STEP_SECS: u64 = 30;

/// Reasons a secret cannot produce a code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TotpError {
    #[error("secret is not valid base32: {0}")]
    InvalidSecret(String),
    #[error("secret decodes to an empty key")]
    EmptyKey,
    #[error("system clock is before the unix epoch")]
    ClockBeforeEpoch,
}

/// Current code for `secret`, or `None` when no secret is configured.
pub fn generate_totp_code(secret: Option<&str>) -> Result<Option<String>, AuthError> {
    let Some(secret) = secret.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let now = u64::try_from(OffsetDateTime::now_utc().unix_timestamp())
        .map_err(|_| TotpError::ClockBeforeEpoch)
        .map_err(totp_failure)?;

    totp_at(secret, now).map(Some).map_err(totp_failure)
}

/// Code for `secret` at the given unix time.
pub fn totp_at(secret: &str, unix_secs: u64) -> Result<String, TotpError> {
    let key = decode_secret(secret)?;
    hotp(&key, unix_secs / TOTP_STEP_SECS, TOTP_DIGITS)
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let normalized = secret
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    let normalized = normalized.trim_end_matches('=');

    let key = base32_alphabet()?
        .decode(normalized.as_bytes())
        .map_err(|error| TotpError::InvalidSecret(error.to_string()))?;
    if key.is_empty() {
        return Err(TotpError::EmptyKey);
    }
    Ok(key)
}

/// RFC 4648 base32 without padding. Bits left over after the last full byte
/// are ignored, as authenticator apps do.
fn base32_alphabet() -> Result<Encoding, TotpError> {
    let mut spec = Specification::new();
    spec.symbols.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567");
    spec.check_trailing_bits = false;
    spec.encoding().map_err(|error| TotpError::InvalidSecret(error.to_string()))
}

fn hotp(key: &[u8], counter: u64, digits: u32) -> Result<String, TotpError> {
    let mut mac =
        HmacSha1::new_from_slice(key).map_err(|error| TotpError::InvalidSecret(error.to_string()))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation, RFC 4226 section 5.3.
    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let binary = (u32::from(digest[offset]) & 0x7f) << 24
        | u32::from(digest[offset + 1]) << 16
        | u32::from(digest[offset + 2]) << 8
        | u32::from(digest[offset + 3]);

    let code = binary % 10_u32.pow(digits);
    Ok(format!("{code:0width$}", width = digits as usize))
}

fn totp_failure(error: TotpError) -> AuthError {
    AuthError::new(format!("Failed to generate TOTP code: {error}"))
}
