use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use hoodquery_core::{
    generate_totp_code, process_env, resolve_totp_secret, CredentialOverrides, TOTP_SECRET_ENV,
    TOTP_STEP_SECS,
};

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct TotpResponseData {
    code: String,
    valid_for_secs: u64,
}

pub fn run(overrides: &CredentialOverrides) -> Result<Value, CliError> {
    let secret = resolve_totp_secret(overrides, &process_env());
    let Some(code) = generate_totp_code(secret.as_deref())? else {
        return Err(CliError::Command(format!(
            "no TOTP secret configured; pass --totp-secret or set {TOTP_SECRET_ENV}"
        )));
    };

    let now = OffsetDateTime::now_utc().unix_timestamp().max(0).unsigned_abs();
    Ok(serde_json::to_value(TotpResponseData {
        code,
        valid_for_secs: seconds_left_in_step(now),
    })?)
}

fn seconds_left_in_step(unix_secs: u64) -> u64 {
    TOTP_STEP_SECS - unix_secs % TOTP_STEP_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_validity_counts_down_within_a_step() {
        assert_eq!(seconds_left_in_step(0), 30);
        assert_eq!(seconds_left_in_step(29), 1);
        assert_eq!(seconds_left_in_step(59), 1);
        assert_eq!(seconds_left_in_step(60), 30);
    }

    #[test]
    fn explicit_secret_yields_a_code() {
        let overrides =
            CredentialOverrides::default().with_totp_secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
        let data = run(&overrides).expect("code should be generated");
        let code = data["code"].as_str().expect("code is a string");
        assert_eq!(code.len(), 6);
    }
}
