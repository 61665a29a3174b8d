use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use hoodquery_core::{CredentialOverrides, LogoutOutcome, RobinhoodClient, SessionManager, SessionProbe};

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusResponseData {
    logged_in: bool,
    used_totp: bool,
    session: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    revoked: bool,
}

/// Logs in, probes the account endpoint, then revokes the session.
pub async fn run(
    client: RobinhoodClient,
    overrides: &CredentialOverrides,
) -> Result<Value, CliError> {
    let session = SessionManager::new(Arc::new(client));
    let login = session.login(overrides).await?;
    let probe = session.probe().await;
    let logout = session.logout().await;

    Ok(serde_json::to_value(report(login.used_totp, probe, &logout))?)
}

fn report(used_totp: bool, probe: SessionProbe, logout: &LogoutOutcome) -> StatusResponseData {
    let (session, detail) = match probe {
        SessionProbe::Active => ("active", None),
        SessionProbe::Empty => ("empty", None),
        SessionProbe::Failed(reason) => ("failed", Some(reason)),
    };
    StatusResponseData {
        logged_in: session == "active",
        used_totp,
        session,
        detail,
        revoked: *logout == LogoutOutcome::Completed,
    }
}
