mod catalog;
mod status;
mod totp;

use std::sync::Arc;

use hoodquery_core::{CredentialOverrides, LogoutOutcome, RobinhoodClient, SessionContext, ToolCall};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Overrides the brokerage API root, mainly for pointing at a local stub.
pub const BASE_URL_ENV: &str = "HOODQUERY_BASE_URL";

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let call = match &cli.command {
        Command::Tools => return catalog::run(),
        Command::Totp => return totp::run(&overrides(cli)),
        Command::Status => return status::run(build_client(cli), &overrides(cli)).await,
        command => tool_call(command)?,
    };

    let mut context =
        SessionContext::new(Arc::new(build_client(cli))).with_credentials(overrides(cli));
    let result = context.invoke(&call).await;

    if context.login_attempted() {
        if let LogoutOutcome::Failed(reason) = context.session().logout().await {
            debug!(%reason, "session revoke failed");
        }
    }

    Ok(result?)
}

fn tool_call(command: &Command) -> Result<ToolCall, CliError> {
    Ok(match command {
        Command::Portfolio => ToolCall::GetPortfolio,
        Command::Positions => ToolCall::GetPositions,
        Command::Watchlist(args) => ToolCall::GetWatchlist {
            name: Some(args.name.clone()),
        },
        Command::Quote(args) => ToolCall::GetQuote {
            symbol: args.symbol.clone(),
        },
        Command::Fundamentals(args) => ToolCall::GetFundamentals {
            symbol: args.symbol.clone(),
        },
        Command::Historicals(args) => ToolCall::GetHistoricals {
            symbol: args.symbol.clone(),
            interval: args.interval.clone(),
            span: args.span.clone(),
        },
        Command::News(args) => ToolCall::GetNews {
            symbol: args.symbol.clone(),
        },
        Command::Earnings(args) => ToolCall::GetEarnings {
            symbol: args.symbol.clone(),
        },
        Command::Ratings(args) => ToolCall::GetRatings {
            symbol: args.symbol.clone(),
        },
        Command::Dividends => ToolCall::GetDividends,
        Command::OptionsPositions => ToolCall::GetOptionsPositions,
        Command::Search(args) => ToolCall::SearchSymbols {
            query: args.query.clone(),
        },
        Command::Status | Command::Totp | Command::Tools => {
            return Err(CliError::Command(String::from(
                "command does not map to a brokerage operation",
            )))
        }
    })
}

fn build_client(cli: &Cli) -> RobinhoodClient {
    let client = RobinhoodClient::default().with_timeout_ms(cli.timeout_ms);
    match std::env::var(BASE_URL_ENV).ok().filter(|url| !url.trim().is_empty()) {
        Some(base_url) => client.with_base_url(base_url),
        None => client,
    }
}

fn overrides(cli: &Cli) -> CredentialOverrides {
    CredentialOverrides {
        username: cli.username.clone(),
        password: cli.password.clone(),
        totp_secret: cli.totp_secret.clone(),
    }
}
