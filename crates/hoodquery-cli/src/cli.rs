//! CLI argument definitions for hoodquery.
//!
//! Every data command maps onto one read-only brokerage operation. The
//! session is established on first use and revoked when the command ends.
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--username` | `$ROBINHOOD_USERNAME` | Account username |
//! | `--password` | `$ROBINHOOD_PASSWORD` | Account password |
//! | `--totp-secret` | `$ROBINHOOD_TOTP_SECRET` | Base32 authenticator secret |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! hoodquery quote AAPL
//! hoodquery historicals TSLA --interval week --span year --pretty
//! hoodquery search "apple inc"
//! RUST_LOG=hoodquery_core=debug hoodquery positions
//! ```

use clap::{Args, Parser, Subcommand};
use hoodquery_core::{Interval, Span};

/// Read-only Robinhood account queries.
#[derive(Debug, Parser)]
#[command(
    name = "hoodquery",
    author,
    version,
    about = "Read-only Robinhood account queries",
    long_about = "hoodquery logs in to Robinhood (with an automatic TOTP code when a secret \
is configured) and prints portfolio, market and account data as JSON.\n\
\n\
Credentials are read from flags, then from ROBINHOOD_USERNAME, ROBINHOOD_PASSWORD \
and ROBINHOOD_TOTP_SECRET (a .env file in the working directory is loaded first)."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Account username; falls back to ROBINHOOD_USERNAME.
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Account password; falls back to ROBINHOOD_PASSWORD.
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Base32 TOTP secret; falls back to ROBINHOOD_TOTP_SECRET.
    #[arg(long, global = true)]
    pub totp_secret: Option<String>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Portfolio value and performance metrics.
    Portfolio,

    /// Current stock positions keyed by symbol.
    Positions,

    /// Stocks in a watchlist.
    ///
    /// # Examples
    ///
    ///   hoodquery watchlist
    ///   hoodquery watchlist --name "Tech"
    Watchlist(WatchlistArgs),

    /// Real-time quote for a symbol.
    Quote(SymbolArgs),

    /// Fundamental data for a symbol.
    Fundamentals(SymbolArgs),

    /// Historical OHLCV points for a symbol.
    ///
    /// # Examples
    ///
    ///   hoodquery historicals AAPL
    ///   hoodquery historicals AAPL --interval 5minute --span day
    Historicals(HistoricalsArgs),

    /// Recent news articles for a symbol.
    News(SymbolArgs),

    /// Earnings reports for a symbol.
    Earnings(SymbolArgs),

    /// Analyst ratings summary for a symbol.
    Ratings(SymbolArgs),

    /// Dividend payments received.
    Dividends,

    /// Open options positions.
    OptionsPositions,

    /// Search instruments by ticker or company name.
    Search(SearchArgs),

    /// Log in and report whether the session is usable.
    Status,

    /// Print the current one-time code for the configured secret.
    Totp,

    /// List the named operations and their descriptions.
    Tools,
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    /// Ticker symbol (case-insensitive).
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct WatchlistArgs {
    /// Watchlist name.
    #[arg(long, default_value = hoodquery_core::DEFAULT_WATCHLIST)]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct HistoricalsArgs {
    /// Ticker symbol (case-insensitive).
    pub symbol: String,

    /// Point interval: 5minute, 10minute, hour, day or week.
    #[arg(long, default_value_t = Interval::default().to_string())]
    pub interval: String,

    /// Time span: day, week, month, 3month, year or 5year.
    #[arg(long, default_value_t = Span::default().to_string())]
    pub span: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Ticker or company name.
    pub query: String,
}
