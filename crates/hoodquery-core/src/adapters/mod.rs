//! Brokerage client implementations.

pub mod robinhood;

pub use robinhood::RobinhoodClient;
