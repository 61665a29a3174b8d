//! Validated query parameters.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Trimmed, uppercased ticker symbol |
//! | [`Interval`] | Historicals bar width (`5minute` .. `week`) |
//! | [`Span`] | Historicals lookback window (`day` .. `5year`) |

mod interval;
mod symbol;

pub use interval::{Interval, Span};
pub use symbol::Symbol;
