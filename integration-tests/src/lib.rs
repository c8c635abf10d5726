// Shared fixtures for the end-to-end backtest scenarios: scripted
// strategies and database invariant verification.

pub mod strategies;
pub mod verifier;

use chrono::{DateTime, TimeZone, Utc};
use tradewind_common::identifiers::Symbol;
use tradewind_common::types::{Price, Quantity, QuoteTick};

/// The test epoch.
pub fn unix_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).unwrap()
}

/// `unix_epoch() + secs`.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn audusd() -> Symbol {
    Symbol::new("AUDUSD", "FXCM").unwrap()
}

/// A top-of-book tick for AUDUSD at `secs` past the epoch.
pub fn tick(bid: &str, ask: &str, secs: i64) -> QuoteTick {
    QuoteTick::new(
        audusd(),
        Price::parse(bid).unwrap(),
        Price::parse(ask).unwrap(),
        Quantity::from_units(1_000_000),
        Quantity::from_units(1_000_000),
        at(secs),
    )
}
