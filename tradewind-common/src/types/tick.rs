//! Market data ticks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, Quantity};
use crate::identifiers::Symbol;

/// A top-of-book snapshot for a symbol at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTick {
    pub symbol: Symbol,
    pub bid: Price,
    pub ask: Price,
    pub bid_size: Quantity,
    pub ask_size: Quantity,
    pub timestamp: DateTime<Utc>,
}

impl QuoteTick {
    pub fn new(
        symbol: Symbol,
        bid: Price,
        ask: Price,
        bid_size: Quantity,
        ask_size: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            bid,
            ask,
            bid_size,
            ask_size,
            timestamp,
        }
    }
}

impl fmt::Display for QuoteTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.symbol,
            self.bid,
            self.ask,
            self.timestamp.to_rfc3339()
        )
    }
}
