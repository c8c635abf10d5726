//! Deterministic identifier generation.
//!
//! Identifiers follow the form
//! `<prefix>-<YYYYMMDD>-<HHMMSS>-<trader_tag>-<strategy_tag>-<n>` where `n`
//! is a monotonic per-generator counter. Generators take the current time as
//! an explicit parameter so that identical clocks produce identical ids.

use chrono::{DateTime, Utc};

use super::{OrderId, PositionId};
use crate::error::{require_not_empty, TradingError};

/// Generates identifiers with an embedded timestamp and monotonic counter.
#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    prefix: String,
    trader_tag: String,
    strategy_tag: String,
    count: u64,
}

impl IdentifierGenerator {
    pub fn new(
        prefix: impl Into<String>,
        trader_tag: impl Into<String>,
        strategy_tag: impl Into<String>,
    ) -> Result<Self, TradingError> {
        let prefix = prefix.into();
        let trader_tag = trader_tag.into();
        let strategy_tag = strategy_tag.into();
        require_not_empty(&prefix, "prefix")?;
        require_not_empty(&trader_tag, "trader_tag")?;
        require_not_empty(&strategy_tag, "strategy_tag")?;
        Ok(Self {
            prefix,
            trader_tag,
            strategy_tag,
            count: 0,
        })
    }

    /// Generate the next identifier string at the given time.
    pub fn generate(&mut self, now: DateTime<Utc>) -> String {
        self.count += 1;
        format!(
            "{}-{}-{}-{}-{}-{}",
            self.prefix,
            now.format("%Y%m%d"),
            now.format("%H%M%S"),
            self.trader_tag,
            self.strategy_tag,
            self.count,
        )
    }

    /// The number of identifiers generated so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Reset the counter back to zero.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Generates `OrderId`s with prefix `O`.
#[derive(Debug, Clone)]
pub struct OrderIdGenerator {
    inner: IdentifierGenerator,
}

impl OrderIdGenerator {
    pub fn new(
        trader_tag: impl Into<String>,
        strategy_tag: impl Into<String>,
    ) -> Result<Self, TradingError> {
        Ok(Self {
            inner: IdentifierGenerator::new("O", trader_tag, strategy_tag)?,
        })
    }

    pub fn generate(&mut self, now: DateTime<Utc>) -> OrderId {
        OrderId::from(self.inner.generate(now))
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Generates `PositionId`s with prefix `P`.
#[derive(Debug, Clone)]
pub struct PositionIdGenerator {
    inner: IdentifierGenerator,
}

impl PositionIdGenerator {
    pub fn new(
        trader_tag: impl Into<String>,
        strategy_tag: impl Into<String>,
    ) -> Result<Self, TradingError> {
        Ok(Self {
            inner: IdentifierGenerator::new("P", trader_tag, strategy_tag)?,
        })
    }

    pub fn generate(&mut self, now: DateTime<Utc>) -> PositionId {
        PositionId::from(self.inner.generate(now))
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn unix_epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    #[test]
    fn generates_expected_form() {
        let mut generator = OrderIdGenerator::new("001", "001").unwrap();
        let id = generator.generate(unix_epoch());
        assert_eq!(id.as_str(), "O-19700101-000000-001-001-1");
    }

    #[test]
    fn counter_is_monotonic() {
        let mut generator = OrderIdGenerator::new("001", "001").unwrap();
        let first = generator.generate(unix_epoch());
        let second = generator.generate(unix_epoch());
        assert!(first.as_str().ends_with("-1"));
        assert!(second.as_str().ends_with("-2"));
        assert_ne!(first, second);
    }

    #[test]
    fn reset_restarts_counter() {
        let mut generator = PositionIdGenerator::new("001", "002").unwrap();
        generator.generate(unix_epoch());
        generator.generate(unix_epoch());
        generator.reset();
        let id = generator.generate(unix_epoch());
        assert_eq!(id.as_str(), "P-19700101-000000-001-002-1");
    }

    #[test]
    fn empty_tag_is_rejected() {
        assert!(IdentifierGenerator::new("O", "", "001").is_err());
    }
}
