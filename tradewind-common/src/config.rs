//! Backtest and engine configuration.

use rust_decimal::Decimal;

use crate::error::{require, TradingError};
use crate::identifiers::{AccountId, TraderId};
use crate::logging::LogConfig;
use crate::types::Currency;

/// Which execution database back-end to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecDbKind {
    #[default]
    InMemory,
    KeyValue,
}

/// Configuration for a backtest run.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub trader_id: TraderId,
    pub account_id: AccountId,
    pub venue_name: String,
    /// Bounded per-symbol tick cache size.
    pub tick_capacity: usize,
    /// Bounded per-symbol bar cache size (reserved for bar-driven data
    /// clients).
    pub bar_capacity: usize,
    pub exec_db_type: ExecDbKind,
    pub starting_capital: Decimal,
    pub account_currency: Currency,
    pub commission_rate_bp: Decimal,
    /// Annualized short-term interest rate for rollover accrual.
    pub short_term_interest_rate: Decimal,
    pub frozen_account: bool,
    pub log: LogConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            trader_id: TraderId::from("BACKTESTER-000"),
            account_id: AccountId::from("SIM-000"),
            venue_name: "SIM".to_string(),
            tick_capacity: 1_000,
            bar_capacity: 1_000,
            exec_db_type: ExecDbKind::InMemory,
            starting_capital: Decimal::from(1_000_000),
            account_currency: Currency::Usd,
            commission_rate_bp: Decimal::ZERO,
            short_term_interest_rate: Decimal::ZERO,
            frozen_account: false,
            log: LogConfig::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), TradingError> {
        require(self.tick_capacity > 0, "tick_capacity must be positive")?;
        require(self.bar_capacity > 0, "bar_capacity must be positive")?;
        require(
            self.starting_capital > Decimal::ZERO,
            "starting_capital must be positive",
        )?;
        require(
            self.commission_rate_bp >= Decimal::ZERO,
            "commission_rate_bp cannot be negative",
        )?;
        require(!self.venue_name.is_empty(), "venue_name cannot be empty")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_config_is_valid() {
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_tick_capacity_is_rejected() {
        let config = BacktestConfig {
            tick_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_commission_is_rejected() {
        let config = BacktestConfig {
            commission_rate_bp: dec!(-1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_capital_is_rejected() {
        let config = BacktestConfig {
            starting_capital: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
