//! Account state, folded from account state events.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::events::AccountStateEvent;
use crate::error::{require, TradingError};
use crate::identifiers::AccountId;
use crate::types::{Currency, Money};

/// A brokerage account: identity, currency, cash and margin state, with an
/// event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    currency: Currency,
    cash_balance: Money,
    cash_start_day: Money,
    cash_activity_day: Money,
    margin_used_liquidation: Money,
    margin_used_maintenance: Money,
    margin_ratio: Decimal,
    margin_call_status: String,
    last_updated: DateTime<Utc>,
    events: Vec<AccountStateEvent>,
}

impl Account {
    /// Build an account from its first state event.
    pub fn new(event: AccountStateEvent) -> Self {
        Self {
            id: event.account_id.clone(),
            currency: event.currency,
            cash_balance: event.cash_balance,
            cash_start_day: event.cash_start_day,
            cash_activity_day: event.cash_activity_day,
            margin_used_liquidation: event.margin_used_liquidation,
            margin_used_maintenance: event.margin_used_maintenance,
            margin_ratio: event.margin_ratio,
            margin_call_status: event.margin_call_status.clone(),
            last_updated: event.timestamp,
            events: vec![event],
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn cash_balance(&self) -> Money {
        self.cash_balance
    }

    pub fn cash_start_day(&self) -> Money {
        self.cash_start_day
    }

    pub fn cash_activity_day(&self) -> Money {
        self.cash_activity_day
    }

    pub fn margin_used_liquidation(&self) -> Money {
        self.margin_used_liquidation
    }

    pub fn margin_used_maintenance(&self) -> Money {
        self.margin_used_maintenance
    }

    pub fn margin_ratio(&self) -> Decimal {
        self.margin_ratio
    }

    pub fn margin_call_status(&self) -> &str {
        &self.margin_call_status
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn events(&self) -> &[AccountStateEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Cash not committed to margin.
    pub fn free_equity(&self) -> Money {
        let used = self.margin_used_liquidation.amount() + self.margin_used_maintenance.amount();
        Money::new(self.cash_balance.amount() - used, self.currency)
    }

    /// Fold a subsequent state event into the account.
    ///
    /// The event must carry this account's id and currency.
    pub fn apply(&mut self, event: AccountStateEvent) -> Result<(), TradingError> {
        require(
            event.account_id == self.id,
            "the account state event id does not match the account",
        )?;
        require(
            event.currency == self.currency,
            "the account state event currency does not match the account",
        )?;
        self.cash_balance = event.cash_balance;
        self.cash_start_day = event.cash_start_day;
        self.cash_activity_day = event.cash_activity_day;
        self.margin_used_liquidation = event.margin_used_liquidation;
        self.margin_used_maintenance = event.margin_used_maintenance;
        self.margin_ratio = event.margin_ratio;
        self.margin_call_status = event.margin_call_status.clone();
        self.last_updated = event.timestamp;
        self.events.push(event);
        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({} {})", self.id, self.cash_balance)
    }
}
