//! Account events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identifiers::AccountId;
use crate::types::{Currency, Money};

/// A snapshot of account cash and margin state from the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStateEvent {
    pub account_id: AccountId,
    pub currency: Currency,
    pub cash_balance: Money,
    pub cash_start_day: Money,
    pub cash_activity_day: Money,
    pub margin_used_liquidation: Money,
    pub margin_used_maintenance: Money,
    pub margin_ratio: Decimal,
    pub margin_call_status: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl AccountStateEvent {
    /// Name used as the `Type` label on the wire.
    pub fn type_name(&self) -> &'static str {
        "AccountStateEvent"
    }
}
