//! Trading commands routed from strategies through the execution engine to
//! a venue adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identifiers::{AccountId, OrderId, PositionId, StrategyId, TraderId};
use crate::orders::{BracketOrder, Order};
use crate::types::{Price, Quantity};

/// Request the venue's current account state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInquiry {
    pub trader_id: TraderId,
    pub account_id: AccountId,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Submit a single order under a logical position id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub trader_id: TraderId,
    pub account_id: AccountId,
    pub strategy_id: StrategyId,
    pub position_id: PositionId,
    pub order: Order,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Submit a bracket: entry plus OCO children, all under one position id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitBracketOrder {
    pub trader_id: TraderId,
    pub account_id: AccountId,
    pub strategy_id: StrategyId,
    pub position_id: PositionId,
    pub bracket_order: BracketOrder,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Modify a working order's price and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyOrder {
    pub trader_id: TraderId,
    pub account_id: AccountId,
    pub order_id: OrderId,
    pub modified_quantity: Quantity,
    pub modified_price: Price,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Cancel a working order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub trader_id: TraderId,
    pub account_id: AccountId,
    pub order_id: OrderId,
    pub cancel_reason: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Tagged union over trading commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TradingCommand {
    AccountInquiry(AccountInquiry),
    SubmitOrder(SubmitOrder),
    SubmitBracketOrder(SubmitBracketOrder),
    ModifyOrder(ModifyOrder),
    CancelOrder(CancelOrder),
}

impl TradingCommand {
    pub fn id(&self) -> Uuid {
        match self {
            TradingCommand::AccountInquiry(c) => c.id,
            TradingCommand::SubmitOrder(c) => c.id,
            TradingCommand::SubmitBracketOrder(c) => c.id,
            TradingCommand::ModifyOrder(c) => c.id,
            TradingCommand::CancelOrder(c) => c.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TradingCommand::AccountInquiry(c) => c.timestamp,
            TradingCommand::SubmitOrder(c) => c.timestamp,
            TradingCommand::SubmitBracketOrder(c) => c.timestamp,
            TradingCommand::ModifyOrder(c) => c.timestamp,
            TradingCommand::CancelOrder(c) => c.timestamp,
        }
    }

    /// Name used as the `Type` label on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            TradingCommand::AccountInquiry(_) => "AccountInquiry",
            TradingCommand::SubmitOrder(_) => "SubmitOrder",
            TradingCommand::SubmitBracketOrder(_) => "SubmitBracketOrder",
            TradingCommand::ModifyOrder(_) => "ModifyOrder",
            TradingCommand::CancelOrder(_) => "CancelOrder",
        }
    }
}
