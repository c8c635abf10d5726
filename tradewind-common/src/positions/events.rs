//! Derived position events.
//!
//! The execution engine emits these from the fill→position flow and feeds
//! them back through its own event path so strategies receive them uniformly
//! with order events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::position::MarketPosition;
use crate::identifiers::{PositionId, StrategyId, Symbol};
use crate::orders::OrderSide;
use crate::types::{Money, Quantity};

/// A new position was opened by a first fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpened {
    pub position_id: PositionId,
    pub strategy_id: StrategyId,
    pub symbol: Symbol,
    pub entry_direction: OrderSide,
    pub quantity: Quantity,
    pub average_open_price: Decimal,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// An open position changed size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionModified {
    pub position_id: PositionId,
    pub strategy_id: StrategyId,
    pub symbol: Symbol,
    pub market_position: MarketPosition,
    pub quantity: Quantity,
    pub average_open_price: Decimal,
    pub realized_pnl: Money,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// A position's net quantity returned to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClosed {
    pub position_id: PositionId,
    pub strategy_id: StrategyId,
    pub symbol: Symbol,
    pub realized_points: Decimal,
    pub realized_pnl: Money,
    pub opened_time: DateTime<Utc>,
    pub closed_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Tagged union over position events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PositionEventAny {
    Opened(PositionOpened),
    Modified(PositionModified),
    Closed(PositionClosed),
}

impl PositionEventAny {
    pub fn position_id(&self) -> &PositionId {
        match self {
            PositionEventAny::Opened(e) => &e.position_id,
            PositionEventAny::Modified(e) => &e.position_id,
            PositionEventAny::Closed(e) => &e.position_id,
        }
    }

    pub fn strategy_id(&self) -> &StrategyId {
        match self {
            PositionEventAny::Opened(e) => &e.strategy_id,
            PositionEventAny::Modified(e) => &e.strategy_id,
            PositionEventAny::Closed(e) => &e.strategy_id,
        }
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            PositionEventAny::Opened(e) => e.id,
            PositionEventAny::Modified(e) => e.id,
            PositionEventAny::Closed(e) => e.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PositionEventAny::Opened(e) => e.timestamp,
            PositionEventAny::Modified(e) => e.timestamp,
            PositionEventAny::Closed(e) => e.timestamp,
        }
    }

    /// Name used as the `Type` label on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            PositionEventAny::Opened(_) => "PositionOpened",
            PositionEventAny::Modified(_) => "PositionModified",
            PositionEventAny::Closed(_) => "PositionClosed",
        }
    }
}

impl From<PositionOpened> for PositionEventAny {
    fn from(e: PositionOpened) -> Self {
        PositionEventAny::Opened(e)
    }
}

impl From<PositionModified> for PositionEventAny {
    fn from(e: PositionModified) -> Self {
        PositionEventAny::Modified(e)
    }
}

impl From<PositionClosed> for PositionEventAny {
    fn from(e: PositionClosed) -> Self {
        PositionEventAny::Closed(e)
    }
}
