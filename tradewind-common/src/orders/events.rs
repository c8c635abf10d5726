//! Order lifecycle events.
//!
//! Each state change is represented by an event struct; `OrderEventAny` is
//! the tagged union routed through the execution engine. Event identifiers
//! and timestamps are supplied by the caller so that replays are
//! reproducible.
//!
//! Fill events carry the quantity and price of *that* execution
//! (`filled_quantity`, `average_price`); the order accumulates them into its
//! own cumulative totals when the event is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{OrderSide, OrderType, TimeInForce};
use crate::identifiers::{
    AccountId, ExecutionId, OrderId, OrderIdBroker, PositionIdBroker, Symbol,
};
use crate::types::{Currency, Price, Quantity};

/// The order failed pre-submission validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInvalid {
    pub order_id: OrderId,
    pub reason: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The order was denied by a pre-trade risk check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDenied {
    pub order_id: OrderId,
    pub reason: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The order was submitted to the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub submitted_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The venue acknowledged the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub accepted_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The venue rejected the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub rejected_time: DateTime<Utc>,
    pub reason: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The order is resting on the venue, eligible to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWorking {
    pub order_id: OrderId,
    pub order_id_broker: OrderIdBroker,
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Price,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<DateTime<Utc>>,
    pub working_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The venue applied a modification to a working order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderModified {
    pub order_id: OrderId,
    pub order_id_broker: OrderIdBroker,
    pub account_id: AccountId,
    pub modified_quantity: Quantity,
    pub modified_price: Price,
    pub modified_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The order was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub cancelled_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// A cancel or modify request was refused. Never applied to the order FSM;
/// routed to the owning strategy only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelReject {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub rejected_time: DateTime<Utc>,
    pub response_to: String,
    pub reason: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The order expired on the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpired {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub expired_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Part of the order quantity executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPartiallyFilled {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub execution_id: ExecutionId,
    pub position_id_broker: PositionIdBroker,
    pub symbol: Symbol,
    pub side: OrderSide,
    /// Quantity of this execution.
    pub filled_quantity: Quantity,
    /// Quantity still working after this execution.
    pub leaves_quantity: Quantity,
    /// Execution price of this fill.
    pub average_price: Price,
    pub quote_currency: Currency,
    pub execution_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The order executed completely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub execution_id: ExecutionId,
    pub position_id_broker: PositionIdBroker,
    pub symbol: Symbol,
    pub side: OrderSide,
    /// Quantity of this execution.
    pub filled_quantity: Quantity,
    /// Execution price of this fill.
    pub average_price: Price,
    pub quote_currency: Currency,
    pub execution_time: DateTime<Utc>,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Tagged union over all order events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEventAny {
    Invalid(OrderInvalid),
    Denied(OrderDenied),
    Submitted(OrderSubmitted),
    Accepted(OrderAccepted),
    Rejected(OrderRejected),
    Working(OrderWorking),
    Modified(OrderModified),
    Cancelled(OrderCancelled),
    CancelReject(OrderCancelReject),
    Expired(OrderExpired),
    PartiallyFilled(OrderPartiallyFilled),
    Filled(OrderFilled),
}

/// A borrowed view over the two fill event kinds, used by position
/// aggregation.
#[derive(Debug, Clone, Copy)]
pub struct FillView<'a> {
    pub order_id: &'a OrderId,
    pub execution_id: &'a ExecutionId,
    pub position_id_broker: &'a PositionIdBroker,
    pub symbol: &'a Symbol,
    pub side: OrderSide,
    pub quantity: Quantity,
    pub price: Price,
    pub quote_currency: Currency,
    pub execution_time: DateTime<Utc>,
}

impl OrderEventAny {
    pub fn order_id(&self) -> &OrderId {
        match self {
            OrderEventAny::Invalid(e) => &e.order_id,
            OrderEventAny::Denied(e) => &e.order_id,
            OrderEventAny::Submitted(e) => &e.order_id,
            OrderEventAny::Accepted(e) => &e.order_id,
            OrderEventAny::Rejected(e) => &e.order_id,
            OrderEventAny::Working(e) => &e.order_id,
            OrderEventAny::Modified(e) => &e.order_id,
            OrderEventAny::Cancelled(e) => &e.order_id,
            OrderEventAny::CancelReject(e) => &e.order_id,
            OrderEventAny::Expired(e) => &e.order_id,
            OrderEventAny::PartiallyFilled(e) => &e.order_id,
            OrderEventAny::Filled(e) => &e.order_id,
        }
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            OrderEventAny::Invalid(e) => e.id,
            OrderEventAny::Denied(e) => e.id,
            OrderEventAny::Submitted(e) => e.id,
            OrderEventAny::Accepted(e) => e.id,
            OrderEventAny::Rejected(e) => e.id,
            OrderEventAny::Working(e) => e.id,
            OrderEventAny::Modified(e) => e.id,
            OrderEventAny::Cancelled(e) => e.id,
            OrderEventAny::CancelReject(e) => e.id,
            OrderEventAny::Expired(e) => e.id,
            OrderEventAny::PartiallyFilled(e) => e.id,
            OrderEventAny::Filled(e) => e.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OrderEventAny::Invalid(e) => e.timestamp,
            OrderEventAny::Denied(e) => e.timestamp,
            OrderEventAny::Submitted(e) => e.timestamp,
            OrderEventAny::Accepted(e) => e.timestamp,
            OrderEventAny::Rejected(e) => e.timestamp,
            OrderEventAny::Working(e) => e.timestamp,
            OrderEventAny::Modified(e) => e.timestamp,
            OrderEventAny::Cancelled(e) => e.timestamp,
            OrderEventAny::CancelReject(e) => e.timestamp,
            OrderEventAny::Expired(e) => e.timestamp,
            OrderEventAny::PartiallyFilled(e) => e.timestamp,
            OrderEventAny::Filled(e) => e.timestamp,
        }
    }

    /// Name used as the `Type` label on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            OrderEventAny::Invalid(_) => "OrderInvalid",
            OrderEventAny::Denied(_) => "OrderDenied",
            OrderEventAny::Submitted(_) => "OrderSubmitted",
            OrderEventAny::Accepted(_) => "OrderAccepted",
            OrderEventAny::Rejected(_) => "OrderRejected",
            OrderEventAny::Working(_) => "OrderWorking",
            OrderEventAny::Modified(_) => "OrderModified",
            OrderEventAny::Cancelled(_) => "OrderCancelled",
            OrderEventAny::CancelReject(_) => "OrderCancelReject",
            OrderEventAny::Expired(_) => "OrderExpired",
            OrderEventAny::PartiallyFilled(_) => "OrderPartiallyFilled",
            OrderEventAny::Filled(_) => "OrderFilled",
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(
            self,
            OrderEventAny::PartiallyFilled(_) | OrderEventAny::Filled(_)
        )
    }

    /// Uniform view over `Filled` and `PartiallyFilled`.
    pub fn as_fill(&self) -> Option<FillView<'_>> {
        match self {
            OrderEventAny::Filled(e) => Some(FillView {
                order_id: &e.order_id,
                execution_id: &e.execution_id,
                position_id_broker: &e.position_id_broker,
                symbol: &e.symbol,
                side: e.side,
                quantity: e.filled_quantity,
                price: e.average_price,
                quote_currency: e.quote_currency,
                execution_time: e.execution_time,
            }),
            OrderEventAny::PartiallyFilled(e) => Some(FillView {
                order_id: &e.order_id,
                execution_id: &e.execution_id,
                position_id_broker: &e.position_id_broker,
                symbol: &e.symbol,
                side: e.side,
                quantity: e.filled_quantity,
                price: e.average_price,
                quote_currency: e.quote_currency,
                execution_time: e.execution_time,
            }),
            _ => None,
        }
    }
}

impl From<OrderInvalid> for OrderEventAny {
    fn from(e: OrderInvalid) -> Self {
        OrderEventAny::Invalid(e)
    }
}

impl From<OrderDenied> for OrderEventAny {
    fn from(e: OrderDenied) -> Self {
        OrderEventAny::Denied(e)
    }
}

impl From<OrderSubmitted> for OrderEventAny {
    fn from(e: OrderSubmitted) -> Self {
        OrderEventAny::Submitted(e)
    }
}

impl From<OrderAccepted> for OrderEventAny {
    fn from(e: OrderAccepted) -> Self {
        OrderEventAny::Accepted(e)
    }
}

impl From<OrderRejected> for OrderEventAny {
    fn from(e: OrderRejected) -> Self {
        OrderEventAny::Rejected(e)
    }
}

impl From<OrderWorking> for OrderEventAny {
    fn from(e: OrderWorking) -> Self {
        OrderEventAny::Working(e)
    }
}

impl From<OrderModified> for OrderEventAny {
    fn from(e: OrderModified) -> Self {
        OrderEventAny::Modified(e)
    }
}

impl From<OrderCancelled> for OrderEventAny {
    fn from(e: OrderCancelled) -> Self {
        OrderEventAny::Cancelled(e)
    }
}

impl From<OrderCancelReject> for OrderEventAny {
    fn from(e: OrderCancelReject) -> Self {
        OrderEventAny::CancelReject(e)
    }
}

impl From<OrderExpired> for OrderEventAny {
    fn from(e: OrderExpired) -> Self {
        OrderEventAny::Expired(e)
    }
}

impl From<OrderPartiallyFilled> for OrderEventAny {
    fn from(e: OrderPartiallyFilled) -> Self {
        OrderEventAny::PartiallyFilled(e)
    }
}

impl From<OrderFilled> for OrderEventAny {
    fn from(e: OrderFilled) -> Self {
        OrderEventAny::Filled(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn unix_epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn filled_event() -> OrderFilled {
        OrderFilled {
            order_id: OrderId::from("O-1"),
            account_id: AccountId::from("FXCM-123456"),
            execution_id: ExecutionId::from("E-1"),
            position_id_broker: PositionIdBroker::from("ET-1"),
            symbol: Symbol::new("AUDUSD", "FXCM").unwrap(),
            side: OrderSide::Buy,
            filled_quantity: Quantity::from_units(100_000),
            average_price: Price::new(dec!(1.00001), 5).unwrap(),
            quote_currency: Currency::Usd,
            execution_time: unix_epoch(),
            id: Uuid::from_u128(1),
            timestamp: unix_epoch(),
        }
    }

    #[test]
    fn fill_view_unifies_fill_kinds() {
        let event: OrderEventAny = filled_event().into();
        assert!(event.is_fill());
        let fill = event.as_fill().unwrap();
        assert_eq!(fill.order_id.as_str(), "O-1");
        assert_eq!(fill.quantity, Quantity::from_units(100_000));
        assert_eq!(fill.price.as_decimal(), dec!(1.00001));
    }

    #[test]
    fn non_fill_events_have_no_fill_view() {
        let event: OrderEventAny = OrderSubmitted {
            order_id: OrderId::from("O-1"),
            account_id: AccountId::from("FXCM-123456"),
            submitted_time: unix_epoch(),
            id: Uuid::from_u128(2),
            timestamp: unix_epoch(),
        }
        .into();
        assert!(!event.is_fill());
        assert!(event.as_fill().is_none());
        assert_eq!(event.type_name(), "OrderSubmitted");
        assert_eq!(event.order_id().as_str(), "O-1");
    }
}
