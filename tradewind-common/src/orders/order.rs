//! The order entity and its state machine.
//!
//! An order's identifying attributes are fixed at construction; everything
//! else changes only through [`Order::apply`], which drives the finite state
//! machine, appends to the order's event log and updates the mutable fields
//! according to the event's semantics.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::OrderEventAny;
use super::types::{OrderSide, OrderStatus, OrderType, TimeInForce};
use crate::error::{require, TradingError};
use crate::identifiers::{AccountId, ExecutionId, OrderId, OrderIdBroker, PositionIdBroker, Symbol};
use crate::types::{Price, Quantity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    // Identifying attributes, immutable after construction.
    id: OrderId,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    quantity: Quantity,
    time_in_force: TimeInForce,
    price: Option<Price>,
    expire_time: Option<DateTime<Utc>>,
    init_id: Uuid,
    timestamp: DateTime<Utc>,

    // Execution state, driven by applied events.
    status: OrderStatus,
    id_broker: Option<OrderIdBroker>,
    account_id: Option<AccountId>,
    position_id_broker: Option<PositionIdBroker>,
    execution_id: Option<ExecutionId>,
    filled_quantity: Quantity,
    filled_timestamp: Option<DateTime<Utc>>,
    average_price: Option<Price>,
    slippage: Decimal,
    events: Vec<OrderEventAny>,
}

impl Order {
    /// Create a new order in the `Initialized` state.
    ///
    /// Fails with `InvalidArgument` when the order invariants are violated:
    /// non-positive quantity, a market order carrying a price or a GTC/GTD
    /// time-in-force, a passive order without a price, or an expire time
    /// present without GTD (and vice versa).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        symbol: Symbol,
        side: OrderSide,
        order_type: OrderType,
        quantity: Quantity,
        time_in_force: TimeInForce,
        price: Option<Price>,
        expire_time: Option<DateTime<Utc>>,
        init_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, TradingError> {
        require(!quantity.is_zero(), "the order quantity must be positive")?;
        match order_type {
            OrderType::Market => {
                require(price.is_none(), "a MARKET order cannot have a price")?;
                require(
                    matches!(
                        time_in_force,
                        TimeInForce::Day | TimeInForce::Ioc | TimeInForce::Foc
                    ),
                    "a MARKET order requires a DAY, IOC or FOC time in force",
                )?;
            }
            OrderType::Limit | OrderType::Stop => {
                require(price.is_some(), "a passive order requires a price")?;
            }
        }
        if time_in_force.requires_expire_time() {
            require(expire_time.is_some(), "a GTD order requires an expire time")?;
        } else {
            require(
                expire_time.is_none(),
                "only GTD orders may carry an expire time",
            )?;
        }

        Ok(Self {
            id,
            symbol,
            side,
            order_type,
            quantity,
            time_in_force,
            price,
            expire_time,
            init_id,
            timestamp,
            status: OrderStatus::Initialized,
            id_broker: None,
            account_id: None,
            position_id_broker: None,
            execution_id: None,
            filled_quantity: Quantity::zero(quantity.precision()),
            filled_timestamp: None,
            average_price: None,
            slippage: Decimal::ZERO,
            events: Vec::new(),
        })
    }

    // === Accessors ===

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    pub fn price(&self) -> Option<Price> {
        self.price
    }

    pub fn expire_time(&self) -> Option<DateTime<Utc>> {
        self.expire_time
    }

    pub fn init_id(&self) -> Uuid {
        self.init_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn id_broker(&self) -> Option<&OrderIdBroker> {
        self.id_broker.as_ref()
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    pub fn position_id_broker(&self) -> Option<&PositionIdBroker> {
        self.position_id_broker.as_ref()
    }

    pub fn execution_id(&self) -> Option<&ExecutionId> {
        self.execution_id.as_ref()
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    pub fn filled_timestamp(&self) -> Option<DateTime<Utc>> {
        self.filled_timestamp
    }

    pub fn average_price(&self) -> Option<Price> {
        self.average_price
    }

    pub fn slippage(&self) -> Decimal {
        self.slippage
    }

    pub fn is_working(&self) -> bool {
        self.status.is_working()
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn events(&self) -> &[OrderEventAny] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn last_event(&self) -> Option<&OrderEventAny> {
        self.events.last()
    }

    // === State machine ===

    /// Apply an order event: validate the FSM transition, append the event
    /// to the log, then update the execution state.
    ///
    /// Checks happen before any mutation, so a failed apply leaves the order
    /// untouched. The one idempotent case is a duplicate reject (`Rejected`
    /// while already rejected), accepted as a no-op.
    pub fn apply(&mut self, event: OrderEventAny) -> Result<(), TradingError> {
        if event.order_id() != &self.id {
            return Err(TradingError::InvalidArgument(format!(
                "event order id {} does not match order {}",
                event.order_id(),
                self.id
            )));
        }
        if matches!(event, OrderEventAny::CancelReject(_)) {
            return Err(TradingError::InvalidStateTrigger(format!(
                "OrderCancelReject is not applicable to order {}",
                self.id
            )));
        }
        if self.status == OrderStatus::Rejected && matches!(event, OrderEventAny::Rejected(_)) {
            return Ok(());
        }

        let next = self.next_status(&event)?;

        // Fill bookkeeping is validated up front so nothing mutates on error.
        let mut fill_update = None;
        if let Some(fill) = event.as_fill() {
            let total = self.filled_quantity.as_decimal() + fill.quantity.as_decimal();
            if total > self.quantity.as_decimal() {
                return Err(TradingError::InvalidStateTrigger(format!(
                    "fill of {} would exceed order {} quantity {}",
                    fill.quantity, self.id, self.quantity
                )));
            }
            let average = self.weighted_average(fill.quantity.as_decimal(), fill.price)?;
            fill_update = Some((
                Quantity::new(total, self.filled_quantity.precision())?,
                average,
                fill.execution_id.clone(),
                fill.position_id_broker.clone(),
                fill.execution_time,
            ));
        }

        match &event {
            OrderEventAny::Submitted(e) => {
                self.account_id = Some(e.account_id.clone());
            }
            OrderEventAny::Accepted(e) => {
                self.account_id = Some(e.account_id.clone());
            }
            OrderEventAny::Rejected(e) => {
                self.account_id = Some(e.account_id.clone());
            }
            OrderEventAny::Working(e) => {
                self.id_broker = Some(e.order_id_broker.clone());
            }
            OrderEventAny::Modified(e) => {
                self.id_broker = Some(e.order_id_broker.clone());
                self.quantity = e.modified_quantity;
                self.price = Some(e.modified_price);
            }
            _ => {}
        }

        if let Some((total, average, execution_id, position_id_broker, execution_time)) =
            fill_update
        {
            self.filled_quantity = total;
            self.average_price = Some(average);
            self.execution_id = Some(execution_id);
            self.position_id_broker = Some(position_id_broker);
            self.filled_timestamp = Some(execution_time);
            self.slippage = self.calculate_slippage(average);
        }

        self.status = next;
        self.events.push(event);
        Ok(())
    }

    /// The FSM transition table: `(state, event kind) -> next state`.
    fn next_status(&self, event: &OrderEventAny) -> Result<OrderStatus, TradingError> {
        use OrderEventAny as E;
        use OrderStatus as S;

        let next = match (self.status, event) {
            (S::Initialized, E::Invalid(_)) => S::Invalid,
            (S::Initialized, E::Denied(_)) => S::Denied,
            (S::Initialized, E::Cancelled(_)) => S::Cancelled,
            (S::Initialized, E::Submitted(_)) => S::Submitted,
            (S::Submitted, E::Rejected(_)) => S::Rejected,
            (S::Submitted, E::Accepted(_)) => S::Accepted,
            (S::Submitted, E::Working(_)) => S::Working,
            (S::Submitted, E::Cancelled(_)) => S::Cancelled,
            (S::Accepted, E::Working(_)) => S::Working,
            (S::Accepted, E::Cancelled(_)) => S::Cancelled,
            (S::Accepted, E::PartiallyFilled(_)) => S::PartiallyFilled,
            (S::Accepted, E::Filled(_)) => S::Filled,
            (S::Working, E::Modified(_)) => S::Working,
            (S::Working, E::Cancelled(_)) => S::Cancelled,
            (S::Working, E::Expired(_)) => S::Expired,
            (S::Working, E::PartiallyFilled(_)) => S::PartiallyFilled,
            (S::Working, E::Filled(_)) => S::Filled,
            (S::PartiallyFilled, E::PartiallyFilled(_)) => S::PartiallyFilled,
            (S::PartiallyFilled, E::Filled(_)) => S::Filled,
            (S::PartiallyFilled, E::Cancelled(_)) => S::PartiallyFilled,
            (status, event) => {
                return Err(TradingError::InvalidStateTrigger(format!(
                    "order {} in state {status} cannot apply {}",
                    self.id,
                    event.type_name()
                )))
            }
        };
        Ok(next)
    }

    /// Volume-weighted average price across this order's fills.
    fn weighted_average(&self, lot: Decimal, price: Price) -> Result<Price, TradingError> {
        let average = match self.average_price {
            Some(current) => {
                let filled = self.filled_quantity.as_decimal();
                (current.as_decimal() * filled + price.as_decimal() * lot) / (filled + lot)
            }
            None => price.as_decimal(),
        };
        Price::new(average, price.precision())
    }

    /// Signed slippage versus the order price, at average-price precision.
    /// Positive means a worse fill than requested.
    fn calculate_slippage(&self, average: Price) -> Decimal {
        match self.price {
            Some(price) => {
                let diff = average.as_decimal() - price.as_decimal();
                match self.side {
                    OrderSide::Buy => diff,
                    OrderSide::Sell => -diff,
                }
            }
            None => Decimal::ZERO,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order({} {} {} {} {}",
            self.id, self.side, self.quantity, self.symbol, self.order_type,
        )?;
        if let Some(price) = self.price {
            write!(f, " @ {price}")?;
        }
        write!(f, " {} status={})", self.time_in_force, self.status)
    }
}
