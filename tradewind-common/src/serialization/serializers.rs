//! Object serializers over the binary map codec.
//!
//! Orders serialize their identifying attributes (orders cross the wire at
//! submission, before any execution state exists). Commands embed orders as
//! nested map payloads. Events cover the order and account event sets;
//! derived position events and time events never leave the process.

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::keys;
use super::map::ObjectMap;
use super::{format_timestamp, parse_timestamp, NONE};
use crate::accounts::AccountStateEvent;
use crate::error::TradingError;
use crate::events::Event;
use crate::execution::{
    AccountInquiry, CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder, TradingCommand,
};
use crate::identifiers::{
    AccountId, ExecutionId, OrderId, OrderIdBroker, PositionId, PositionIdBroker, StrategyId,
    Symbol, TraderId,
};
use crate::orders::{
    BracketOrder, Order, OrderAccepted, OrderCancelReject, OrderCancelled, OrderDenied,
    OrderEventAny, OrderExpired, OrderFilled, OrderInvalid, OrderModified, OrderPartiallyFilled,
    OrderRejected, OrderSide, OrderSubmitted, OrderType, OrderWorking, TimeInForce,
};
use crate::types::{Currency, Money, Price, Quantity};

fn parse_uuid(value: &str) -> Result<Uuid, TradingError> {
    Uuid::parse_str(value)
        .map_err(|e| TradingError::Serialization(format!("cannot parse uuid '{value}': {e}")))
}

fn parse_decimal(value: &str) -> Result<Decimal, TradingError> {
    Decimal::from_str(value)
        .map_err(|e| TradingError::Serialization(format!("cannot parse decimal '{value}': {e}")))
}

fn parse_price(value: &str) -> Result<Price, TradingError> {
    Price::parse(value).map_err(|e| TradingError::Serialization(e.to_string()))
}

fn parse_quantity(value: &str) -> Result<Quantity, TradingError> {
    Quantity::parse(value).map_err(|e| TradingError::Serialization(e.to_string()))
}

fn parse_currency(value: &str) -> Result<Currency, TradingError> {
    Currency::from_str(value).map_err(|e| TradingError::Serialization(e.to_string()))
}

fn parse_symbol(value: &str) -> Result<Symbol, TradingError> {
    Symbol::parse(value).map_err(|e| TradingError::Serialization(e.to_string()))
}

/// Serializes orders as their identifying attributes.
#[derive(Debug, Clone, Default)]
pub struct OrderSerializer;

impl OrderSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, order: &Order) -> Result<Vec<u8>, TradingError> {
        Ok(self.to_map(order).encode())
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Order, TradingError> {
        self.from_map(&ObjectMap::decode(bytes)?)
    }

    fn to_map(&self, order: &Order) -> ObjectMap {
        let mut map = ObjectMap::new();
        map.put(keys::TYPE, "Order");
        map.put(keys::ID, order.id().as_str());
        map.put(keys::SYMBOL, order.symbol().to_string());
        map.put(keys::ORDER_SIDE, order.side().wire_name());
        map.put(keys::ORDER_TYPE, order.order_type().wire_name());
        map.put(keys::QUANTITY, order.quantity().to_string());
        map.put(
            keys::PRICE,
            order
                .price()
                .map(|p| p.to_string())
                .unwrap_or_else(|| NONE.to_string()),
        );
        map.put(keys::TIME_IN_FORCE, order.time_in_force().to_string());
        map.put(
            keys::EXPIRE_TIME,
            order
                .expire_time()
                .map(format_timestamp)
                .unwrap_or_else(|| NONE.to_string()),
        );
        map.put(keys::INIT_ID, order.init_id().to_string());
        map.put(keys::TIMESTAMP, format_timestamp(order.timestamp()));
        map
    }

    fn from_map(&self, map: &ObjectMap) -> Result<Order, TradingError> {
        let price = match map.get_str(keys::PRICE)? {
            NONE => None,
            value => Some(parse_price(value)?),
        };
        let expire_time = match map.get_str(keys::EXPIRE_TIME)? {
            NONE => None,
            value => Some(parse_timestamp(value)?),
        };
        Order::new(
            OrderId::from(map.get_str(keys::ID)?),
            parse_symbol(map.get_str(keys::SYMBOL)?)?,
            OrderSide::from_wire(map.get_str(keys::ORDER_SIDE)?)?,
            OrderType::from_wire(map.get_str(keys::ORDER_TYPE)?)?,
            parse_quantity(map.get_str(keys::QUANTITY)?)?,
            TimeInForce::from_str(map.get_str(keys::TIME_IN_FORCE)?)
                .map_err(|e| TradingError::Serialization(e.to_string()))?,
            price,
            expire_time,
            parse_uuid(map.get_str(keys::INIT_ID)?)?,
            parse_timestamp(map.get_str(keys::TIMESTAMP)?)?,
        )
        .map_err(|e| TradingError::Serialization(e.to_string()))
    }
}

/// Serializes trading commands.
#[derive(Debug, Clone, Default)]
pub struct CommandSerializer {
    orders: OrderSerializer,
}

impl CommandSerializer {
    pub fn new() -> Self {
        Self {
            orders: OrderSerializer::new(),
        }
    }

    pub fn serialize(&self, command: &TradingCommand) -> Result<Vec<u8>, TradingError> {
        let mut map = ObjectMap::new();
        map.put(keys::TYPE, command.type_name());
        map.put(keys::ID, command.id().to_string());
        map.put(keys::TIMESTAMP, format_timestamp(command.timestamp()));

        match command {
            TradingCommand::AccountInquiry(c) => {
                map.put(keys::TRADER_ID, c.trader_id.as_str());
                map.put(keys::ACCOUNT_ID, c.account_id.as_str());
            }
            TradingCommand::SubmitOrder(c) => {
                map.put(keys::TRADER_ID, c.trader_id.as_str());
                map.put(keys::ACCOUNT_ID, c.account_id.as_str());
                map.put(keys::STRATEGY_ID, c.strategy_id.as_str());
                map.put(keys::POSITION_ID, c.position_id.as_str());
                map.put_bytes(keys::ORDER, self.orders.serialize(&c.order)?);
            }
            TradingCommand::SubmitBracketOrder(c) => {
                map.put(keys::TRADER_ID, c.trader_id.as_str());
                map.put(keys::ACCOUNT_ID, c.account_id.as_str());
                map.put(keys::STRATEGY_ID, c.strategy_id.as_str());
                map.put(keys::POSITION_ID, c.position_id.as_str());
                map.put_bytes(keys::ENTRY, self.orders.serialize(c.bracket_order.entry())?);
                map.put_bytes(
                    keys::STOP_LOSS,
                    self.orders.serialize(c.bracket_order.stop_loss())?,
                );
                match c.bracket_order.take_profit() {
                    Some(tp) => map.put_bytes(keys::TAKE_PROFIT, self.orders.serialize(tp)?),
                    None => map.put(keys::TAKE_PROFIT, NONE),
                }
            }
            TradingCommand::ModifyOrder(c) => {
                map.put(keys::TRADER_ID, c.trader_id.as_str());
                map.put(keys::ACCOUNT_ID, c.account_id.as_str());
                map.put(keys::ORDER_ID, c.order_id.as_str());
                map.put(keys::MODIFIED_QUANTITY, c.modified_quantity.to_string());
                map.put(keys::MODIFIED_PRICE, c.modified_price.to_string());
            }
            TradingCommand::CancelOrder(c) => {
                map.put(keys::TRADER_ID, c.trader_id.as_str());
                map.put(keys::ACCOUNT_ID, c.account_id.as_str());
                map.put(keys::ORDER_ID, c.order_id.as_str());
                map.put(keys::MESSAGE, c.cancel_reason.as_str());
            }
        }
        Ok(map.encode())
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<TradingCommand, TradingError> {
        let map = ObjectMap::decode(bytes)?;
        let id = parse_uuid(map.get_str(keys::ID)?)?;
        let timestamp = parse_timestamp(map.get_str(keys::TIMESTAMP)?)?;
        let trader_id = TraderId::from(map.get_str(keys::TRADER_ID)?);
        let account_id = AccountId::from(map.get_str(keys::ACCOUNT_ID)?);

        match map.get_str(keys::TYPE)? {
            "AccountInquiry" => Ok(TradingCommand::AccountInquiry(AccountInquiry {
                trader_id,
                account_id,
                id,
                timestamp,
            })),
            "SubmitOrder" => Ok(TradingCommand::SubmitOrder(SubmitOrder {
                trader_id,
                account_id,
                strategy_id: StrategyId::from(map.get_str(keys::STRATEGY_ID)?),
                position_id: PositionId::from(map.get_str(keys::POSITION_ID)?),
                order: self.orders.deserialize(map.get_bytes(keys::ORDER)?)?,
                id,
                timestamp,
            })),
            "SubmitBracketOrder" => {
                let entry = self.orders.deserialize(map.get_bytes(keys::ENTRY)?)?;
                let stop_loss = self.orders.deserialize(map.get_bytes(keys::STOP_LOSS)?)?;
                let take_profit = if map.get_bytes(keys::TAKE_PROFIT)? == NONE.as_bytes() {
                    None
                } else {
                    Some(self.orders.deserialize(map.get_bytes(keys::TAKE_PROFIT)?)?)
                };
                Ok(TradingCommand::SubmitBracketOrder(SubmitBracketOrder {
                    trader_id,
                    account_id,
                    strategy_id: StrategyId::from(map.get_str(keys::STRATEGY_ID)?),
                    position_id: PositionId::from(map.get_str(keys::POSITION_ID)?),
                    bracket_order: BracketOrder::new(entry, stop_loss, take_profit)
                        .map_err(|e| TradingError::Serialization(e.to_string()))?,
                    id,
                    timestamp,
                }))
            }
            "ModifyOrder" => Ok(TradingCommand::ModifyOrder(ModifyOrder {
                trader_id,
                account_id,
                order_id: OrderId::from(map.get_str(keys::ORDER_ID)?),
                modified_quantity: parse_quantity(map.get_str(keys::MODIFIED_QUANTITY)?)?,
                modified_price: parse_price(map.get_str(keys::MODIFIED_PRICE)?)?,
                id,
                timestamp,
            })),
            "CancelOrder" => Ok(TradingCommand::CancelOrder(CancelOrder {
                trader_id,
                account_id,
                order_id: OrderId::from(map.get_str(keys::ORDER_ID)?),
                cancel_reason: map.get_str(keys::MESSAGE)?.to_string(),
                id,
                timestamp,
            })),
            other => Err(TradingError::Serialization(format!(
                "unknown command type '{other}'"
            ))),
        }
    }
}

/// Serializes order and account events. Derived position events and time
/// events are in-process only and fail with `Serialization`.
#[derive(Debug, Clone, Default)]
pub struct EventSerializer;

impl EventSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, event: &Event) -> Result<Vec<u8>, TradingError> {
        match event {
            Event::Order(order_event) => self.serialize_order_event(order_event),
            Event::Account(account_event) => self.serialize_account_event(account_event),
            other => Err(TradingError::Serialization(format!(
                "{} events do not cross the wire",
                other.type_name()
            ))),
        }
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Event, TradingError> {
        let map = ObjectMap::decode(bytes)?;
        match map.get_str(keys::TYPE)? {
            "AccountStateEvent" => self.account_event_from_map(&map).map(Event::Account),
            _ => self.order_event_from_map(&map).map(Event::Order),
        }
    }

    fn serialize_order_event(&self, event: &OrderEventAny) -> Result<Vec<u8>, TradingError> {
        let mut map = ObjectMap::new();
        map.put(keys::TYPE, event.type_name());
        map.put(keys::ORDER_ID, event.order_id().as_str());
        map.put(keys::ID, event.event_id().to_string());
        map.put(keys::TIMESTAMP, format_timestamp(event.timestamp()));

        match event {
            OrderEventAny::Invalid(e) => {
                map.put(keys::INVALID_REASON, e.reason.as_str());
            }
            OrderEventAny::Denied(e) => {
                map.put(keys::DENIED_REASON, e.reason.as_str());
            }
            OrderEventAny::Submitted(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::SUBMITTED_TIME, format_timestamp(e.submitted_time));
            }
            OrderEventAny::Accepted(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::ACCEPTED_TIME, format_timestamp(e.accepted_time));
            }
            OrderEventAny::Rejected(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::REJECTED_TIME, format_timestamp(e.rejected_time));
                map.put(keys::REJECTED_REASON, e.reason.as_str());
            }
            OrderEventAny::Working(e) => {
                map.put(keys::ORDER_ID_BROKER, e.order_id_broker.as_str());
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::SYMBOL, e.symbol.to_string());
                map.put(keys::ORDER_SIDE, e.side.wire_name());
                map.put(keys::ORDER_TYPE, e.order_type.wire_name());
                map.put(keys::QUANTITY, e.quantity.to_string());
                map.put(keys::PRICE, e.price.to_string());
                map.put(keys::TIME_IN_FORCE, e.time_in_force.to_string());
                map.put(
                    keys::EXPIRE_TIME,
                    e.expire_time
                        .map(format_timestamp)
                        .unwrap_or_else(|| NONE.to_string()),
                );
                map.put(keys::WORKING_TIME, format_timestamp(e.working_time));
            }
            OrderEventAny::Modified(e) => {
                map.put(keys::ORDER_ID_BROKER, e.order_id_broker.as_str());
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::MODIFIED_QUANTITY, e.modified_quantity.to_string());
                map.put(keys::MODIFIED_PRICE, e.modified_price.to_string());
                map.put(keys::MODIFIED_TIME, format_timestamp(e.modified_time));
            }
            OrderEventAny::Cancelled(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::CANCELLED_TIME, format_timestamp(e.cancelled_time));
            }
            OrderEventAny::CancelReject(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::REJECTED_TIME, format_timestamp(e.rejected_time));
                map.put(keys::REJECTED_RESPONSE_TO, e.response_to.as_str());
                map.put(keys::REJECTED_REASON, e.reason.as_str());
            }
            OrderEventAny::Expired(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::EXPIRED_TIME, format_timestamp(e.expired_time));
            }
            OrderEventAny::PartiallyFilled(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::EXECUTION_ID, e.execution_id.as_str());
                map.put(keys::POSITION_ID_BROKER, e.position_id_broker.as_str());
                map.put(keys::SYMBOL, e.symbol.to_string());
                map.put(keys::ORDER_SIDE, e.side.wire_name());
                map.put(keys::FILLED_QUANTITY, e.filled_quantity.to_string());
                map.put(keys::LEAVES_QUANTITY, e.leaves_quantity.to_string());
                map.put(keys::AVERAGE_PRICE, e.average_price.to_string());
                map.put(keys::CURRENCY, e.quote_currency.as_str());
                map.put(keys::EXECUTION_TIME, format_timestamp(e.execution_time));
            }
            OrderEventAny::Filled(e) => {
                map.put(keys::ACCOUNT_ID, e.account_id.as_str());
                map.put(keys::EXECUTION_ID, e.execution_id.as_str());
                map.put(keys::POSITION_ID_BROKER, e.position_id_broker.as_str());
                map.put(keys::SYMBOL, e.symbol.to_string());
                map.put(keys::ORDER_SIDE, e.side.wire_name());
                map.put(keys::FILLED_QUANTITY, e.filled_quantity.to_string());
                map.put(keys::AVERAGE_PRICE, e.average_price.to_string());
                map.put(keys::CURRENCY, e.quote_currency.as_str());
                map.put(keys::EXECUTION_TIME, format_timestamp(e.execution_time));
            }
        }
        Ok(map.encode())
    }

    fn order_event_from_map(&self, map: &ObjectMap) -> Result<OrderEventAny, TradingError> {
        let order_id = OrderId::from(map.get_str(keys::ORDER_ID)?);
        let id = parse_uuid(map.get_str(keys::ID)?)?;
        let timestamp = parse_timestamp(map.get_str(keys::TIMESTAMP)?)?;

        match map.get_str(keys::TYPE)? {
            "OrderInvalid" => Ok(OrderEventAny::Invalid(OrderInvalid {
                order_id,
                reason: map.get_str(keys::INVALID_REASON)?.to_string(),
                id,
                timestamp,
            })),
            "OrderDenied" => Ok(OrderEventAny::Denied(OrderDenied {
                order_id,
                reason: map.get_str(keys::DENIED_REASON)?.to_string(),
                id,
                timestamp,
            })),
            "OrderSubmitted" => Ok(OrderEventAny::Submitted(OrderSubmitted {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                submitted_time: parse_timestamp(map.get_str(keys::SUBMITTED_TIME)?)?,
                id,
                timestamp,
            })),
            "OrderAccepted" => Ok(OrderEventAny::Accepted(OrderAccepted {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                accepted_time: parse_timestamp(map.get_str(keys::ACCEPTED_TIME)?)?,
                id,
                timestamp,
            })),
            "OrderRejected" => Ok(OrderEventAny::Rejected(OrderRejected {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                rejected_time: parse_timestamp(map.get_str(keys::REJECTED_TIME)?)?,
                reason: map.get_str(keys::REJECTED_REASON)?.to_string(),
                id,
                timestamp,
            })),
            "OrderWorking" => {
                let expire_time = match map.get_str(keys::EXPIRE_TIME)? {
                    NONE => None,
                    value => Some(parse_timestamp(value)?),
                };
                Ok(OrderEventAny::Working(OrderWorking {
                    order_id,
                    order_id_broker: OrderIdBroker::from(map.get_str(keys::ORDER_ID_BROKER)?),
                    account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                    symbol: parse_symbol(map.get_str(keys::SYMBOL)?)?,
                    side: OrderSide::from_wire(map.get_str(keys::ORDER_SIDE)?)?,
                    order_type: OrderType::from_wire(map.get_str(keys::ORDER_TYPE)?)?,
                    quantity: parse_quantity(map.get_str(keys::QUANTITY)?)?,
                    price: parse_price(map.get_str(keys::PRICE)?)?,
                    time_in_force: TimeInForce::from_str(map.get_str(keys::TIME_IN_FORCE)?)
                        .map_err(|e| TradingError::Serialization(e.to_string()))?,
                    expire_time,
                    working_time: parse_timestamp(map.get_str(keys::WORKING_TIME)?)?,
                    id,
                    timestamp,
                }))
            }
            "OrderModified" => Ok(OrderEventAny::Modified(OrderModified {
                order_id,
                order_id_broker: OrderIdBroker::from(map.get_str(keys::ORDER_ID_BROKER)?),
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                modified_quantity: parse_quantity(map.get_str(keys::MODIFIED_QUANTITY)?)?,
                modified_price: parse_price(map.get_str(keys::MODIFIED_PRICE)?)?,
                modified_time: parse_timestamp(map.get_str(keys::MODIFIED_TIME)?)?,
                id,
                timestamp,
            })),
            "OrderCancelled" => Ok(OrderEventAny::Cancelled(OrderCancelled {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                cancelled_time: parse_timestamp(map.get_str(keys::CANCELLED_TIME)?)?,
                id,
                timestamp,
            })),
            "OrderCancelReject" => Ok(OrderEventAny::CancelReject(OrderCancelReject {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                rejected_time: parse_timestamp(map.get_str(keys::REJECTED_TIME)?)?,
                response_to: map.get_str(keys::REJECTED_RESPONSE_TO)?.to_string(),
                reason: map.get_str(keys::REJECTED_REASON)?.to_string(),
                id,
                timestamp,
            })),
            "OrderExpired" => Ok(OrderEventAny::Expired(OrderExpired {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                expired_time: parse_timestamp(map.get_str(keys::EXPIRED_TIME)?)?,
                id,
                timestamp,
            })),
            "OrderPartiallyFilled" => Ok(OrderEventAny::PartiallyFilled(OrderPartiallyFilled {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                execution_id: ExecutionId::from(map.get_str(keys::EXECUTION_ID)?),
                position_id_broker: PositionIdBroker::from(
                    map.get_str(keys::POSITION_ID_BROKER)?,
                ),
                symbol: parse_symbol(map.get_str(keys::SYMBOL)?)?,
                side: OrderSide::from_wire(map.get_str(keys::ORDER_SIDE)?)?,
                filled_quantity: parse_quantity(map.get_str(keys::FILLED_QUANTITY)?)?,
                leaves_quantity: parse_quantity(map.get_str(keys::LEAVES_QUANTITY)?)?,
                average_price: parse_price(map.get_str(keys::AVERAGE_PRICE)?)?,
                quote_currency: parse_currency(map.get_str(keys::CURRENCY)?)?,
                execution_time: parse_timestamp(map.get_str(keys::EXECUTION_TIME)?)?,
                id,
                timestamp,
            })),
            "OrderFilled" => Ok(OrderEventAny::Filled(OrderFilled {
                order_id,
                account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
                execution_id: ExecutionId::from(map.get_str(keys::EXECUTION_ID)?),
                position_id_broker: PositionIdBroker::from(
                    map.get_str(keys::POSITION_ID_BROKER)?,
                ),
                symbol: parse_symbol(map.get_str(keys::SYMBOL)?)?,
                side: OrderSide::from_wire(map.get_str(keys::ORDER_SIDE)?)?,
                filled_quantity: parse_quantity(map.get_str(keys::FILLED_QUANTITY)?)?,
                average_price: parse_price(map.get_str(keys::AVERAGE_PRICE)?)?,
                quote_currency: parse_currency(map.get_str(keys::CURRENCY)?)?,
                execution_time: parse_timestamp(map.get_str(keys::EXECUTION_TIME)?)?,
                id,
                timestamp,
            })),
            other => Err(TradingError::Serialization(format!(
                "unknown event type '{other}'"
            ))),
        }
    }

    fn serialize_account_event(&self, event: &AccountStateEvent) -> Result<Vec<u8>, TradingError> {
        let mut map = ObjectMap::new();
        map.put(keys::TYPE, event.type_name());
        map.put(keys::ACCOUNT_ID, event.account_id.as_str());
        map.put(keys::CURRENCY, event.currency.as_str());
        map.put(keys::CASH_BALANCE, event.cash_balance.amount().to_string());
        map.put(
            keys::CASH_START_DAY,
            event.cash_start_day.amount().to_string(),
        );
        map.put(
            keys::CASH_ACTIVITY_DAY,
            event.cash_activity_day.amount().to_string(),
        );
        map.put(
            keys::MARGIN_USED_LIQUIDATION,
            event.margin_used_liquidation.amount().to_string(),
        );
        map.put(
            keys::MARGIN_USED_MAINTENANCE,
            event.margin_used_maintenance.amount().to_string(),
        );
        map.put(keys::MARGIN_RATIO, event.margin_ratio.to_string());
        map.put(keys::MARGIN_CALL_STATUS, event.margin_call_status.as_str());
        map.put(keys::ID, event.id.to_string());
        map.put(keys::TIMESTAMP, format_timestamp(event.timestamp));
        Ok(map.encode())
    }

    fn account_event_from_map(&self, map: &ObjectMap) -> Result<AccountStateEvent, TradingError> {
        let currency = parse_currency(map.get_str(keys::CURRENCY)?)?;
        let money = |key: &str| -> Result<Money, TradingError> {
            Ok(Money::new(parse_decimal(map.get_str(key)?)?, currency))
        };
        Ok(AccountStateEvent {
            account_id: AccountId::from(map.get_str(keys::ACCOUNT_ID)?),
            currency,
            cash_balance: money(keys::CASH_BALANCE)?,
            cash_start_day: money(keys::CASH_START_DAY)?,
            cash_activity_day: money(keys::CASH_ACTIVITY_DAY)?,
            margin_used_liquidation: money(keys::MARGIN_USED_LIQUIDATION)?,
            margin_used_maintenance: money(keys::MARGIN_USED_MAINTENANCE)?,
            margin_ratio: parse_decimal(map.get_str(keys::MARGIN_RATIO)?)?,
            margin_call_status: map.get_str(keys::MARGIN_CALL_STATUS)?.to_string(),
            id: parse_uuid(map.get_str(keys::ID)?)?,
            timestamp: parse_timestamp(map.get_str(keys::TIMESTAMP)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn unix_epoch() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn audusd() -> Symbol {
        Symbol::new("AUDUSD", "FXCM").unwrap()
    }

    fn limit_order() -> Order {
        Order::new(
            OrderId::from("O-19700101-000000-001-001-1"),
            audusd(),
            OrderSide::Buy,
            OrderType::Limit,
            Quantity::from_units(100_000),
            TimeInForce::Gtd,
            Some(Price::parse("1.20000").unwrap()),
            Some(unix_epoch() + chrono::Duration::hours(1)),
            Uuid::from_u128(1),
            unix_epoch(),
        )
        .unwrap()
    }

    fn market_order() -> Order {
        Order::new(
            OrderId::from("O-19700101-000000-001-001-2"),
            audusd(),
            OrderSide::Sell,
            OrderType::Market,
            Quantity::from_units(50_000),
            TimeInForce::Ioc,
            None,
            None,
            Uuid::from_u128(2),
            unix_epoch(),
        )
        .unwrap()
    }

    #[test]
    fn order_round_trips() {
        let serializer = OrderSerializer::new();
        for order in [limit_order(), market_order()] {
            let bytes = serializer.serialize(&order).unwrap();
            assert_eq!(serializer.deserialize(&bytes).unwrap(), order);
        }
    }

    #[test]
    fn order_wire_encoding_uses_camel_case_enums() {
        let serializer = OrderSerializer::new();
        let bytes = serializer.serialize(&limit_order()).unwrap();
        let map = ObjectMap::decode(&bytes).unwrap();
        assert_eq!(map.get_str(keys::ORDER_SIDE).unwrap(), "Buy");
        assert_eq!(map.get_str(keys::ORDER_TYPE).unwrap(), "Limit");
        assert_eq!(map.get_str(keys::TIME_IN_FORCE).unwrap(), "GTD");
    }

    #[test]
    fn submit_order_command_round_trips() {
        let serializer = CommandSerializer::new();
        let command = TradingCommand::SubmitOrder(SubmitOrder {
            trader_id: TraderId::from("TESTER-000"),
            account_id: AccountId::from("FXCM-123456"),
            strategy_id: StrategyId::from("EMACross-001"),
            position_id: PositionId::from("P-1"),
            order: limit_order(),
            id: Uuid::from_u128(3),
            timestamp: unix_epoch(),
        });
        let bytes = serializer.serialize(&command).unwrap();
        assert_eq!(serializer.deserialize(&bytes).unwrap(), command);
    }

    #[test]
    fn submit_bracket_order_command_round_trips() {
        let serializer = CommandSerializer::new();
        let stop_loss = Order::new(
            OrderId::from("O-3"),
            audusd(),
            OrderSide::Buy,
            OrderType::Stop,
            Quantity::from_units(50_000),
            TimeInForce::Gtc,
            Some(Price::parse("1.10000").unwrap()),
            None,
            Uuid::from_u128(4),
            unix_epoch(),
        )
        .unwrap();
        let bracket = BracketOrder::new(market_order(), stop_loss, None).unwrap();
        let command = TradingCommand::SubmitBracketOrder(SubmitBracketOrder {
            trader_id: TraderId::from("TESTER-000"),
            account_id: AccountId::from("FXCM-123456"),
            strategy_id: StrategyId::from("EMACross-001"),
            position_id: PositionId::from("P-1"),
            bracket_order: bracket,
            id: Uuid::from_u128(5),
            timestamp: unix_epoch(),
        });
        let bytes = serializer.serialize(&command).unwrap();
        assert_eq!(serializer.deserialize(&bytes).unwrap(), command);
    }

    #[test]
    fn modify_and_cancel_commands_round_trip() {
        let serializer = CommandSerializer::new();
        let modify = TradingCommand::ModifyOrder(ModifyOrder {
            trader_id: TraderId::from("TESTER-000"),
            account_id: AccountId::from("FXCM-123456"),
            order_id: OrderId::from("O-1"),
            modified_quantity: Quantity::from_units(8),
            modified_price: Price::parse("1.19000").unwrap(),
            id: Uuid::from_u128(6),
            timestamp: unix_epoch(),
        });
        let cancel = TradingCommand::CancelOrder(CancelOrder {
            trader_id: TraderId::from("TESTER-000"),
            account_id: AccountId::from("FXCM-123456"),
            order_id: OrderId::from("O-1"),
            cancel_reason: "EXPIRED".to_string(),
            id: Uuid::from_u128(7),
            timestamp: unix_epoch(),
        });
        for command in [modify, cancel] {
            let bytes = serializer.serialize(&command).unwrap();
            assert_eq!(serializer.deserialize(&bytes).unwrap(), command);
        }
    }

    #[test]
    fn order_events_round_trip() {
        let serializer = EventSerializer::new();
        let events: Vec<OrderEventAny> = vec![
            OrderSubmitted {
                order_id: OrderId::from("O-1"),
                account_id: AccountId::from("FXCM-123456"),
                submitted_time: unix_epoch(),
                id: Uuid::from_u128(10),
                timestamp: unix_epoch(),
            }
            .into(),
            OrderWorking {
                order_id: OrderId::from("O-1"),
                order_id_broker: OrderIdBroker::from("B-1"),
                account_id: AccountId::from("FXCM-123456"),
                symbol: audusd(),
                side: OrderSide::Buy,
                order_type: OrderType::Limit,
                quantity: Quantity::from_units(100_000),
                price: Price::parse("1.20000").unwrap(),
                time_in_force: TimeInForce::Gtc,
                expire_time: None,
                working_time: unix_epoch(),
                id: Uuid::from_u128(11),
                timestamp: unix_epoch(),
            }
            .into(),
            OrderPartiallyFilled {
                order_id: OrderId::from("O-1"),
                account_id: AccountId::from("FXCM-123456"),
                execution_id: ExecutionId::from("E-1"),
                position_id_broker: PositionIdBroker::from("ET-1"),
                symbol: audusd(),
                side: OrderSide::Buy,
                filled_quantity: Quantity::from_units(40_000),
                leaves_quantity: Quantity::from_units(60_000),
                average_price: Price::parse("1.20000").unwrap(),
                quote_currency: Currency::Usd,
                execution_time: unix_epoch(),
                id: Uuid::from_u128(12),
                timestamp: unix_epoch(),
            }
            .into(),
            OrderFilled {
                order_id: OrderId::from("O-1"),
                account_id: AccountId::from("FXCM-123456"),
                execution_id: ExecutionId::from("E-2"),
                position_id_broker: PositionIdBroker::from("ET-1"),
                symbol: audusd(),
                side: OrderSide::Buy,
                filled_quantity: Quantity::from_units(60_000),
                average_price: Price::parse("1.20001").unwrap(),
                quote_currency: Currency::Usd,
                execution_time: unix_epoch(),
                id: Uuid::from_u128(13),
                timestamp: unix_epoch(),
            }
            .into(),
            OrderCancelReject {
                order_id: OrderId::from("O-1"),
                account_id: AccountId::from("FXCM-123456"),
                rejected_time: unix_epoch(),
                response_to: "CancelOrder".to_string(),
                reason: "ORDER_NOT_FOUND".to_string(),
                id: Uuid::from_u128(14),
                timestamp: unix_epoch(),
            }
            .into(),
            OrderExpired {
                order_id: OrderId::from("O-1"),
                account_id: AccountId::from("FXCM-123456"),
                expired_time: unix_epoch(),
                id: Uuid::from_u128(15),
                timestamp: unix_epoch(),
            }
            .into(),
        ];

        for event in events {
            let wrapped = Event::Order(event.clone());
            let bytes = serializer.serialize(&wrapped).unwrap();
            match serializer.deserialize(&bytes).unwrap() {
                Event::Order(decoded) => assert_eq!(decoded, event),
                other => panic!("expected an order event, got {}", other.type_name()),
            }
        }
    }

    #[test]
    fn account_event_round_trips() {
        let serializer = EventSerializer::new();
        let event = AccountStateEvent {
            account_id: AccountId::from("FXCM-123456"),
            currency: Currency::Usd,
            cash_balance: Money::new(dec!(1000000), Currency::Usd),
            cash_start_day: Money::new(dec!(1000000), Currency::Usd),
            cash_activity_day: Money::zero(Currency::Usd),
            margin_used_liquidation: Money::zero(Currency::Usd),
            margin_used_maintenance: Money::zero(Currency::Usd),
            margin_ratio: dec!(0),
            margin_call_status: "N".to_string(),
            id: Uuid::from_u128(20),
            timestamp: unix_epoch(),
        };
        let bytes = serializer.serialize(&Event::Account(event.clone())).unwrap();
        match serializer.deserialize(&bytes).unwrap() {
            Event::Account(decoded) => assert_eq!(decoded, event),
            other => panic!("expected an account event, got {}", other.type_name()),
        }
    }

    #[test]
    fn serialization_is_deterministic() {
        let serializer = OrderSerializer::new();
        assert_eq!(
            serializer.serialize(&limit_order()).unwrap(),
            serializer.serialize(&limit_order()).unwrap()
        );
    }
}
