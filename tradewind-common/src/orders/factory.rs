//! Order factory: builds validated orders with generated identifiers.
//!
//! Timestamps are explicit parameters so that identical clocks produce
//! identical orders.

use chrono::{DateTime, Utc};

use super::bracket::BracketOrder;
use super::order::Order;
use super::types::{OrderSide, OrderType, TimeInForce};
use crate::error::TradingError;
use crate::identifiers::{OrderIdGenerator, Symbol, UuidFactory};
use crate::types::{Price, Quantity};

#[derive(Debug, Clone)]
pub struct OrderFactory {
    id_generator: OrderIdGenerator,
    uuid_factory: UuidFactory,
}

impl OrderFactory {
    pub fn new(
        trader_tag: impl Into<String>,
        strategy_tag: impl Into<String>,
        uuid_factory: UuidFactory,
    ) -> Result<Self, TradingError> {
        Ok(Self {
            id_generator: OrderIdGenerator::new(trader_tag, strategy_tag)?,
            uuid_factory,
        })
    }

    /// A market order (DAY time-in-force).
    pub fn market(
        &mut self,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Order, TradingError> {
        Order::new(
            self.id_generator.generate(now),
            symbol,
            side,
            OrderType::Market,
            quantity,
            TimeInForce::Day,
            None,
            None,
            self.uuid_factory.generate(),
            now,
        )
    }

    /// A limit order. `expire_time` must be given iff `time_in_force` is GTD.
    #[allow(clippy::too_many_arguments)]
    pub fn limit(
        &mut self,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
        time_in_force: TimeInForce,
        expire_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Order, TradingError> {
        Order::new(
            self.id_generator.generate(now),
            symbol,
            side,
            OrderType::Limit,
            quantity,
            time_in_force,
            Some(price),
            expire_time,
            self.uuid_factory.generate(),
            now,
        )
    }

    /// A stop order.
    #[allow(clippy::too_many_arguments)]
    pub fn stop(
        &mut self,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
        time_in_force: TimeInForce,
        expire_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Order, TradingError> {
        Order::new(
            self.id_generator.generate(now),
            symbol,
            side,
            OrderType::Stop,
            quantity,
            time_in_force,
            Some(price),
            expire_time,
            self.uuid_factory.generate(),
            now,
        )
    }

    /// A bracket: market entry, stop-loss, and optional take-profit.
    pub fn bracket_market(
        &mut self,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        stop_loss_price: Price,
        take_profit_price: Option<Price>,
        now: DateTime<Utc>,
    ) -> Result<BracketOrder, TradingError> {
        let entry = self.market(symbol.clone(), side, quantity, now)?;
        let stop_loss = self.stop(
            symbol.clone(),
            side.opposite(),
            quantity,
            stop_loss_price,
            TimeInForce::Gtc,
            None,
            now,
        )?;
        let take_profit = match take_profit_price {
            Some(price) => Some(self.limit(
                symbol,
                side.opposite(),
                quantity,
                price,
                TimeInForce::Gtc,
                None,
                now,
            )?),
            None => None,
        };
        BracketOrder::new(entry, stop_loss, take_profit)
    }

    /// Reset the id and uuid counters.
    pub fn reset(&mut self) {
        self.id_generator.reset();
        self.uuid_factory.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn factory() -> OrderFactory {
        OrderFactory::new("001", "001", UuidFactory::deterministic(9)).unwrap()
    }

    fn unix_epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn audusd() -> Symbol {
        Symbol::new("AUDUSD", "FXCM").unwrap()
    }

    #[test]
    fn market_orders_get_sequential_ids() {
        let mut factory = factory();
        let one = factory
            .market(audusd(), OrderSide::Buy, Quantity::from_units(100), unix_epoch())
            .unwrap();
        let two = factory
            .market(audusd(), OrderSide::Sell, Quantity::from_units(100), unix_epoch())
            .unwrap();
        assert_eq!(one.id().as_str(), "O-19700101-000000-001-001-1");
        assert_eq!(two.id().as_str(), "O-19700101-000000-001-001-2");
        assert_ne!(one.init_id(), two.init_id());
    }

    #[test]
    fn bracket_orders_share_quantity_and_symbol() {
        let mut factory = factory();
        let bracket = factory
            .bracket_market(
                audusd(),
                OrderSide::Buy,
                Quantity::from_units(10),
                Price::new(dec!(0.99), 2).unwrap(),
                Some(Price::new(dec!(1.05), 2).unwrap()),
                unix_epoch(),
            )
            .unwrap();
        assert_eq!(bracket.entry().quantity(), Quantity::from_units(10));
        assert_eq!(bracket.stop_loss().quantity(), Quantity::from_units(10));
        assert_eq!(
            bracket.take_profit().unwrap().quantity(),
            Quantity::from_units(10)
        );
        assert_eq!(bracket.stop_loss().side(), OrderSide::Sell);
    }

    #[test]
    fn reset_replays_identifier_sequence() {
        let mut factory = factory();
        let first = factory
            .market(audusd(), OrderSide::Buy, Quantity::from_units(1), unix_epoch())
            .unwrap();
        factory.reset();
        let replay = factory
            .market(audusd(), OrderSide::Buy, Quantity::from_units(1), unix_epoch())
            .unwrap();
        assert_eq!(first.id(), replay.id());
        assert_eq!(first.init_id(), replay.init_id());
    }
}
