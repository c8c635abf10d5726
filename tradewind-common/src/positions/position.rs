//! The position aggregator.
//!
//! A position is created by the first fill carrying a fresh position id and
//! folds every subsequent fill on that id into a signed net quantity. When
//! the net returns to zero the position closes and never re-opens. The
//! position owns its applied event log; there are no back-pointers.
//!
//! Realized PnL accumulates only on reducing fills, in the quote currency of
//! the fills; conversion into the account currency is the portfolio's
//! concern.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TradingError;
use crate::identifiers::{ExecutionId, OrderId, PositionId, PositionIdBroker, Symbol};
use crate::orders::{FillView, OrderEventAny, OrderSide};
use crate::types::{Currency, Money, Quantity, QuoteTick};

/// The direction of net inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketPosition {
    Flat,
    Long,
    Short,
}

impl fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketPosition::Flat => write!(f, "FLAT"),
            MarketPosition::Long => write!(f, "LONG"),
            MarketPosition::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    id_broker: PositionIdBroker,
    from_order_id: OrderId,
    symbol: Symbol,
    entry_direction: OrderSide,
    market_position: MarketPosition,
    quote_currency: Currency,

    relative_quantity: Decimal,
    quantity: Quantity,
    peak_quantity: Quantity,
    cumulative_volume: Decimal,
    closed_volume: Decimal,

    average_open_price: Decimal,
    average_close_price: Option<Decimal>,
    realized_points: Decimal,
    realized_pnl: Money,

    opened_time: DateTime<Utc>,
    closed_time: Option<DateTime<Utc>>,

    order_ids: Vec<OrderId>,
    execution_ids: Vec<ExecutionId>,
    events: Vec<OrderEventAny>,
}

impl Position {
    /// Create a position from its opening fill event.
    ///
    /// Fails with `InvalidArgument` if the event is not a fill.
    pub fn new(id: PositionId, event: &OrderEventAny) -> Result<Self, TradingError> {
        let fill = event.as_fill().ok_or_else(|| {
            TradingError::InvalidArgument(format!(
                "a position can only be opened by a fill event, not {}",
                event.type_name()
            ))
        })?;
        let lot = fill.quantity.as_decimal();
        Ok(Self {
            id,
            id_broker: fill.position_id_broker.clone(),
            from_order_id: fill.order_id.clone(),
            symbol: fill.symbol.clone(),
            entry_direction: fill.side,
            market_position: match fill.side {
                OrderSide::Buy => MarketPosition::Long,
                OrderSide::Sell => MarketPosition::Short,
            },
            quote_currency: fill.quote_currency,
            relative_quantity: fill.side.sign() * lot,
            quantity: fill.quantity,
            peak_quantity: fill.quantity,
            cumulative_volume: lot,
            closed_volume: Decimal::ZERO,
            average_open_price: fill.price.as_decimal(),
            average_close_price: None,
            realized_points: Decimal::ZERO,
            realized_pnl: Money::zero(fill.quote_currency),
            opened_time: fill.execution_time,
            closed_time: None,
            order_ids: vec![fill.order_id.clone()],
            execution_ids: vec![fill.execution_id.clone()],
            events: vec![event.clone()],
        })
    }

    // === Accessors ===

    pub fn id(&self) -> &PositionId {
        &self.id
    }

    pub fn id_broker(&self) -> &PositionIdBroker {
        &self.id_broker
    }

    pub fn from_order_id(&self) -> &OrderId {
        &self.from_order_id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn entry_direction(&self) -> OrderSide {
        self.entry_direction
    }

    pub fn market_position(&self) -> MarketPosition {
        self.market_position
    }

    pub fn quote_currency(&self) -> Currency {
        self.quote_currency
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn peak_quantity(&self) -> Quantity {
        self.peak_quantity
    }

    /// Total volume traded into and out of this position.
    pub fn cumulative_volume(&self) -> Decimal {
        self.cumulative_volume
    }

    pub fn average_open_price(&self) -> Decimal {
        self.average_open_price
    }

    pub fn average_close_price(&self) -> Option<Decimal> {
        self.average_close_price
    }

    /// The exit price: the volume-weighted average close price, if any
    /// reduction has occurred.
    pub fn exit_price(&self) -> Option<Decimal> {
        self.average_close_price
    }

    pub fn realized_points(&self) -> Decimal {
        self.realized_points
    }

    pub fn realized_pnl(&self) -> Money {
        self.realized_pnl
    }

    pub fn opened_time(&self) -> DateTime<Utc> {
        self.opened_time
    }

    pub fn closed_time(&self) -> Option<DateTime<Utc>> {
        self.closed_time
    }

    pub fn is_long(&self) -> bool {
        self.market_position == MarketPosition::Long
    }

    pub fn is_short(&self) -> bool {
        self.market_position == MarketPosition::Short
    }

    pub fn is_open(&self) -> bool {
        self.closed_time.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.closed_time.is_some()
    }

    pub fn order_ids(&self) -> &[OrderId] {
        &self.order_ids
    }

    pub fn execution_ids(&self) -> &[ExecutionId] {
        &self.execution_ids
    }

    pub fn last_execution_id(&self) -> Option<&ExecutionId> {
        self.execution_ids.last()
    }

    pub fn events(&self) -> &[OrderEventAny] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // === Aggregation ===

    /// Fold a fill event into the position.
    ///
    /// Fills in the entry direction extend the position and re-weight the
    /// average open price; opposing fills reduce it and realize PnL. A net
    /// quantity of zero closes the position. Non-fill events and fills
    /// against a closed position fail.
    pub fn apply(&mut self, event: &OrderEventAny) -> Result<(), TradingError> {
        let fill = event.as_fill().ok_or_else(|| {
            TradingError::InvalidArgument(format!(
                "a position can only apply fill events, not {}",
                event.type_name()
            ))
        })?;
        if self.is_closed() {
            return Err(TradingError::InvalidStateTrigger(format!(
                "position {} is closed and cannot apply fill {}",
                self.id, fill.execution_id
            )));
        }
        self.apply_fill(fill)?;
        self.events.push(event.clone());
        Ok(())
    }

    fn apply_fill(&mut self, fill: FillView<'_>) -> Result<(), TradingError> {
        let lot = fill.quantity.as_decimal();
        let price = fill.price.as_decimal();
        let signed = fill.side.sign() * lot;
        let open_qty = self.relative_quantity.abs();

        if fill.side == self.entry_direction {
            // Extending fill: re-weight the open average.
            self.average_open_price =
                (self.average_open_price * open_qty + price * lot) / (open_qty + lot);
        } else {
            // Reducing fill: realize points and PnL on the reduced quantity.
            let reduced = lot.min(open_qty);
            let points = (price - self.average_open_price) * self.entry_direction.sign();
            self.realized_points += points;
            self.realized_pnl = Money::new(
                self.realized_pnl.amount() + points * reduced,
                self.quote_currency,
            );
            self.average_close_price = Some(match self.average_close_price {
                Some(current) => (current * self.closed_volume + price * reduced)
                    / (self.closed_volume + reduced),
                None => price,
            });
            self.closed_volume += reduced;
        }

        self.relative_quantity += signed;
        self.quantity = Quantity::new(
            self.relative_quantity.abs(),
            fill.quantity.precision().max(self.quantity.precision()),
        )?;
        if self.quantity.as_decimal() > self.peak_quantity.as_decimal() {
            self.peak_quantity = self.quantity;
        }
        self.cumulative_volume += lot;
        self.market_position = if self.relative_quantity.is_zero() {
            MarketPosition::Flat
        } else if self.relative_quantity > Decimal::ZERO {
            MarketPosition::Long
        } else {
            MarketPosition::Short
        };
        if self.relative_quantity.is_zero() {
            self.closed_time = Some(fill.execution_time);
        }

        if !self.order_ids.contains(fill.order_id) {
            self.order_ids.push(fill.order_id.clone());
        }
        self.execution_ids.push(fill.execution_id.clone());
        Ok(())
    }

    // === Analytics ===

    /// Per-unit unrealized points against the current book.
    pub fn unrealized_points(&self, last: &QuoteTick) -> Decimal {
        if self.is_closed() || self.quantity.is_zero() {
            return Decimal::ZERO;
        }
        match self.market_position {
            MarketPosition::Long => last.bid.as_decimal() - self.average_open_price,
            MarketPosition::Short => self.average_open_price - last.ask.as_decimal(),
            MarketPosition::Flat => Decimal::ZERO,
        }
    }

    /// Unrealized PnL in the quote currency against the current book.
    pub fn unrealized_pnl(&self, last: &QuoteTick) -> Money {
        Money::new(
            self.unrealized_points(last) * self.quantity.as_decimal(),
            self.quote_currency,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position({} {} {} {} qty={})",
            self.id, self.symbol, self.market_position, self.entry_direction, self.quantity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::AccountId;
    use crate::orders::OrderFilled;
    use crate::types::Price;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn unix_epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn fill_event(
        order_id: &str,
        exec_id: &str,
        side: OrderSide,
        qty: u64,
        price: &str,
    ) -> OrderEventAny {
        OrderEventAny::Filled(OrderFilled {
            order_id: OrderId::from(order_id),
            account_id: AccountId::from("FXCM-123456"),
            execution_id: ExecutionId::from(exec_id),
            position_id_broker: PositionIdBroker::from("ET-1"),
            symbol: Symbol::new("AUDUSD", "FXCM").unwrap(),
            side,
            filled_quantity: Quantity::from_units(qty),
            average_price: Price::parse(price).unwrap(),
            quote_currency: Currency::Usd,
            execution_time: unix_epoch(),
            id: Uuid::from_u128(1),
            timestamp: unix_epoch(),
        })
    }

    fn tick(bid: &str, ask: &str) -> QuoteTick {
        QuoteTick::new(
            Symbol::new("AUDUSD", "FXCM").unwrap(),
            Price::parse(bid).unwrap(),
            Price::parse(ask).unwrap(),
            Quantity::from_units(1_000_000),
            Quantity::from_units(1_000_000),
            unix_epoch(),
        )
    }

    #[test]
    fn opened_by_buy_fill() {
        let event = fill_event("O-1", "E-1", OrderSide::Buy, 100_000, "1.00001");
        let position = Position::new(PositionId::from("P-1"), &event).unwrap();

        assert_eq!(position.from_order_id().as_str(), "O-1");
        assert_eq!(position.quantity(), Quantity::from_units(100_000));
        assert_eq!(position.peak_quantity(), Quantity::from_units(100_000));
        assert_eq!(position.entry_direction(), OrderSide::Buy);
        assert_eq!(position.market_position(), MarketPosition::Long);
        assert_eq!(position.opened_time(), unix_epoch());
        assert_eq!(position.average_open_price(), dec!(1.00001));
        assert_eq!(position.event_count(), 1);
        assert!(position.is_long());
        assert!(!position.is_short());
        assert!(!position.is_closed());
        assert_eq!(position.realized_points(), dec!(0));
        assert_eq!(position.realized_pnl(), Money::zero(Currency::Usd));
        assert_eq!(position.id_broker().as_str(), "ET-1");
    }

    #[test]
    fn non_fill_event_cannot_open_a_position() {
        let event = OrderEventAny::Submitted(crate::orders::OrderSubmitted {
            order_id: OrderId::from("O-1"),
            account_id: AccountId::from("FXCM-123456"),
            submitted_time: unix_epoch(),
            id: Uuid::from_u128(2),
            timestamp: unix_epoch(),
        });
        assert!(Position::new(PositionId::from("P-1"), &event).is_err());
    }

    #[test]
    fn unrealized_pnl_for_long() {
        let event = fill_event("O-1", "E-1", OrderSide::Buy, 100_000, "1.00001");
        let position = Position::new(PositionId::from("P-1"), &event).unwrap();
        let last = tick("1.00050", "1.00053");

        assert_eq!(position.unrealized_points(&last), dec!(0.00049));
        assert_eq!(
            position.unrealized_pnl(&last),
            Money::new(dec!(49.00), Currency::Usd)
        );
    }

    #[test]
    fn unrealized_pnl_for_short_uses_ask() {
        let event = fill_event("O-1", "E-1", OrderSide::Sell, 100_000, "1.00001");
        let position = Position::new(PositionId::from("P-1"), &event).unwrap();
        let last = tick("1.00045", "1.00048");

        assert_eq!(position.market_position(), MarketPosition::Short);
        assert_eq!(position.unrealized_points(&last), dec!(-0.00047));
        assert_eq!(
            position.unrealized_pnl(&last),
            Money::new(dec!(-47.00), Currency::Usd)
        );
    }

    #[test]
    fn extending_fill_reweights_average_open() {
        let event = fill_event("O-1", "E-1", OrderSide::Sell, 50_000, "1.00001");
        let mut position = Position::new(PositionId::from("P-1"), &event).unwrap();
        let second = fill_event("O-2", "E-2", OrderSide::Sell, 50_000, "1.00003");
        position.apply(&second).unwrap();

        assert_eq!(position.quantity(), Quantity::from_units(100_000));
        assert_eq!(position.average_open_price(), dec!(1.00002));
        assert_eq!(position.event_count(), 2);
        assert!(position.is_short());
    }

    #[test]
    fn reducing_to_zero_closes_with_realized_pnl() {
        let open = fill_event("O-1", "E-1", OrderSide::Buy, 100_000, "1.00000");
        let mut position = Position::new(PositionId::from("P-1"), &open).unwrap();
        let close = fill_event("O-2", "E-2", OrderSide::Sell, 100_000, "1.00010");
        position.apply(&close).unwrap();

        assert!(position.is_closed());
        assert_eq!(position.market_position(), MarketPosition::Flat);
        assert!(position.quantity().is_zero());
        assert_eq!(position.peak_quantity(), Quantity::from_units(100_000));
        assert_eq!(position.closed_time(), Some(unix_epoch()));
        assert_eq!(position.realized_points(), dec!(0.00010));
        assert_eq!(
            position.realized_pnl(),
            Money::new(dec!(10.00), Currency::Usd)
        );
        assert_eq!(position.exit_price(), Some(dec!(1.00010)));
        assert_eq!(position.cumulative_volume(), dec!(200000));
    }

    #[test]
    fn partial_reduction_keeps_position_open() {
        let open = fill_event("O-1", "E-1", OrderSide::Buy, 100_000, "1.00000");
        let mut position = Position::new(PositionId::from("P-1"), &open).unwrap();
        let reduce = fill_event("O-2", "E-2", OrderSide::Sell, 40_000, "1.00005");
        position.apply(&reduce).unwrap();

        assert!(!position.is_closed());
        assert_eq!(position.quantity(), Quantity::from_units(60_000));
        assert_eq!(position.peak_quantity(), Quantity::from_units(100_000));
        assert_eq!(
            position.realized_pnl(),
            Money::new(dec!(2.00), Currency::Usd)
        );
    }

    #[test]
    fn closed_position_rejects_further_fills() {
        let open = fill_event("O-1", "E-1", OrderSide::Buy, 100, "1.00000");
        let mut position = Position::new(PositionId::from("P-1"), &open).unwrap();
        let close = fill_event("O-2", "E-2", OrderSide::Sell, 100, "1.00000");
        position.apply(&close).unwrap();

        let reopen = fill_event("O-3", "E-3", OrderSide::Buy, 100, "1.00000");
        let err = position.apply(&reopen).unwrap_err();
        assert!(matches!(err, TradingError::InvalidStateTrigger(_)));
    }

    #[test]
    fn order_and_execution_ids_are_tracked() {
        let open = fill_event("O-1", "E-1", OrderSide::Buy, 100, "1.00000");
        let mut position = Position::new(PositionId::from("P-1"), &open).unwrap();
        let add = fill_event("O-1", "E-2", OrderSide::Buy, 100, "1.00002");
        position.apply(&add).unwrap();

        assert_eq!(position.order_ids().len(), 1);
        assert_eq!(position.execution_ids().len(), 2);
        assert_eq!(position.last_execution_id().unwrap().as_str(), "E-2");
        assert_eq!(position.events().len(), 2);
    }

    #[test]
    fn rebuild_from_event_log_matches_original() {
        let open = fill_event("O-1", "E-1", OrderSide::Buy, 100_000, "1.00000");
        let mut position = Position::new(PositionId::from("P-1"), &open).unwrap();
        let reduce = fill_event("O-2", "E-2", OrderSide::Sell, 40_000, "1.00005");
        position.apply(&reduce).unwrap();

        let events = position.events().to_vec();
        let mut rebuilt = Position::new(position.id().clone(), &events[0]).unwrap();
        for event in &events[1..] {
            rebuilt.apply(event).unwrap();
        }
        assert_eq!(rebuilt, position);
    }
}
