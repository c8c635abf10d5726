//! The simulated venue: a deterministic matching engine over quote ticks.
//!
//! Matching policy, applied per incoming tick for a symbol:
//!
//! 1. Update the top-of-book snapshot.
//! 2. Scan working orders in FIFO submission order: expire GTD orders whose
//!    time has come, then check triggers — limit buys at `ask <= limit`,
//!    limit sells at `bid >= limit`, stop buys at `ask >= stop`, stop sells
//!    at `bid <= stop`. Triggered orders consult the seeded [`FillModel`]
//!    for the execution price and (optionally scripted) fill quantity.
//! 3. Orders submitted against the current snapshot are acknowledged
//!    (`Submitted` then `Accepted`), filled immediately when their trigger
//!    already holds, and otherwise acknowledged `Working` and enqueued.
//!
//! Brackets register their children one-cancels-other: a child fill or
//! expiry cancels the sibling.
//!
//! Commission (`notional * rate_bp / 10000`) and nightly rollover interest
//! accrue against the venue-side account; a frozen account disables both.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;

use super::commands::{
    AccountInquiry, CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder,
};
use super::fill_model::FillModel;
use super::venue::ExecutionClient;
use crate::accounts::AccountStateEvent;
use crate::events::Event;
use crate::identifiers::{
    AccountId, ExecutionId, OrderId, OrderIdBroker, PositionId, PositionIdBroker, Symbol,
    UuidFactory,
};
use crate::orders::{
    Order, OrderAccepted, OrderCancelReject, OrderCancelled, OrderEventAny, OrderExpired,
    OrderFilled, OrderModified, OrderPartiallyFilled, OrderRejected, OrderSide, OrderSubmitted,
    OrderType, OrderWorking, TimeInForce,
};
use crate::types::{Currency, Money, Price, Quantity, QuoteTick};

#[derive(Debug, Clone)]
pub struct SimulatedVenueConfig {
    pub venue_name: String,
    pub account_id: AccountId,
    pub account_currency: Currency,
    pub starting_capital: Decimal,
    /// Commission per fill, in basis points of notional.
    pub commission_rate_bp: Decimal,
    /// Annualized short-term interest rate for nightly rollover.
    pub rollover_interest_rate: Decimal,
    /// Disables PnL, commission and rollover application.
    pub frozen_account: bool,
}

impl Default for SimulatedVenueConfig {
    fn default() -> Self {
        Self {
            venue_name: "SIM".to_string(),
            account_id: AccountId::from("SIM-000"),
            account_currency: Currency::Usd,
            starting_capital: Decimal::from(1_000_000),
            commission_rate_bp: Decimal::ZERO,
            rollover_interest_rate: Decimal::ZERO,
            frozen_account: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Book {
    bid: Price,
    ask: Price,
}

#[derive(Debug, Clone)]
struct WorkingOrder {
    order_id: OrderId,
    order_id_broker: OrderIdBroker,
    account_id: AccountId,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    price: Option<Price>,
    time_in_force: TimeInForce,
    expire_time: Option<DateTime<Utc>>,
    quantity: Quantity,
    leaves: Decimal,
    position_id_broker: PositionIdBroker,
    quote_currency: Currency,
}

#[derive(Debug, Clone, Copy, Default)]
struct NetPosition {
    quantity: Decimal,
    average_price: Decimal,
}

/// The deterministic simulated venue adapter.
#[derive(Debug)]
pub struct SimulatedVenue {
    config: SimulatedVenueConfig,
    fill_model: FillModel,
    books: HashMap<Symbol, Book>,
    working_orders: Vec<WorkingOrder>,
    oco_siblings: HashMap<OrderId, OrderId>,
    position_brokers: HashMap<PositionId, PositionIdBroker>,
    net_positions: HashMap<Symbol, NetPosition>,
    account_cash: Decimal,
    commission_paid: Decimal,
    rollover_accrued: Decimal,
    current_time: DateTime<Utc>,
    last_rollover_date: Option<NaiveDate>,
    uuids: UuidFactory,
    broker_order_count: u64,
    execution_count: u64,
    broker_position_count: u64,
}

impl SimulatedVenue {
    pub fn new(config: SimulatedVenueConfig, fill_model: FillModel) -> Self {
        let account_cash = config.starting_capital;
        Self {
            config,
            fill_model,
            books: HashMap::new(),
            working_orders: Vec::new(),
            oco_siblings: HashMap::new(),
            position_brokers: HashMap::new(),
            net_positions: HashMap::new(),
            account_cash,
            commission_paid: Decimal::ZERO,
            rollover_accrued: Decimal::ZERO,
            current_time: DateTime::UNIX_EPOCH,
            last_rollover_date: None,
            uuids: UuidFactory::deterministic(0x51),
            broker_order_count: 0,
            execution_count: 0,
            broker_position_count: 0,
        }
    }

    pub fn account_cash(&self) -> Money {
        Money::new(self.account_cash, self.config.account_currency)
    }

    pub fn commission_paid(&self) -> Money {
        Money::new(self.commission_paid, self.config.account_currency)
    }

    pub fn rollover_accrued(&self) -> Money {
        Money::new(self.rollover_accrued, self.config.account_currency)
    }

    pub fn working_order_count(&self) -> usize {
        self.working_orders.len()
    }

    // === Internal id generation ===

    fn next_broker_order_id(&mut self) -> OrderIdBroker {
        self.broker_order_count += 1;
        OrderIdBroker::from(format!("B-{}", self.broker_order_count))
    }

    fn next_execution_id(&mut self) -> ExecutionId {
        self.execution_count += 1;
        ExecutionId::from(format!("E-{}", self.execution_count))
    }

    fn broker_position_id(&mut self, position_id: &PositionId) -> PositionIdBroker {
        if let Some(existing) = self.position_brokers.get(position_id) {
            return existing.clone();
        }
        self.broker_position_count += 1;
        let id = PositionIdBroker::from(format!("ET-{}", self.broker_position_count));
        self.position_brokers.insert(position_id.clone(), id.clone());
        id
    }

    fn quote_currency_of(&self, symbol: &Symbol) -> Currency {
        let code = symbol.code();
        if code.len() >= 3 {
            if let Ok(currency) = Currency::from_str(&code[code.len() - 3..]) {
                return currency;
            }
        }
        self.config.account_currency
    }

    // === Event construction ===

    fn submitted_event(&mut self, order_id: &OrderId, account_id: &AccountId) -> Event {
        Event::Order(OrderEventAny::Submitted(OrderSubmitted {
            order_id: order_id.clone(),
            account_id: account_id.clone(),
            submitted_time: self.current_time,
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    fn accepted_event(&mut self, order_id: &OrderId, account_id: &AccountId) -> Event {
        Event::Order(OrderEventAny::Accepted(OrderAccepted {
            order_id: order_id.clone(),
            account_id: account_id.clone(),
            accepted_time: self.current_time,
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    fn rejected_event(&mut self, order_id: &OrderId, account_id: &AccountId, reason: &str) -> Event {
        Event::Order(OrderEventAny::Rejected(OrderRejected {
            order_id: order_id.clone(),
            account_id: account_id.clone(),
            rejected_time: self.current_time,
            reason: reason.to_string(),
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    fn working_event(&mut self, entry: &WorkingOrder) -> Event {
        Event::Order(OrderEventAny::Working(OrderWorking {
            order_id: entry.order_id.clone(),
            order_id_broker: entry.order_id_broker.clone(),
            account_id: entry.account_id.clone(),
            symbol: entry.symbol.clone(),
            side: entry.side,
            order_type: entry.order_type,
            quantity: entry.quantity,
            price: entry.price.expect("passive orders carry a price"),
            time_in_force: entry.time_in_force,
            expire_time: entry.expire_time,
            working_time: self.current_time,
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    fn cancelled_event(&mut self, order_id: &OrderId, account_id: &AccountId) -> Event {
        Event::Order(OrderEventAny::Cancelled(OrderCancelled {
            order_id: order_id.clone(),
            account_id: account_id.clone(),
            cancelled_time: self.current_time,
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    fn cancel_reject_event(
        &mut self,
        order_id: &OrderId,
        account_id: &AccountId,
        response_to: &str,
        reason: &str,
    ) -> Event {
        Event::Order(OrderEventAny::CancelReject(OrderCancelReject {
            order_id: order_id.clone(),
            account_id: account_id.clone(),
            rejected_time: self.current_time,
            response_to: response_to.to_string(),
            reason: reason.to_string(),
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    fn expired_event(&mut self, entry: &WorkingOrder) -> Event {
        Event::Order(OrderEventAny::Expired(OrderExpired {
            order_id: entry.order_id.clone(),
            account_id: entry.account_id.clone(),
            expired_time: self.current_time,
            id: self.uuids.generate(),
            timestamp: self.current_time,
        }))
    }

    // === Matching ===

    fn trigger_satisfied(entry: &WorkingOrder, book: &Book) -> bool {
        match entry.order_type {
            OrderType::Market => true,
            OrderType::Limit => {
                let limit = entry.price.expect("limit orders carry a price").as_decimal();
                match entry.side {
                    OrderSide::Buy => book.ask.as_decimal() <= limit,
                    OrderSide::Sell => book.bid.as_decimal() >= limit,
                }
            }
            OrderType::Stop => {
                let stop = entry.price.expect("stop orders carry a price").as_decimal();
                match entry.side {
                    OrderSide::Buy => book.ask.as_decimal() >= stop,
                    OrderSide::Sell => book.bid.as_decimal() <= stop,
                }
            }
        }
    }

    /// One adverse tick for the entry's side, falling back to the base
    /// price when the offset would be invalid.
    fn adverse_tick(entry: &WorkingOrder, base: Price) -> Price {
        let ticks = match entry.side {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        };
        match base.offset_ticks(ticks) {
            Ok(price) => price,
            Err(_) => base,
        }
    }

    fn execution_price(&mut self, entry: &WorkingOrder, book: &Book) -> Price {
        match entry.order_type {
            OrderType::Limit => {
                let limit = entry.price.expect("limit orders carry a price");
                if self.fill_model.is_filled_at_limit() {
                    limit
                } else {
                    Self::adverse_tick(entry, limit)
                }
            }
            OrderType::Stop => {
                let stop = entry.price.expect("stop orders carry a price");
                if self.fill_model.is_slipped() {
                    Self::adverse_tick(entry, stop)
                } else {
                    stop
                }
            }
            OrderType::Market => {
                let base = match entry.side {
                    OrderSide::Buy => book.ask,
                    OrderSide::Sell => book.bid,
                };
                if self.fill_model.is_slipped() {
                    Self::adverse_tick(entry, base)
                } else {
                    base
                }
            }
        }
    }

    /// Execute a trigger on the entry at `index`, consulting the fill model
    /// for quantity. Emits the fill events, applies account effects, and
    /// removes fully filled entries (cancelling any OCO sibling).
    fn fill_at(&mut self, index: usize, price: Price, events: &mut Vec<Event>) {
        let leaves = self.working_orders[index].leaves;
        let lot = match self.fill_model.next_partial_quantity() {
            Some(q) if q.is_zero() => return,
            Some(q) => q.as_decimal().min(leaves),
            None => leaves,
        };
        let entry = self.working_orders[index].clone();
        let execution_id = self.next_execution_id();
        let lot_quantity = match Quantity::new(lot, entry.quantity.precision()) {
            Ok(q) => q,
            Err(e) => {
                tracing::error!(order = %entry.order_id, error = %e, "fill lot rejected");
                return;
            }
        };
        let remaining = leaves - lot;

        if remaining.is_zero() {
            events.push(Event::Order(OrderEventAny::Filled(OrderFilled {
                order_id: entry.order_id.clone(),
                account_id: entry.account_id.clone(),
                execution_id,
                position_id_broker: entry.position_id_broker.clone(),
                symbol: entry.symbol.clone(),
                side: entry.side,
                filled_quantity: lot_quantity,
                average_price: price,
                quote_currency: entry.quote_currency,
                execution_time: self.current_time,
                id: self.uuids.generate(),
                timestamp: self.current_time,
            })));
            self.working_orders.remove(index);
            self.cancel_sibling(&entry.order_id, events);
        } else {
            let leaves_quantity = match Quantity::new(remaining, entry.quantity.precision()) {
                Ok(q) => q,
                Err(e) => {
                    tracing::error!(order = %entry.order_id, error = %e, "leaves rejected");
                    return;
                }
            };
            events.push(Event::Order(OrderEventAny::PartiallyFilled(
                OrderPartiallyFilled {
                    order_id: entry.order_id.clone(),
                    account_id: entry.account_id.clone(),
                    execution_id,
                    position_id_broker: entry.position_id_broker.clone(),
                    symbol: entry.symbol.clone(),
                    side: entry.side,
                    filled_quantity: lot_quantity,
                    leaves_quantity,
                    average_price: price,
                    quote_currency: entry.quote_currency,
                    execution_time: self.current_time,
                    id: self.uuids.generate(),
                    timestamp: self.current_time,
                },
            )));
            self.working_orders[index].leaves = remaining;
        }

        self.apply_fill_to_account(&entry, lot, price.as_decimal());
    }

    fn cancel_sibling(&mut self, order_id: &OrderId, events: &mut Vec<Event>) {
        let Some(sibling_id) = self.oco_siblings.remove(order_id) else {
            return;
        };
        self.oco_siblings.remove(&sibling_id);
        if let Some(index) = self
            .working_orders
            .iter()
            .position(|w| w.order_id == sibling_id)
        {
            let sibling = self.working_orders.remove(index);
            let event = self.cancelled_event(&sibling.order_id, &sibling.account_id);
            events.push(event);
        }
    }

    fn apply_fill_to_account(&mut self, entry: &WorkingOrder, lot: Decimal, price: Decimal) {
        if self.config.frozen_account {
            return;
        }
        let notional = lot * price;
        let commission = notional * self.config.commission_rate_bp / Decimal::from(10_000);
        self.commission_paid += commission;
        self.account_cash -= commission;

        let position = self.net_positions.entry(entry.symbol.clone()).or_default();
        let signed = entry.side.sign() * lot;
        if position.quantity.is_zero() || position.quantity.signum() == signed.signum() {
            let open = position.quantity.abs();
            position.average_price = (position.average_price * open + price * lot) / (open + lot);
            position.quantity += signed;
        } else {
            let reduced = lot.min(position.quantity.abs());
            let realized = (price - position.average_price) * reduced * position.quantity.signum();
            self.account_cash += realized;
            position.quantity += signed;
            if position.quantity.is_zero() {
                position.average_price = Decimal::ZERO;
            } else if position.quantity.signum() == signed.signum() {
                // The fill flipped through flat.
                position.average_price = price;
            }
        }
    }

    fn apply_rollover(&mut self, tick_time: DateTime<Utc>) {
        let date = tick_time.date_naive();
        match self.last_rollover_date {
            None => self.last_rollover_date = Some(date),
            Some(last) if date > last => {
                self.last_rollover_date = Some(date);
                if self.config.frozen_account || self.config.rollover_interest_rate.is_zero() {
                    return;
                }
                let daily_rate = self.config.rollover_interest_rate / Decimal::from(365);
                let mut accrual = Decimal::ZERO;
                for position in self.net_positions.values() {
                    if !position.quantity.is_zero() {
                        accrual += position.quantity * position.average_price * daily_rate;
                    }
                }
                self.rollover_accrued += accrual;
                self.account_cash += accrual;
            }
            _ => {}
        }
    }

    /// Enqueue a validated order and either fill it against the current
    /// snapshot or acknowledge it working.
    fn activate_order(
        &mut self,
        order: &Order,
        account_id: &AccountId,
        position_id: &PositionId,
        events: &mut Vec<Event>,
    ) {
        let position_id_broker = self.broker_position_id(position_id);
        let entry = WorkingOrder {
            order_id: order.id().clone(),
            order_id_broker: self.next_broker_order_id(),
            account_id: account_id.clone(),
            symbol: order.symbol().clone(),
            side: order.side(),
            order_type: order.order_type(),
            price: order.price(),
            time_in_force: order.time_in_force(),
            expire_time: order.expire_time(),
            quantity: order.quantity(),
            leaves: order.quantity().as_decimal(),
            position_id_broker,
            quote_currency: self.quote_currency_of(order.symbol()),
        };

        let book = self.books.get(order.symbol()).copied();
        self.working_orders.push(entry);
        let index = self.working_orders.len() - 1;

        match book {
            Some(book) if Self::trigger_satisfied(&self.working_orders[index], &book) => {
                let entry_snapshot = self.working_orders[index].clone();
                let price = self.execution_price(&entry_snapshot, &book);
                self.fill_at(index, price, events);
            }
            _ => {
                let entry_snapshot = self.working_orders[index].clone();
                let event = self.working_event(&entry_snapshot);
                events.push(event);
            }
        }
    }

    fn submit_single(
        &mut self,
        order: &Order,
        account_id: &AccountId,
        position_id: &PositionId,
        events: &mut Vec<Event>,
    ) {
        let event = self.submitted_event(order.id(), account_id);
        events.push(event);

        if self
            .working_orders
            .iter()
            .any(|w| &w.order_id == order.id())
        {
            let event = self.rejected_event(order.id(), account_id, "duplicate order id");
            events.push(event);
            return;
        }
        if order.order_type() == OrderType::Market && !self.books.contains_key(order.symbol()) {
            let event = self.rejected_event(
                order.id(),
                account_id,
                &format!("no market data for {}", order.symbol()),
            );
            events.push(event);
            return;
        }

        let event = self.accepted_event(order.id(), account_id);
        events.push(event);
        self.activate_order(order, account_id, position_id, events);
    }
}

impl ExecutionClient for SimulatedVenue {
    fn venue_name(&self) -> &str {
        &self.config.venue_name
    }

    fn account_inquiry(&mut self, command: &AccountInquiry) -> Vec<Event> {
        self.current_time = self.current_time.max(command.timestamp);
        let currency = self.config.account_currency;
        vec![Event::Account(AccountStateEvent {
            account_id: self.config.account_id.clone(),
            currency,
            cash_balance: Money::new(self.account_cash, currency),
            cash_start_day: Money::new(self.config.starting_capital, currency),
            cash_activity_day: Money::new(
                self.account_cash - self.config.starting_capital,
                currency,
            ),
            margin_used_liquidation: Money::zero(currency),
            margin_used_maintenance: Money::zero(currency),
            margin_ratio: Decimal::ZERO,
            margin_call_status: "N".to_string(),
            id: self.uuids.generate(),
            timestamp: self.current_time,
        })]
    }

    fn submit_order(&mut self, command: &SubmitOrder) -> Vec<Event> {
        self.current_time = self.current_time.max(command.timestamp);
        let mut events = Vec::new();
        self.submit_single(
            &command.order,
            &command.account_id,
            &command.position_id,
            &mut events,
        );
        events
    }

    fn submit_bracket_order(&mut self, command: &SubmitBracketOrder) -> Vec<Event> {
        self.current_time = self.current_time.max(command.timestamp);
        let mut events = Vec::new();
        let bracket = &command.bracket_order;

        self.submit_single(
            bracket.entry(),
            &command.account_id,
            &command.position_id,
            &mut events,
        );
        self.submit_single(
            bracket.stop_loss(),
            &command.account_id,
            &command.position_id,
            &mut events,
        );
        if let Some(take_profit) = bracket.take_profit() {
            self.submit_single(
                take_profit,
                &command.account_id,
                &command.position_id,
                &mut events,
            );
            self.oco_siblings.insert(
                bracket.stop_loss().id().clone(),
                take_profit.id().clone(),
            );
            self.oco_siblings.insert(
                take_profit.id().clone(),
                bracket.stop_loss().id().clone(),
            );
        }
        events
    }

    fn modify_order(&mut self, command: &ModifyOrder) -> Vec<Event> {
        self.current_time = self.current_time.max(command.timestamp);
        let mut events = Vec::new();
        let Some(index) = self
            .working_orders
            .iter()
            .position(|w| w.order_id == command.order_id)
        else {
            let event = self.cancel_reject_event(
                &command.order_id,
                &command.account_id,
                "ModifyOrder",
                "order not found",
            );
            events.push(event);
            return events;
        };

        let filled = self.working_orders[index].quantity.as_decimal()
            - self.working_orders[index].leaves;
        let new_leaves = command.modified_quantity.as_decimal() - filled;
        if new_leaves <= Decimal::ZERO {
            let event = self.cancel_reject_event(
                &command.order_id,
                &command.account_id,
                "ModifyOrder",
                "modified quantity does not exceed the filled quantity",
            );
            events.push(event);
            return events;
        }

        {
            let entry = &mut self.working_orders[index];
            entry.quantity = command.modified_quantity;
            entry.leaves = new_leaves;
            entry.price = Some(command.modified_price);
        }
        let entry = self.working_orders[index].clone();
        events.push(Event::Order(OrderEventAny::Modified(OrderModified {
            order_id: entry.order_id.clone(),
            order_id_broker: entry.order_id_broker.clone(),
            account_id: entry.account_id.clone(),
            modified_quantity: command.modified_quantity,
            modified_price: command.modified_price,
            modified_time: self.current_time,
            id: self.uuids.generate(),
            timestamp: self.current_time,
        })));
        events
    }

    fn cancel_order(&mut self, command: &CancelOrder) -> Vec<Event> {
        self.current_time = self.current_time.max(command.timestamp);
        let mut events = Vec::new();
        match self
            .working_orders
            .iter()
            .position(|w| w.order_id == command.order_id)
        {
            Some(index) => {
                let entry = self.working_orders.remove(index);
                self.oco_siblings.remove(&entry.order_id);
                let event = self.cancelled_event(&entry.order_id, &entry.account_id);
                events.push(event);
            }
            None => {
                let event = self.cancel_reject_event(
                    &command.order_id,
                    &command.account_id,
                    "CancelOrder",
                    "order not found",
                );
                events.push(event);
            }
        }
        events
    }

    fn process_tick(&mut self, tick: &QuoteTick) -> Vec<Event> {
        self.current_time = tick.timestamp;
        self.apply_rollover(tick.timestamp);
        let book = Book {
            bid: tick.bid,
            ask: tick.ask,
        };
        self.books.insert(tick.symbol.clone(), book);

        let mut events = Vec::new();
        let scan: Vec<OrderId> = self
            .working_orders
            .iter()
            .filter(|w| w.symbol == tick.symbol)
            .map(|w| w.order_id.clone())
            .collect();

        for order_id in scan {
            // An OCO cancellation earlier in the scan may have removed it.
            let Some(index) = self
                .working_orders
                .iter()
                .position(|w| w.order_id == order_id)
            else {
                continue;
            };

            let expired = self.working_orders[index].time_in_force == TimeInForce::Gtd
                && self.working_orders[index]
                    .expire_time
                    .map(|expire| self.current_time >= expire)
                    .unwrap_or(false);
            if expired {
                let entry = self.working_orders.remove(index);
                let event = self.expired_event(&entry);
                events.push(event);
                self.cancel_sibling(&entry.order_id, &mut events);
                continue;
            }

            if !Self::trigger_satisfied(&self.working_orders[index], &book) {
                continue;
            }
            let entry_snapshot = self.working_orders[index].clone();
            let price = self.execution_price(&entry_snapshot, &book);
            self.fill_at(index, price, &mut events);
        }
        events
    }

    fn reset(&mut self) {
        self.books.clear();
        self.working_orders.clear();
        self.oco_siblings.clear();
        self.position_brokers.clear();
        self.net_positions.clear();
        self.account_cash = self.config.starting_capital;
        self.commission_paid = Decimal::ZERO;
        self.rollover_accrued = Decimal::ZERO;
        self.current_time = DateTime::UNIX_EPOCH;
        self.last_rollover_date = None;
        self.uuids.reset();
        self.fill_model.reset();
        self.broker_order_count = 0;
        self.execution_count = 0;
        self.broker_position_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn audusd() -> Symbol {
        Symbol::new("AUDUSD", "FXCM").unwrap()
    }

    fn tick(bid: &str, ask: &str, secs: i64) -> QuoteTick {
        QuoteTick::new(
            audusd(),
            Price::parse(bid).unwrap(),
            Price::parse(ask).unwrap(),
            Quantity::from_units(1_000_000),
            Quantity::from_units(1_000_000),
            at(secs),
        )
    }

    fn venue() -> SimulatedVenue {
        SimulatedVenue::new(SimulatedVenueConfig::default(), FillModel::deterministic_fill(42))
    }

    fn limit_buy(id: &str, price: &str, qty: u64) -> Order {
        Order::new(
            OrderId::from(id),
            audusd(),
            OrderSide::Buy,
            OrderType::Limit,
            Quantity::from_units(qty),
            TimeInForce::Gtc,
            Some(Price::parse(price).unwrap()),
            None,
            Uuid::from_u128(1),
            at(0),
        )
        .unwrap()
    }

    fn market_order(id: &str, side: OrderSide, qty: u64) -> Order {
        Order::new(
            OrderId::from(id),
            audusd(),
            side,
            OrderType::Market,
            Quantity::from_units(qty),
            TimeInForce::Day,
            None,
            None,
            Uuid::from_u128(2),
            at(0),
        )
        .unwrap()
    }

    fn submit(order: Order, secs: i64) -> SubmitOrder {
        SubmitOrder {
            trader_id: crate::identifiers::TraderId::from("TESTER-000"),
            account_id: AccountId::from("SIM-000"),
            strategy_id: crate::identifiers::StrategyId::from("S-001"),
            position_id: PositionId::from("P-1"),
            order,
            id: Uuid::from_u128(100),
            timestamp: at(secs),
        }
    }

    fn order_event_names(events: &[Event]) -> Vec<&'static str> {
        events.iter().map(|e| e.type_name()).collect()
    }

    #[test]
    fn resting_limit_fills_when_ask_reaches_limit() {
        let mut venue = venue();
        venue.process_tick(&tick("1.20005", "1.20010", 0));

        let events = venue.submit_order(&submit(limit_buy("O-1", "1.20000", 100), 0));
        assert_eq!(
            order_event_names(&events),
            vec!["OrderSubmitted", "OrderAccepted", "OrderWorking"]
        );

        let events = venue.process_tick(&tick("1.19995", "1.20000", 1));
        assert_eq!(order_event_names(&events), vec!["OrderFilled"]);
        match &events[0] {
            Event::Order(OrderEventAny::Filled(fill)) => {
                assert_eq!(fill.average_price.as_decimal(), dec!(1.20000));
                assert_eq!(fill.filled_quantity, Quantity::from_units(100));
                assert_eq!(fill.execution_time, at(1));
            }
            other => panic!("expected a fill, got {other:?}"),
        }
        assert_eq!(venue.working_order_count(), 0);
    }

    #[test]
    fn limit_already_triggered_fills_on_submission() {
        let mut venue = venue();
        venue.process_tick(&tick("1.19990", "1.19995", 0));

        let events = venue.submit_order(&submit(limit_buy("O-1", "1.20000", 100), 0));
        assert_eq!(
            order_event_names(&events),
            vec!["OrderSubmitted", "OrderAccepted", "OrderFilled"]
        );
    }

    #[test]
    fn market_order_without_market_data_is_rejected() {
        let mut venue = venue();
        let events = venue.submit_order(&submit(market_order("O-1", OrderSide::Buy, 100), 0));
        assert_eq!(
            order_event_names(&events),
            vec!["OrderSubmitted", "OrderRejected"]
        );
    }

    #[test]
    fn market_order_fills_at_the_book() {
        let mut venue = venue();
        venue.process_tick(&tick("1.20000", "1.20003", 0));
        let events = venue.submit_order(&submit(market_order("O-1", OrderSide::Buy, 100), 0));
        match events.last() {
            Some(Event::Order(OrderEventAny::Filled(fill))) => {
                assert_eq!(fill.average_price.as_decimal(), dec!(1.20003));
            }
            other => panic!("expected a fill, got {other:?}"),
        }
    }

    #[test]
    fn gtd_order_expires_on_first_tick_at_or_after_expiry() {
        let mut venue = venue();
        venue.process_tick(&tick("1.20005", "1.20010", 0));

        let order = Order::new(
            OrderId::from("O-1"),
            audusd(),
            OrderSide::Buy,
            OrderType::Limit,
            Quantity::from_units(100),
            TimeInForce::Gtd,
            Some(Price::parse("1.19000").unwrap()),
            Some(at(10)),
            Uuid::from_u128(3),
            at(0),
        )
        .unwrap();
        venue.submit_order(&submit(order, 0));
        assert_eq!(venue.working_order_count(), 1);

        let events = venue.process_tick(&tick("1.20005", "1.20010", 10));
        assert_eq!(order_event_names(&events), vec!["OrderExpired"]);
        assert_eq!(venue.working_order_count(), 0);
    }

    #[test]
    fn scripted_partial_fill_then_no_fill() {
        let fill_model = FillModel::deterministic_fill(42)
            .with_partial_fills(vec![Quantity::from_units(40), Quantity::zero(0)]);
        let mut venue = SimulatedVenue::new(SimulatedVenueConfig::default(), fill_model);
        venue.process_tick(&tick("1.20005", "1.20010", 0));
        venue.submit_order(&submit(limit_buy("O-1", "1.20000", 100), 0));

        let events = venue.process_tick(&tick("1.19995", "1.20000", 1));
        assert_eq!(order_event_names(&events), vec!["OrderPartiallyFilled"]);
        match &events[0] {
            Event::Order(OrderEventAny::PartiallyFilled(fill)) => {
                assert_eq!(fill.filled_quantity, Quantity::from_units(40));
                assert_eq!(fill.leaves_quantity, Quantity::from_units(60));
            }
            other => panic!("expected a partial fill, got {other:?}"),
        }

        // The scripted zero yields no fill on the next trigger.
        let events = venue.process_tick(&tick("1.19995", "1.20000", 2));
        assert!(events.is_empty());
        assert_eq!(venue.working_order_count(), 1);
    }

    #[test]
    fn cancel_of_unknown_order_is_rejected() {
        let mut venue = venue();
        let events = venue.cancel_order(&CancelOrder {
            trader_id: crate::identifiers::TraderId::from("TESTER-000"),
            account_id: AccountId::from("SIM-000"),
            order_id: OrderId::from("O-404"),
            cancel_reason: "USER".to_string(),
            id: Uuid::from_u128(101),
            timestamp: at(0),
        });
        assert_eq!(order_event_names(&events), vec!["OrderCancelReject"]);
    }

    #[test]
    fn modify_updates_price_and_quantity() {
        let mut venue = venue();
        venue.process_tick(&tick("1.20005", "1.20010", 0));
        venue.submit_order(&submit(limit_buy("O-1", "1.20000", 10), 0));

        let events = venue.modify_order(&ModifyOrder {
            trader_id: crate::identifiers::TraderId::from("TESTER-000"),
            account_id: AccountId::from("SIM-000"),
            order_id: OrderId::from("O-1"),
            modified_quantity: Quantity::from_units(8),
            modified_price: Price::parse("1.19000").unwrap(),
            id: Uuid::from_u128(102),
            timestamp: at(1),
        });
        assert_eq!(order_event_names(&events), vec!["OrderModified"]);

        // Fills at the modified price for the modified quantity.
        let events = venue.process_tick(&tick("1.18995", "1.19000", 2));
        match &events[0] {
            Event::Order(OrderEventAny::Filled(fill)) => {
                assert_eq!(fill.average_price.as_decimal(), dec!(1.19000));
                assert_eq!(fill.filled_quantity, Quantity::from_units(8));
            }
            other => panic!("expected a fill, got {other:?}"),
        }
    }

    #[test]
    fn prob_fill_at_limit_zero_slips_one_tick() {
        let fill_model = FillModel::new(0.0, 0.0, 42).unwrap();
        let mut venue = SimulatedVenue::new(SimulatedVenueConfig::default(), fill_model);
        venue.process_tick(&tick("1.20005", "1.20010", 0));
        venue.submit_order(&submit(limit_buy("O-1", "1.20000", 100), 0));

        let events = venue.process_tick(&tick("1.19995", "1.20000", 1));
        match &events[0] {
            Event::Order(OrderEventAny::Filled(fill)) => {
                assert_eq!(fill.average_price.as_decimal(), dec!(1.20001));
            }
            other => panic!("expected a fill, got {other:?}"),
        }
    }

    #[test]
    fn commission_reduces_account_cash() {
        let config = SimulatedVenueConfig {
            commission_rate_bp: dec!(1),
            ..Default::default()
        };
        let mut venue = SimulatedVenue::new(config, FillModel::deterministic_fill(42));
        venue.process_tick(&tick("1.00000", "1.00000", 0));
        venue.submit_order(&submit(market_order("O-1", OrderSide::Buy, 100_000), 0));

        // notional 100_000 * 1.00000, commission at 1bp = 10.
        assert_eq!(
            venue.commission_paid(),
            Money::new(dec!(10), Currency::Usd)
        );
        assert_eq!(
            venue.account_cash(),
            Money::new(dec!(999990), Currency::Usd)
        );
    }

    #[test]
    fn frozen_account_ignores_pnl_and_commission() {
        let config = SimulatedVenueConfig {
            commission_rate_bp: dec!(1),
            frozen_account: true,
            ..Default::default()
        };
        let mut venue = SimulatedVenue::new(config, FillModel::deterministic_fill(42));
        venue.process_tick(&tick("1.00000", "1.00000", 0));
        venue.submit_order(&submit(market_order("O-1", OrderSide::Buy, 100_000), 0));
        assert_eq!(
            venue.account_cash(),
            Money::new(dec!(1000000), Currency::Usd)
        );
    }

    #[test]
    fn rollover_accrues_across_day_boundary() {
        let config = SimulatedVenueConfig {
            rollover_interest_rate: dec!(0.0365),
            ..Default::default()
        };
        let mut venue = SimulatedVenue::new(config, FillModel::deterministic_fill(42));
        venue.process_tick(&tick("1.00000", "1.00000", 0));
        venue.submit_order(&submit(market_order("O-1", OrderSide::Buy, 100_000), 0));

        // Crossing into the next UTC day accrues qty * price * rate / 365.
        venue.process_tick(&tick("1.00000", "1.00000", 86_400));
        assert_eq!(
            venue.rollover_accrued(),
            Money::new(dec!(10), Currency::Usd)
        );
    }

    #[test]
    fn account_inquiry_reports_cash_state() {
        let mut venue = venue();
        let events = venue.account_inquiry(&AccountInquiry {
            trader_id: crate::identifiers::TraderId::from("TESTER-000"),
            account_id: AccountId::from("SIM-000"),
            id: Uuid::from_u128(103),
            timestamp: at(0),
        });
        match &events[0] {
            Event::Account(state) => {
                assert_eq!(state.cash_balance.amount(), dec!(1000000));
                assert_eq!(state.margin_call_status, "N");
            }
            other => panic!("expected an account event, got {other:?}"),
        }
    }

    #[test]
    fn replays_are_byte_identical() {
        let run = || {
            let fill_model = FillModel::new(0.5, 0.5, 7).unwrap();
            let mut venue = SimulatedVenue::new(SimulatedVenueConfig::default(), fill_model);
            let mut all = Vec::new();
            all.extend(venue.process_tick(&tick("1.20005", "1.20010", 0)));
            all.extend(venue.submit_order(&submit(limit_buy("O-1", "1.20000", 100), 0)));
            all.extend(venue.process_tick(&tick("1.19995", "1.20000", 1)));
            all.extend(venue.process_tick(&tick("1.19990", "1.19995", 2)));
            all
        };

        let serializer = crate::serialization::EventSerializer::new();
        let serialize_all = |events: &[Event]| -> Vec<Vec<u8>> {
            events
                .iter()
                .map(|e| serializer.serialize(e).unwrap())
                .collect()
        };
        assert_eq!(serialize_all(&run()), serialize_all(&run()));
    }
}
