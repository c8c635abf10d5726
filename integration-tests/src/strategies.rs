//! Scripted strategies driving the scenario suite.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tradewind_common::clock::Clock;
use tradewind_common::events::Event;
use tradewind_common::identifiers::{OrderId, StrategyId, Symbol};
use tradewind_common::orders::{OrderEventAny, OrderSide, TimeInForce};
use tradewind_common::strategy::{Strategy, StrategyContext};
use tradewind_common::types::{Price, Quantity, QuoteTick};

/// A log of everything a strategy observed, shared with the test body.
#[derive(Debug, Default)]
pub struct ObservedEvents {
    pub events: Vec<String>,
    pub time_events: Vec<DateTime<Utc>>,
    pub ticks_seen: usize,
}

pub type SharedObservations = Rc<RefCell<ObservedEvents>>;

pub fn observations() -> SharedObservations {
    Rc::new(RefCell::new(ObservedEvents::default()))
}

/// Submits one limit order on the first tick, then records what happens.
pub struct LimitEntryStrategy {
    id: StrategyId,
    symbol: Symbol,
    side: OrderSide,
    quantity: Quantity,
    price: Price,
    time_in_force: TimeInForce,
    expire_time: Option<DateTime<Utc>>,
    submitted: bool,
    cancel_on_stop: bool,
    pub order_id: Option<OrderId>,
    observations: SharedObservations,
}

impl LimitEntryStrategy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
        time_in_force: TimeInForce,
        expire_time: Option<DateTime<Utc>>,
        observations: SharedObservations,
    ) -> Self {
        Self {
            id: StrategyId::from(id),
            symbol,
            side,
            quantity,
            price,
            time_in_force,
            expire_time,
            submitted: false,
            cancel_on_stop: true,
            order_id: None,
            observations,
        }
    }

    /// Leave working orders on the venue at stop.
    pub fn keep_orders_on_stop(mut self) -> Self {
        self.cancel_on_stop = false;
        self
    }
}

impl Strategy for LimitEntryStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn on_tick(&mut self, _tick: &QuoteTick, ctx: &mut StrategyContext) {
        self.observations.borrow_mut().ticks_seen += 1;
        if self.submitted {
            return;
        }
        self.submitted = true;
        let now = ctx.clock.time_now();
        let order = ctx
            .order_factory
            .limit(
                self.symbol.clone(),
                self.side,
                self.quantity,
                self.price,
                self.time_in_force,
                self.expire_time,
                now,
            )
            .expect("scripted order parameters are valid");
        self.order_id = Some(order.id().clone());
        let position_id = ctx.generate_position_id();
        ctx.submit_order(order, position_id);
    }

    fn on_event(&mut self, event: &Event, _ctx: &mut StrategyContext) {
        self.observations
            .borrow_mut()
            .events
            .push(event.type_name().to_string());
    }

    fn on_reset(&mut self) {
        self.submitted = false;
        self.order_id = None;
    }

    fn cancel_all_orders_on_stop(&self) -> bool {
        self.cancel_on_stop
    }
}

/// Submits a bracket (market entry, stop-loss, optional take-profit) on the
/// first tick.
pub struct BracketEntryStrategy {
    id: StrategyId,
    symbol: Symbol,
    side: OrderSide,
    quantity: Quantity,
    stop_loss: Price,
    take_profit: Option<Price>,
    submitted: bool,
    observations: SharedObservations,
}

impl BracketEntryStrategy {
    pub fn new(
        id: &str,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        stop_loss: Price,
        take_profit: Option<Price>,
        observations: SharedObservations,
    ) -> Self {
        Self {
            id: StrategyId::from(id),
            symbol,
            side,
            quantity,
            stop_loss,
            take_profit,
            submitted: false,
            observations,
        }
    }
}

impl Strategy for BracketEntryStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn on_tick(&mut self, _tick: &QuoteTick, ctx: &mut StrategyContext) {
        if self.submitted {
            return;
        }
        self.submitted = true;
        let now = ctx.clock.time_now();
        let bracket = ctx
            .order_factory
            .bracket_market(
                self.symbol.clone(),
                self.side,
                self.quantity,
                self.stop_loss,
                self.take_profit,
                now,
            )
            .expect("scripted bracket parameters are valid");
        let position_id = ctx.generate_position_id();
        ctx.submit_bracket_order(bracket, position_id);
    }

    fn on_event(&mut self, event: &Event, _ctx: &mut StrategyContext) {
        self.observations
            .borrow_mut()
            .events
            .push(event.type_name().to_string());
    }

    fn on_reset(&mut self) {
        self.submitted = false;
    }
}

/// Submits a limit order, then modifies it once the venue reports it
/// working.
pub struct ModifyOnWorkingStrategy {
    id: StrategyId,
    symbol: Symbol,
    quantity: Quantity,
    price: Price,
    modified_quantity: Quantity,
    modified_price: Price,
    submitted: bool,
    modified: bool,
    pub order_id: Option<OrderId>,
}

impl ModifyOnWorkingStrategy {
    pub fn new(
        id: &str,
        symbol: Symbol,
        quantity: Quantity,
        price: Price,
        modified_quantity: Quantity,
        modified_price: Price,
    ) -> Self {
        Self {
            id: StrategyId::from(id),
            symbol,
            quantity,
            price,
            modified_quantity,
            modified_price,
            submitted: false,
            modified: false,
            order_id: None,
        }
    }
}

impl Strategy for ModifyOnWorkingStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn on_tick(&mut self, _tick: &QuoteTick, ctx: &mut StrategyContext) {
        if self.submitted {
            return;
        }
        self.submitted = true;
        let now = ctx.clock.time_now();
        let order = ctx
            .order_factory
            .limit(
                self.symbol.clone(),
                OrderSide::Buy,
                self.quantity,
                self.price,
                TimeInForce::Gtc,
                None,
                now,
            )
            .expect("scripted order parameters are valid");
        self.order_id = Some(order.id().clone());
        let position_id = ctx.generate_position_id();
        ctx.submit_order(order, position_id);
    }

    fn on_event(&mut self, event: &Event, ctx: &mut StrategyContext) {
        if self.modified {
            return;
        }
        if let Event::Order(OrderEventAny::Working(working)) = event {
            if Some(&working.order_id) == self.order_id.as_ref() {
                self.modified = true;
                ctx.modify_order(
                    working.order_id.clone(),
                    self.modified_quantity,
                    self.modified_price,
                );
            }
        }
    }

    fn on_reset(&mut self) {
        self.submitted = false;
        self.modified = false;
        self.order_id = None;
    }
}

/// Registers a periodic timer on start and counts its firings against the
/// tick stream.
pub struct TimerStrategy {
    id: StrategyId,
    interval_secs: i64,
    observations: SharedObservations,
}

impl TimerStrategy {
    pub fn new(id: &str, interval_secs: i64, observations: SharedObservations) -> Self {
        Self {
            id: StrategyId::from(id),
            interval_secs,
            observations,
        }
    }
}

impl Strategy for TimerStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn on_start(&mut self, ctx: &mut StrategyContext) {
        ctx.clock
            .register_default_handler(tradewind_common::clock::TimeEventHandler::OwnerEvent);
        ctx.clock
            .set_timer(
                "heartbeat",
                chrono::Duration::seconds(self.interval_secs),
                None,
                None,
                None,
            )
            .expect("timer parameters are valid");
    }

    fn on_tick(&mut self, _tick: &QuoteTick, _ctx: &mut StrategyContext) {
        self.observations.borrow_mut().ticks_seen += 1;
    }

    fn on_event(&mut self, event: &Event, _ctx: &mut StrategyContext) {
        if let Event::Time(time_event) = event {
            self.observations
                .borrow_mut()
                .time_events
                .push(time_event.timestamp);
        }
    }
}
