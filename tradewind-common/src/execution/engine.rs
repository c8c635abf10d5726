//! The execution engine: command router, event dispatcher, FSM enforcer
//! and derived-event emitter.
//!
//! Everything between strategies and the venue adapter flows through here.
//! Events are processed iteratively off a queue: applying one event may
//! produce derived position events and, via strategy handlers, new commands
//! whose reply events join the same queue. The engine never propagates a
//! failure caused by a single malformed event — it logs and drops.

use std::collections::VecDeque;

use tracing::{error, warn};

use super::commands::TradingCommand;
use super::venue::ExecutionClient;
use crate::accounts::{Account, AccountStateEvent};
use crate::clock::Clock;
use crate::database::SharedExecutionDatabase;
use crate::error::TradingError;
use crate::events::Event;
use crate::identifiers::{AccountId, StrategyId, TraderId, UuidFactory};
use crate::orders::OrderEventAny;
use crate::positions::{
    Position, PositionClosed, PositionEventAny, PositionModified, PositionOpened,
};
use crate::strategy::{Strategy, StrategyContext};
use crate::types::{Currency, QuoteTick};

struct StrategyEntry {
    strategy: Box<dyn Strategy>,
    ctx: StrategyContext,
}

pub struct ExecutionEngine {
    trader_id: TraderId,
    account_id: AccountId,
    base_currency: Currency,
    database: SharedExecutionDatabase,
    venue: Option<Box<dyn ExecutionClient>>,
    strategies: Vec<StrategyEntry>,
    command_count: u64,
    event_count: u64,
    uuids: UuidFactory,
    processed_events: Vec<Event>,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("trader_id", &self.trader_id)
            .field("account_id", &self.account_id)
            .field("strategies", &self.strategies.len())
            .field("command_count", &self.command_count)
            .field("event_count", &self.event_count)
            .finish()
    }
}

impl ExecutionEngine {
    pub fn new(
        trader_id: TraderId,
        account_id: AccountId,
        base_currency: Currency,
        database: SharedExecutionDatabase,
        uuids: UuidFactory,
    ) -> Self {
        Self {
            trader_id,
            account_id,
            base_currency,
            database,
            venue: None,
            strategies: Vec::new(),
            command_count: 0,
            event_count: 0,
            uuids,
            processed_events: Vec::new(),
        }
    }

    pub fn trader_id(&self) -> &TraderId {
        &self.trader_id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    pub fn command_count(&self) -> u64 {
        self.command_count
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Every event processed this run, in processing order.
    pub fn processed_events(&self) -> &[Event] {
        &self.processed_events
    }

    pub fn database(&self) -> SharedExecutionDatabase {
        self.database.clone()
    }

    // === Registration ===

    pub fn register_venue(&mut self, venue: Box<dyn ExecutionClient>) {
        self.venue = Some(venue);
    }

    pub fn register_strategy(
        &mut self,
        strategy: Box<dyn Strategy>,
        ctx: StrategyContext,
    ) -> Result<(), TradingError> {
        let strategy_id = strategy.strategy_id();
        if ctx.strategy_id() != &strategy_id {
            return Err(TradingError::InvalidArgument(format!(
                "context strategy id {} does not match strategy {}",
                ctx.strategy_id(),
                strategy_id
            )));
        }
        if self.strategy_index(&strategy_id).is_some() {
            return Err(TradingError::DuplicateKey(format!("strategy {strategy_id}")));
        }
        self.database
            .borrow_mut()
            .update_strategy_state(&strategy_id, Default::default())?;
        self.strategies.push(StrategyEntry { strategy, ctx });
        Ok(())
    }

    pub fn deregister_strategy(&mut self, strategy_id: &StrategyId) -> Result<(), TradingError> {
        match self.strategy_index(strategy_id) {
            Some(index) => {
                self.strategies.remove(index);
                self.database.borrow_mut().delete_strategy(strategy_id)?;
                Ok(())
            }
            None => Err(TradingError::NotFound(format!("strategy {strategy_id}"))),
        }
    }

    pub fn registered_strategies(&self) -> Vec<StrategyId> {
        self.strategies
            .iter()
            .map(|entry| entry.strategy.strategy_id())
            .collect()
    }

    fn strategy_index(&self, strategy_id: &StrategyId) -> Option<usize> {
        self.strategies
            .iter()
            .position(|entry| &entry.strategy.strategy_id() == strategy_id)
    }

    // === Portfolio queries ===

    pub fn is_strategy_flat(&self, strategy_id: &StrategyId) -> bool {
        self.database
            .borrow()
            .get_positions_open(Some(strategy_id))
            .is_empty()
    }

    pub fn is_flat(&self) -> bool {
        self.database.borrow().get_positions_open(None).is_empty()
    }

    // === Command path ===

    /// Route a command to the venue, persisting submissions first so that
    /// reply events never find a missing order.
    pub fn execute_command(&mut self, command: TradingCommand) {
        let events = self.dispatch_command(command);
        self.pump(events);
    }

    fn dispatch_command(&mut self, command: TradingCommand) -> Vec<Event> {
        self.command_count += 1;
        if self.venue.is_none() {
            warn!(command = command.type_name(), "no venue registered; command dropped");
            return Vec::new();
        }

        match &command {
            TradingCommand::SubmitOrder(submit) => {
                let added = self.database.borrow_mut().add_order(
                    submit.order.clone(),
                    &submit.strategy_id,
                    &submit.position_id,
                );
                if let Err(e) = added {
                    error!(order = %submit.order.id(), error = %e, "submit rejected by database");
                    return Vec::new();
                }
            }
            TradingCommand::SubmitBracketOrder(submit) => {
                let bracket = &submit.bracket_order;
                let mut db = self.database.borrow_mut();
                let added = bracket
                    .orders()
                    .into_iter()
                    .try_for_each(|order| {
                        db.add_order(order.clone(), &submit.strategy_id, &submit.position_id)
                    });
                if let Err(e) = added {
                    error!(bracket = %bracket.id(), error = %e, "bracket submit rejected by database");
                    return Vec::new();
                }
            }
            TradingCommand::ModifyOrder(_)
            | TradingCommand::CancelOrder(_)
            | TradingCommand::AccountInquiry(_) => {}
        }

        let venue = self.venue.as_mut().expect("venue presence checked above");
        match &command {
            TradingCommand::AccountInquiry(c) => venue.account_inquiry(c),
            TradingCommand::SubmitOrder(c) => venue.submit_order(c),
            TradingCommand::SubmitBracketOrder(c) => venue.submit_bracket_order(c),
            TradingCommand::ModifyOrder(c) => venue.modify_order(c),
            TradingCommand::CancelOrder(c) => venue.cancel_order(c),
        }
    }

    // === Event path ===

    /// Apply a single event and everything it causes.
    pub fn handle_event(&mut self, event: Event) {
        self.pump(vec![event]);
    }

    /// Push a tick through the simulated venue and process its events.
    pub fn process_venue_tick(&mut self, tick: &QuoteTick) {
        let events = match self.venue.as_mut() {
            Some(venue) => venue.process_tick(tick),
            None => Vec::new(),
        };
        self.pump(events);
    }

    /// Deliver a tick to every strategy handler.
    pub fn on_tick(&mut self, tick: &QuoteTick) {
        for index in 0..self.strategies.len() {
            let commands = {
                let entry = &mut self.strategies[index];
                entry.strategy.on_tick(tick, &mut entry.ctx);
                entry.ctx.drain_commands()
            };
            for command in commands {
                let events = self.dispatch_command(command);
                self.pump(events);
            }
        }
    }

    /// Pin every strategy clock to `to`, typically the run start.
    pub fn set_strategy_clocks(&mut self, to: chrono::DateTime<chrono::Utc>) {
        for entry in &mut self.strategies {
            entry.ctx.clock.set_time(to);
        }
    }

    /// Fire every strategy timer due at or before `to`, in per-strategy
    /// time order, advancing each strategy clock through the event times.
    pub fn advance_strategy_clocks(&mut self, to: chrono::DateTime<chrono::Utc>) {
        for index in 0..self.strategies.len() {
            let timer_events = self.strategies[index].ctx.clock.advance_time(to);
            for (time_event, handler) in timer_events {
                match handler {
                    crate::clock::TimeEventHandler::Callback(callback) => callback(&time_event),
                    crate::clock::TimeEventHandler::OwnerEvent => {
                        let commands = {
                            let entry = &mut self.strategies[index];
                            entry.ctx.clock.set_time(time_event.timestamp);
                            entry
                                .strategy
                                .on_event(&Event::Time(time_event.clone()), &mut entry.ctx);
                            entry.ctx.drain_commands()
                        };
                        for command in commands {
                            let events = self.dispatch_command(command);
                            self.pump(events);
                        }
                    }
                }
            }
            self.strategies[index].ctx.clock.set_time(to);
        }
    }

    fn pump(&mut self, initial: Vec<Event>) {
        let mut queue: VecDeque<Event> = initial.into();
        while let Some(event) = queue.pop_front() {
            self.event_count += 1;
            self.processed_events.push(event.clone());
            let followups = self.process_event(&event);
            queue.extend(followups);
        }
    }

    fn process_event(&mut self, event: &Event) -> Vec<Event> {
        match event {
            Event::Order(order_event) => self.process_order_event(order_event),
            Event::Account(account_event) => self.process_account_event(account_event),
            Event::Position(position_event) => {
                let strategy_id = position_event.strategy_id().clone();
                self.deliver_to_strategy(&strategy_id, event)
            }
            Event::Time(_) => Vec::new(),
        }
    }

    fn process_order_event(&mut self, event: &OrderEventAny) -> Vec<Event> {
        let order_id = event.order_id().clone();

        // Cancel rejects inform the strategy; the order FSM is untouched.
        if matches!(event, OrderEventAny::CancelReject(_)) {
            let strategy_id = self.database.borrow().get_strategy_for_order(&order_id);
            return match strategy_id {
                Some(strategy_id) => {
                    self.deliver_to_strategy(&strategy_id, &Event::Order(event.clone()))
                }
                None => {
                    warn!(order = %order_id, "cancel reject for unknown order; dropped");
                    Vec::new()
                }
            };
        }

        let order = self.database.borrow().get_order(&order_id);
        let Some(mut order) = order else {
            warn!(order = %order_id, event = event.type_name(), "event for unknown order; dropped");
            return Vec::new();
        };

        if let Err(e) = order.apply(event.clone()) {
            error!(order = %order_id, event = event.type_name(), error = %e, "event dropped");
            return Vec::new();
        }
        if let Err(e) = self.database.borrow_mut().update_order(&order) {
            error!(order = %order_id, error = %e, "failed to persist order update");
            return Vec::new();
        }

        let mut followups = Vec::new();
        if event.is_fill() {
            followups.extend(self.handle_fill(event));
        }

        let strategy_id = self.database.borrow().get_strategy_for_order(&order_id);
        match strategy_id {
            Some(strategy_id) => {
                followups.extend(self.deliver_to_strategy(&strategy_id, &Event::Order(event.clone())))
            }
            None => warn!(order = %order_id, "no strategy indexed for order"),
        }
        followups
    }

    /// Resolve the fill's position, create or update it, and derive the
    /// appropriate position event. Unresolvable routing data drops the
    /// event with an ERROR; the engine never crashes on one bad event.
    fn handle_fill(&mut self, event: &OrderEventAny) -> Vec<Event> {
        let Some(fill) = event.as_fill() else {
            return Vec::new();
        };
        let order_id = fill.order_id.clone();

        let position_id = {
            let db = self.database.borrow();
            db.get_position_id(&order_id)
                .or_else(|| db.get_position_id_for_broker_id(fill.position_id_broker))
        };
        let Some(position_id) = position_id else {
            error!(order = %order_id, "cannot resolve a position id for fill; event unprocessable");
            return Vec::new();
        };

        let strategy_id = {
            let db = self.database.borrow();
            db.get_strategy_for_position(&position_id)
                .or_else(|| db.get_strategy_for_order(&order_id))
        };
        let Some(strategy_id) = strategy_id else {
            error!(position = %position_id, "cannot resolve a strategy for fill; event unprocessable");
            return Vec::new();
        };

        let existing = self.database.borrow().get_position(&position_id);
        match existing {
            Some(mut position) => {
                if let Err(e) = position.apply(event) {
                    error!(position = %position_id, error = %e, "fill dropped");
                    return Vec::new();
                }
                if let Err(e) = self.database.borrow_mut().update_position(&position) {
                    error!(position = %position_id, error = %e, "failed to persist position");
                    return Vec::new();
                }
                let derived = if position.is_closed() {
                    PositionEventAny::Closed(PositionClosed {
                        position_id: position_id.clone(),
                        strategy_id,
                        symbol: position.symbol().clone(),
                        realized_points: position.realized_points(),
                        realized_pnl: position.realized_pnl(),
                        opened_time: position.opened_time(),
                        closed_time: position
                            .closed_time()
                            .expect("closed positions carry a closed time"),
                        id: self.uuids.generate(),
                        timestamp: fill.execution_time,
                    })
                } else {
                    PositionEventAny::Modified(PositionModified {
                        position_id: position_id.clone(),
                        strategy_id,
                        symbol: position.symbol().clone(),
                        market_position: position.market_position(),
                        quantity: position.quantity(),
                        average_open_price: position.average_open_price(),
                        realized_pnl: position.realized_pnl(),
                        id: self.uuids.generate(),
                        timestamp: fill.execution_time,
                    })
                };
                vec![Event::Position(derived)]
            }
            None => match Position::new(position_id.clone(), event) {
                Ok(position) => {
                    if let Err(e) = self
                        .database
                        .borrow_mut()
                        .add_position(position.clone(), &strategy_id)
                    {
                        error!(position = %position_id, error = %e, "failed to add position");
                        return Vec::new();
                    }
                    vec![Event::Position(PositionEventAny::Opened(PositionOpened {
                        position_id,
                        strategy_id,
                        symbol: position.symbol().clone(),
                        entry_direction: position.entry_direction(),
                        quantity: position.quantity(),
                        average_open_price: position.average_open_price(),
                        id: self.uuids.generate(),
                        timestamp: fill.execution_time,
                    }))]
                }
                Err(e) => {
                    error!(position = %position_id, error = %e, "cannot open position from event");
                    Vec::new()
                }
            },
        }
    }

    fn process_account_event(&mut self, event: &AccountStateEvent) -> Vec<Event> {
        let existing = self.database.borrow().get_account(&event.account_id);
        match existing {
            Some(mut account) => {
                if let Err(e) = account.apply(event.clone()) {
                    warn!(account = %event.account_id, error = %e, "account event dropped");
                    return Vec::new();
                }
                if let Err(e) = self.database.borrow_mut().update_account(&account) {
                    error!(account = %event.account_id, error = %e, "failed to persist account");
                    return Vec::new();
                }
                self.broadcast(&Event::Account(event.clone()))
            }
            None if event.account_id == self.account_id => {
                self.base_currency = event.currency;
                let account = Account::new(event.clone());
                if let Err(e) = self.database.borrow_mut().add_account(account) {
                    error!(account = %event.account_id, error = %e, "failed to add account");
                    return Vec::new();
                }
                self.broadcast(&Event::Account(event.clone()))
            }
            None => {
                warn!(
                    account = %event.account_id,
                    expected = %self.account_id,
                    "account state event for unknown account; dropped"
                );
                Vec::new()
            }
        }
    }

    fn broadcast(&mut self, event: &Event) -> Vec<Event> {
        let mut produced = Vec::new();
        for index in 0..self.strategies.len() {
            let commands = {
                let entry = &mut self.strategies[index];
                entry.strategy.on_event(event, &mut entry.ctx);
                entry.ctx.drain_commands()
            };
            for command in commands {
                produced.extend(self.dispatch_command(command));
            }
        }
        produced
    }

    fn deliver_to_strategy(&mut self, strategy_id: &StrategyId, event: &Event) -> Vec<Event> {
        let Some(index) = self.strategy_index(strategy_id) else {
            warn!(strategy = %strategy_id, event = event.type_name(), "strategy not registered");
            return Vec::new();
        };
        let commands = {
            let entry = &mut self.strategies[index];
            entry.strategy.on_event(event, &mut entry.ctx);
            entry.ctx.drain_commands()
        };
        let mut produced = Vec::new();
        for command in commands {
            produced.extend(self.dispatch_command(command));
        }
        produced
    }

    // === Lifecycle ===

    pub fn start_strategies(&mut self) {
        for index in 0..self.strategies.len() {
            let commands = {
                let entry = &mut self.strategies[index];
                entry.strategy.on_start(&mut entry.ctx);
                entry.ctx.drain_commands()
            };
            for command in commands {
                let events = self.dispatch_command(command);
                self.pump(events);
            }
        }
    }

    /// Stop every strategy: optionally cancel its working orders, flatten
    /// its open positions, then invoke `on_stop`.
    pub fn stop_strategies(&mut self) {
        for index in 0..self.strategies.len() {
            let strategy_id = self.strategies[index].strategy.strategy_id();

            if self.strategies[index].strategy.cancel_all_orders_on_stop() {
                let mut working: Vec<_> = self
                    .database
                    .borrow()
                    .get_orders_working(Some(&strategy_id))
                    .into_keys()
                    .collect();
                working.sort();
                for order_id in working {
                    let commands = {
                        let ctx = &mut self.strategies[index].ctx;
                        ctx.cancel_order(order_id, "STRATEGY_STOPPED");
                        ctx.drain_commands()
                    };
                    for command in commands {
                        let events = self.dispatch_command(command);
                        self.pump(events);
                    }
                }
            }

            if self.strategies[index].strategy.flatten_on_stop() {
                let mut open: Vec<_> = self
                    .database
                    .borrow()
                    .get_positions_open(Some(&strategy_id))
                    .into_iter()
                    .collect();
                open.sort_by(|a, b| a.0.cmp(&b.0));
                for (position_id, position) in open {
                    let commands = {
                        let ctx = &mut self.strategies[index].ctx;
                        let now = ctx.clock.time_now();
                        let side = position.entry_direction().opposite();
                        match ctx
                            .order_factory
                            .market(position.symbol().clone(), side, position.quantity(), now)
                        {
                            Ok(order) => ctx.submit_order(order, position_id),
                            Err(e) => {
                                error!(position = %position.id(), error = %e, "cannot flatten position")
                            }
                        }
                        ctx.drain_commands()
                    };
                    for command in commands {
                        let events = self.dispatch_command(command);
                        self.pump(events);
                    }
                }
            }

            let commands = {
                let entry = &mut self.strategies[index];
                entry.strategy.on_stop(&mut entry.ctx);
                entry.ctx.drain_commands()
            };
            for command in commands {
                let events = self.dispatch_command(command);
                self.pump(events);
            }
        }
    }

    /// Reset counters, the venue and each strategy, keeping registrations.
    pub fn reset(&mut self) {
        self.command_count = 0;
        self.event_count = 0;
        self.processed_events.clear();
        self.uuids.reset();
        if let Some(venue) = self.venue.as_mut() {
            venue.reset();
        }
        for entry in &mut self.strategies {
            entry.strategy.on_reset();
            entry.ctx.reset();
        }
    }
}
