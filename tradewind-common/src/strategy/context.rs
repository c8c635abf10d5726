//! The per-strategy execution context.
//!
//! Each registered strategy receives its own clock handle, order and
//! position-id factories, a read handle on the execution database, and a
//! command queue the engine drains after every handler invocation.

use std::cell::Ref;

use crate::database::{ExecutionDatabase, SharedExecutionDatabase};
use crate::clock::Clock;
use crate::error::TradingError;
use crate::execution::{
    AccountInquiry, CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder, TradingCommand,
};
use crate::identifiers::{
    AccountId, OrderId, PositionId, PositionIdGenerator, StrategyId, TraderId, UuidFactory,
};
use crate::orders::{BracketOrder, Order, OrderFactory};
use crate::types::{Price, Quantity};

/// The tag portion of a hyphenated identifier (`TESTER-000` -> `000`).
fn id_tag(value: &str) -> &str {
    value.rsplit('-').next().unwrap_or(value)
}

pub struct StrategyContext {
    strategy_id: StrategyId,
    trader_id: TraderId,
    account_id: AccountId,
    pub clock: Box<dyn Clock>,
    pub order_factory: OrderFactory,
    position_id_generator: PositionIdGenerator,
    database: SharedExecutionDatabase,
    uuids: UuidFactory,
    commands: Vec<TradingCommand>,
}

impl std::fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyContext")
            .field("strategy_id", &self.strategy_id)
            .field("trader_id", &self.trader_id)
            .field("account_id", &self.account_id)
            .field("pending_commands", &self.commands.len())
            .finish()
    }
}

impl StrategyContext {
    pub fn new(
        strategy_id: StrategyId,
        trader_id: TraderId,
        account_id: AccountId,
        clock: Box<dyn Clock>,
        database: SharedExecutionDatabase,
        command_uuids: UuidFactory,
        factory_uuids: UuidFactory,
    ) -> Result<Self, TradingError> {
        let trader_tag = id_tag(trader_id.as_str()).to_string();
        let strategy_tag = id_tag(strategy_id.as_str()).to_string();
        Ok(Self {
            order_factory: OrderFactory::new(&trader_tag, &strategy_tag, factory_uuids)?,
            position_id_generator: PositionIdGenerator::new(trader_tag, strategy_tag)?,
            strategy_id,
            trader_id,
            account_id,
            clock,
            database,
            uuids: command_uuids,
            commands: Vec::new(),
        })
    }

    pub fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    pub fn trader_id(&self) -> &TraderId {
        &self.trader_id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Read access to the execution database. The borrow must not be held
    /// across command submission.
    pub fn database(&self) -> Ref<'_, dyn ExecutionDatabase> {
        self.database.borrow()
    }

    /// Generate a fresh logical position id.
    pub fn generate_position_id(&mut self) -> PositionId {
        self.position_id_generator.generate(self.clock.time_now())
    }

    // === Command queueing ===

    pub fn submit_order(&mut self, order: Order, position_id: PositionId) {
        let command = TradingCommand::SubmitOrder(SubmitOrder {
            trader_id: self.trader_id.clone(),
            account_id: self.account_id.clone(),
            strategy_id: self.strategy_id.clone(),
            position_id,
            order,
            id: self.uuids.generate(),
            timestamp: self.clock.time_now(),
        });
        self.commands.push(command);
    }

    pub fn submit_bracket_order(&mut self, bracket_order: BracketOrder, position_id: PositionId) {
        let command = TradingCommand::SubmitBracketOrder(SubmitBracketOrder {
            trader_id: self.trader_id.clone(),
            account_id: self.account_id.clone(),
            strategy_id: self.strategy_id.clone(),
            position_id,
            bracket_order,
            id: self.uuids.generate(),
            timestamp: self.clock.time_now(),
        });
        self.commands.push(command);
    }

    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        modified_quantity: Quantity,
        modified_price: Price,
    ) {
        let command = TradingCommand::ModifyOrder(ModifyOrder {
            trader_id: self.trader_id.clone(),
            account_id: self.account_id.clone(),
            order_id,
            modified_quantity,
            modified_price,
            id: self.uuids.generate(),
            timestamp: self.clock.time_now(),
        });
        self.commands.push(command);
    }

    pub fn cancel_order(&mut self, order_id: OrderId, reason: impl Into<String>) {
        let command = TradingCommand::CancelOrder(CancelOrder {
            trader_id: self.trader_id.clone(),
            account_id: self.account_id.clone(),
            order_id,
            cancel_reason: reason.into(),
            id: self.uuids.generate(),
            timestamp: self.clock.time_now(),
        });
        self.commands.push(command);
    }

    pub fn account_inquiry(&mut self) {
        let command = TradingCommand::AccountInquiry(AccountInquiry {
            trader_id: self.trader_id.clone(),
            account_id: self.account_id.clone(),
            id: self.uuids.generate(),
            timestamp: self.clock.time_now(),
        });
        self.commands.push(command);
    }

    pub(crate) fn drain_commands(&mut self) -> Vec<TradingCommand> {
        std::mem::take(&mut self.commands)
    }

    pub(crate) fn reset(&mut self) {
        self.commands.clear();
        self.order_factory.reset();
        self.position_id_generator.reset();
        self.uuids.reset();
        self.clock.cancel_all_timers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::database::InMemoryExecutionDatabase;
    use crate::orders::OrderSide;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context() -> StrategyContext {
        let database: SharedExecutionDatabase = Rc::new(RefCell::new(
            InMemoryExecutionDatabase::new(TraderId::from("TESTER-000")),
        ));
        StrategyContext::new(
            StrategyId::from("EMACross-001"),
            TraderId::from("TESTER-000"),
            AccountId::from("SIM-000"),
            Box::new(TestClock::new(Utc.timestamp_opt(0, 0).unwrap())),
            database,
            UuidFactory::deterministic(1),
            UuidFactory::deterministic(2),
        )
        .unwrap()
    }

    #[test]
    fn commands_queue_and_drain() {
        let mut ctx = context();
        let now = ctx.clock.time_now();
        let order = ctx
            .order_factory
            .market(
                crate::identifiers::Symbol::new("AUDUSD", "FXCM").unwrap(),
                OrderSide::Buy,
                Quantity::from_units(100),
                now,
            )
            .unwrap();
        let position_id = ctx.generate_position_id();
        ctx.submit_order(order, position_id);
        ctx.account_inquiry();

        let commands = ctx.drain_commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], TradingCommand::SubmitOrder(_)));
        assert!(matches!(commands[1], TradingCommand::AccountInquiry(_)));
        assert!(ctx.drain_commands().is_empty());
    }

    #[test]
    fn position_ids_embed_trader_and_strategy_tags() {
        let mut ctx = context();
        let position_id = ctx.generate_position_id();
        assert_eq!(position_id.as_str(), "P-19700101-000000-000-001-1");
    }

    #[test]
    fn reset_replays_generated_ids() {
        let mut ctx = context();
        let first = ctx.generate_position_id();
        ctx.generate_position_id();
        ctx.reset();
        assert_eq!(ctx.generate_position_id(), first);
    }
}
