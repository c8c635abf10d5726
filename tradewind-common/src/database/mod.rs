//! The indexed execution database: the single source of truth for accounts,
//! orders and positions, with cross-reference indexes kept consistent on
//! every write.
//!
//! Two back-ends implement one contract: a process-resident store and a
//! write-through store over a pluggable key-value trait. Only the execution
//! engine mutates the database; strategies observe through the read API.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::accounts::Account;
use crate::error::TradingError;
use crate::identifiers::{AccountId, OrderId, PositionId, PositionIdBroker, StrategyId};
use crate::orders::Order;
use crate::positions::Position;

mod keyvalue;
mod memory;

pub use keyvalue::{InMemoryKeyValueStore, KeyValueExecutionDatabase, KeyValueStore};
pub use memory::InMemoryExecutionDatabase;

/// Opaque per-strategy state, persisted across runs.
pub type StrategyState = HashMap<String, String>;

/// The database handle shared between the execution engine (writer) and
/// strategy contexts (readers). The core is single-threaded cooperative, so
/// interior mutability with runtime borrow checking is sufficient.
pub type SharedExecutionDatabase = Rc<RefCell<dyn ExecutionDatabase>>;

/// Contract for execution databases. All operations are O(1) expected.
///
/// Writes check duplicate-key preconditions and fail with `DuplicateKey`;
/// updates of unknown entities fail with `NotFound`. `add_order` updates all
/// dependent indexes atomically — a precondition failure leaves the
/// database untouched.
pub trait ExecutionDatabase {
    // === Writes ===

    fn add_account(&mut self, account: Account) -> Result<(), TradingError>;

    fn add_order(
        &mut self,
        order: Order,
        strategy_id: &StrategyId,
        position_id: &PositionId,
    ) -> Result<(), TradingError>;

    fn add_position(
        &mut self,
        position: Position,
        strategy_id: &StrategyId,
    ) -> Result<(), TradingError>;

    fn update_account(&mut self, account: &Account) -> Result<(), TradingError>;

    /// Persist an order's current state, moving it between the working and
    /// completed index sets as its status dictates.
    fn update_order(&mut self, order: &Order) -> Result<(), TradingError>;

    /// Persist a position's current state, moving it from open to closed
    /// when its quantity has reached zero.
    fn update_position(&mut self, position: &Position) -> Result<(), TradingError>;

    fn update_strategy_state(
        &mut self,
        strategy_id: &StrategyId,
        state: StrategyState,
    ) -> Result<(), TradingError>;

    fn delete_strategy(&mut self, strategy_id: &StrategyId) -> Result<(), TradingError>;

    // === Reads ===

    fn get_account(&self, account_id: &AccountId) -> Option<Account>;

    fn get_order(&self, order_id: &OrderId) -> Option<Order>;

    fn get_orders(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order>;

    fn get_order_ids(&self) -> HashSet<OrderId>;

    fn get_orders_working(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order>;

    fn get_orders_completed(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order>;

    fn get_position(&self, position_id: &PositionId) -> Option<Position>;

    fn get_position_for_order(&self, order_id: &OrderId) -> Option<Position>;

    fn get_position_id(&self, order_id: &OrderId) -> Option<PositionId>;

    fn get_position_id_for_broker_id(
        &self,
        position_id_broker: &PositionIdBroker,
    ) -> Option<PositionId>;

    fn get_positions(&self, strategy_id: Option<&StrategyId>) -> HashMap<PositionId, Position>;

    fn get_position_ids(&self) -> HashSet<PositionId>;

    fn get_positions_open(&self, strategy_id: Option<&StrategyId>)
        -> HashMap<PositionId, Position>;

    fn get_positions_closed(
        &self,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<PositionId, Position>;

    fn get_strategy_for_order(&self, order_id: &OrderId) -> Option<StrategyId>;

    fn get_strategy_for_position(&self, position_id: &PositionId) -> Option<StrategyId>;

    fn get_strategy_ids(&self) -> HashSet<StrategyId>;

    fn get_strategy_state(&self, strategy_id: &StrategyId) -> Option<StrategyState>;

    // === Predicates ===

    fn order_exists(&self, order_id: &OrderId) -> bool;

    fn position_exists(&self, position_id: &PositionId) -> bool;

    fn position_exists_for_order(&self, order_id: &OrderId) -> bool;

    fn position_indexed_for_order(&self, order_id: &OrderId) -> bool;

    fn is_position_open(&self, position_id: &PositionId) -> bool;

    fn is_position_closed(&self, position_id: &PositionId) -> bool;

    // === Counts ===

    fn count_orders_total(&self) -> usize;

    fn count_orders_working(&self) -> usize;

    fn count_orders_completed(&self) -> usize;

    fn count_positions_total(&self) -> usize;

    fn count_positions_open(&self) -> usize;

    fn count_positions_closed(&self) -> usize;

    // === Lifecycle ===

    /// Log a WARN for every still-working order and still-open position.
    /// Never fails.
    fn check_residuals(&self);

    /// Clear the in-process caches and indexes.
    fn reset(&mut self);

    /// Wipe the persistent store, where one exists.
    fn flush(&mut self);
}
