//! Process-resident execution database.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::{ExecutionDatabase, StrategyState};
use crate::accounts::Account;
use crate::error::TradingError;
use crate::identifiers::{AccountId, OrderId, PositionId, PositionIdBroker, StrategyId, TraderId};
use crate::orders::Order;
use crate::positions::Position;

#[derive(Debug, Default)]
struct Indexes {
    order_position: HashMap<OrderId, PositionId>,
    order_strategy: HashMap<OrderId, StrategyId>,
    broker_position: HashMap<PositionIdBroker, PositionId>,
    position_strategy: HashMap<PositionId, StrategyId>,
    position_orders: HashMap<PositionId, HashSet<OrderId>>,
    strategy_orders: HashMap<StrategyId, HashSet<OrderId>>,
    strategy_positions: HashMap<StrategyId, HashSet<PositionId>>,
    orders_working: HashSet<OrderId>,
    orders_completed: HashSet<OrderId>,
    positions_open: HashSet<PositionId>,
    positions_closed: HashSet<PositionId>,
}

/// The in-memory back-end: everything lives in process-resident maps.
#[derive(Debug)]
pub struct InMemoryExecutionDatabase {
    trader_id: TraderId,
    accounts: HashMap<AccountId, Account>,
    orders: HashMap<OrderId, Order>,
    positions: HashMap<PositionId, Position>,
    strategy_state: HashMap<StrategyId, StrategyState>,
    strategy_ids: HashSet<StrategyId>,
    index: Indexes,
}

impl InMemoryExecutionDatabase {
    pub fn new(trader_id: TraderId) -> Self {
        Self {
            trader_id,
            accounts: HashMap::new(),
            orders: HashMap::new(),
            positions: HashMap::new(),
            strategy_state: HashMap::new(),
            strategy_ids: HashSet::new(),
            index: Indexes::default(),
        }
    }

    pub fn trader_id(&self) -> &TraderId {
        &self.trader_id
    }

    fn filter_orders(
        &self,
        ids: impl Iterator<Item = OrderId>,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<OrderId, Order> {
        ids.filter(|id| match strategy_id {
            Some(strategy) => self.index.order_strategy.get(id) == Some(strategy),
            None => true,
        })
        .filter_map(|id| self.orders.get(&id).map(|o| (id.clone(), o.clone())))
        .collect()
    }

    fn filter_positions(
        &self,
        ids: impl Iterator<Item = PositionId>,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<PositionId, Position> {
        ids.filter(|id| match strategy_id {
            Some(strategy) => self.index.position_strategy.get(id) == Some(strategy),
            None => true,
        })
        .filter_map(|id| self.positions.get(&id).map(|p| (id.clone(), p.clone())))
        .collect()
    }
}

impl ExecutionDatabase for InMemoryExecutionDatabase {
    fn add_account(&mut self, account: Account) -> Result<(), TradingError> {
        if self.accounts.contains_key(account.id()) {
            return Err(TradingError::DuplicateKey(format!(
                "account {}",
                account.id()
            )));
        }
        self.accounts.insert(account.id().clone(), account);
        Ok(())
    }

    fn add_order(
        &mut self,
        order: Order,
        strategy_id: &StrategyId,
        position_id: &PositionId,
    ) -> Result<(), TradingError> {
        let order_id = order.id().clone();
        if self.orders.contains_key(&order_id) {
            return Err(TradingError::DuplicateKey(format!("order {order_id}")));
        }
        if let Some(existing) = self.index.position_strategy.get(position_id) {
            if existing != strategy_id {
                return Err(TradingError::InvalidArgument(format!(
                    "position {position_id} belongs to strategy {existing}, not {strategy_id}"
                )));
            }
        }

        self.index
            .order_position
            .insert(order_id.clone(), position_id.clone());
        self.index
            .order_strategy
            .insert(order_id.clone(), strategy_id.clone());
        self.index
            .position_strategy
            .entry(position_id.clone())
            .or_insert_with(|| strategy_id.clone());
        self.index
            .position_orders
            .entry(position_id.clone())
            .or_default()
            .insert(order_id.clone());
        self.index
            .strategy_orders
            .entry(strategy_id.clone())
            .or_default()
            .insert(order_id.clone());
        self.index
            .strategy_positions
            .entry(strategy_id.clone())
            .or_default()
            .insert(position_id.clone());
        self.strategy_ids.insert(strategy_id.clone());
        self.orders.insert(order_id, order);
        Ok(())
    }

    fn add_position(
        &mut self,
        position: Position,
        strategy_id: &StrategyId,
    ) -> Result<(), TradingError> {
        let position_id = position.id().clone();
        if self.positions.contains_key(&position_id) {
            return Err(TradingError::DuplicateKey(format!(
                "position {position_id}"
            )));
        }
        self.index
            .broker_position
            .insert(position.id_broker().clone(), position_id.clone());
        self.index
            .position_strategy
            .entry(position_id.clone())
            .or_insert_with(|| strategy_id.clone());
        self.index
            .strategy_positions
            .entry(strategy_id.clone())
            .or_default()
            .insert(position_id.clone());
        self.strategy_ids.insert(strategy_id.clone());
        self.index.positions_open.insert(position_id.clone());
        self.positions.insert(position_id, position);
        Ok(())
    }

    fn update_account(&mut self, account: &Account) -> Result<(), TradingError> {
        if !self.accounts.contains_key(account.id()) {
            return Err(TradingError::NotFound(format!("account {}", account.id())));
        }
        self.accounts.insert(account.id().clone(), account.clone());
        Ok(())
    }

    fn update_order(&mut self, order: &Order) -> Result<(), TradingError> {
        let order_id = order.id().clone();
        if !self.orders.contains_key(&order_id) {
            return Err(TradingError::NotFound(format!("order {order_id}")));
        }
        if order.is_working() {
            self.index.orders_working.insert(order_id.clone());
            self.index.orders_completed.remove(&order_id);
        } else if order.is_completed() {
            self.index.orders_completed.insert(order_id.clone());
            self.index.orders_working.remove(&order_id);
        } else {
            self.index.orders_working.remove(&order_id);
        }
        self.orders.insert(order_id, order.clone());
        Ok(())
    }

    fn update_position(&mut self, position: &Position) -> Result<(), TradingError> {
        let position_id = position.id().clone();
        if !self.positions.contains_key(&position_id) {
            return Err(TradingError::NotFound(format!("position {position_id}")));
        }
        if position.is_closed() {
            self.index.positions_open.remove(&position_id);
            self.index.positions_closed.insert(position_id.clone());
        }
        self.positions.insert(position_id, position.clone());
        Ok(())
    }

    fn update_strategy_state(
        &mut self,
        strategy_id: &StrategyId,
        state: StrategyState,
    ) -> Result<(), TradingError> {
        self.strategy_ids.insert(strategy_id.clone());
        self.strategy_state.insert(strategy_id.clone(), state);
        Ok(())
    }

    fn delete_strategy(&mut self, strategy_id: &StrategyId) -> Result<(), TradingError> {
        if !self.strategy_ids.remove(strategy_id) {
            return Err(TradingError::NotFound(format!("strategy {strategy_id}")));
        }
        self.strategy_state.remove(strategy_id);
        self.index.strategy_orders.remove(strategy_id);
        self.index.strategy_positions.remove(strategy_id);
        Ok(())
    }

    fn get_account(&self, account_id: &AccountId) -> Option<Account> {
        self.accounts.get(account_id).cloned()
    }

    fn get_order(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.get(order_id).cloned()
    }

    fn get_orders(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order> {
        self.filter_orders(self.orders.keys().cloned(), strategy_id)
    }

    fn get_order_ids(&self) -> HashSet<OrderId> {
        self.orders.keys().cloned().collect()
    }

    fn get_orders_working(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order> {
        self.filter_orders(self.index.orders_working.iter().cloned(), strategy_id)
    }

    fn get_orders_completed(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order> {
        self.filter_orders(self.index.orders_completed.iter().cloned(), strategy_id)
    }

    fn get_position(&self, position_id: &PositionId) -> Option<Position> {
        self.positions.get(position_id).cloned()
    }

    fn get_position_for_order(&self, order_id: &OrderId) -> Option<Position> {
        self.index
            .order_position
            .get(order_id)
            .and_then(|id| self.positions.get(id))
            .cloned()
    }

    fn get_position_id(&self, order_id: &OrderId) -> Option<PositionId> {
        self.index.order_position.get(order_id).cloned()
    }

    fn get_position_id_for_broker_id(
        &self,
        position_id_broker: &PositionIdBroker,
    ) -> Option<PositionId> {
        self.index.broker_position.get(position_id_broker).cloned()
    }

    fn get_positions(&self, strategy_id: Option<&StrategyId>) -> HashMap<PositionId, Position> {
        self.filter_positions(self.positions.keys().cloned(), strategy_id)
    }

    fn get_position_ids(&self) -> HashSet<PositionId> {
        self.positions.keys().cloned().collect()
    }

    fn get_positions_open(
        &self,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<PositionId, Position> {
        self.filter_positions(self.index.positions_open.iter().cloned(), strategy_id)
    }

    fn get_positions_closed(
        &self,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<PositionId, Position> {
        self.filter_positions(self.index.positions_closed.iter().cloned(), strategy_id)
    }

    fn get_strategy_for_order(&self, order_id: &OrderId) -> Option<StrategyId> {
        self.index.order_strategy.get(order_id).cloned()
    }

    fn get_strategy_for_position(&self, position_id: &PositionId) -> Option<StrategyId> {
        self.index.position_strategy.get(position_id).cloned()
    }

    fn get_strategy_ids(&self) -> HashSet<StrategyId> {
        self.strategy_ids.clone()
    }

    fn get_strategy_state(&self, strategy_id: &StrategyId) -> Option<StrategyState> {
        self.strategy_state.get(strategy_id).cloned()
    }

    fn order_exists(&self, order_id: &OrderId) -> bool {
        self.orders.contains_key(order_id)
    }

    fn position_exists(&self, position_id: &PositionId) -> bool {
        self.positions.contains_key(position_id)
    }

    fn position_exists_for_order(&self, order_id: &OrderId) -> bool {
        self.index
            .order_position
            .get(order_id)
            .map(|id| self.positions.contains_key(id))
            .unwrap_or(false)
    }

    fn position_indexed_for_order(&self, order_id: &OrderId) -> bool {
        self.index.order_position.contains_key(order_id)
    }

    fn is_position_open(&self, position_id: &PositionId) -> bool {
        self.index.positions_open.contains(position_id)
    }

    fn is_position_closed(&self, position_id: &PositionId) -> bool {
        self.index.positions_closed.contains(position_id)
    }

    fn count_orders_total(&self) -> usize {
        self.orders.len()
    }

    fn count_orders_working(&self) -> usize {
        self.index.orders_working.len()
    }

    fn count_orders_completed(&self) -> usize {
        self.index.orders_completed.len()
    }

    fn count_positions_total(&self) -> usize {
        self.positions.len()
    }

    fn count_positions_open(&self) -> usize {
        self.index.positions_open.len()
    }

    fn count_positions_closed(&self) -> usize {
        self.index.positions_closed.len()
    }

    fn check_residuals(&self) {
        for order_id in &self.index.orders_working {
            warn!(trader = %self.trader_id, order = %order_id, "residual working order");
        }
        for position_id in &self.index.positions_open {
            warn!(trader = %self.trader_id, position = %position_id, "residual open position");
        }
    }

    fn reset(&mut self) {
        self.accounts.clear();
        self.orders.clear();
        self.positions.clear();
        self.strategy_state.clear();
        self.strategy_ids.clear();
        self.index = Indexes::default();
    }

    fn flush(&mut self) {
        // Nothing is persisted beyond the caches.
    }
}
