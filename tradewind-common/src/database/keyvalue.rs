//! Write-through execution database over a pluggable key-value store.
//!
//! Orders persist as their immutable definition plus applied event log;
//! positions and accounts persist as event logs alone and rebuild by
//! replay. Values are encoded with the wire serializers. Keys live in a
//! stable per-trader namespace (`trader:<id>:...`), so reads within one
//! trader are immediately consistent after a write returns, while
//! cross-trader queries may observe the store eventually.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use super::memory::InMemoryExecutionDatabase;
use super::{ExecutionDatabase, StrategyState};
use crate::accounts::{Account, AccountStateEvent};
use crate::error::TradingError;
use crate::events::Event;
use crate::identifiers::{
    AccountId, OrderId, PositionId, PositionIdBroker, StrategyId, TraderId,
};
use crate::orders::Order;
use crate::positions::Position;
use crate::serialization::{EventSerializer, ObjectMap, OrderSerializer};

/// Minimal key-value store surface the back-end persists through.
pub trait KeyValueStore: fmt::Debug {
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), TradingError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TradingError>;

    fn delete(&mut self, key: &str) -> Result<(), TradingError>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, TradingError>;

    fn clear_with_prefix(&mut self, prefix: &str) -> Result<(), TradingError>;
}

/// Reference store used in tests and as the default backing.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), TradingError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TradingError> {
        Ok(self.entries.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<(), TradingError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, TradingError> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn clear_with_prefix(&mut self, prefix: &str) -> Result<(), TradingError> {
        let keys = self.keys_with_prefix(prefix)?;
        for key in keys {
            self.entries.remove(&key);
        }
        Ok(())
    }
}

// Length-prefixed packing for event logs.
fn pack_frames(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&(frames.len() as u32).to_be_bytes());
    for frame in frames {
        buffer.extend_from_slice(&(frame.len() as u32).to_be_bytes());
        buffer.extend_from_slice(frame);
    }
    buffer
}

fn unpack_frames(bytes: &[u8]) -> Result<Vec<Vec<u8>>, TradingError> {
    fn take<'a>(
        bytes: &'a [u8],
        offset: &mut usize,
        n: usize,
    ) -> Result<&'a [u8], TradingError> {
        if *offset + n > bytes.len() {
            return Err(TradingError::Serialization(
                "event log truncated".to_string(),
            ));
        }
        let slice = &bytes[*offset..*offset + n];
        *offset += n;
        Ok(slice)
    }

    let mut offset = 0usize;
    let count = u32::from_be_bytes(take(bytes, &mut offset, 4)?.try_into().expect("4 bytes"));
    let mut frames = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len =
            u32::from_be_bytes(take(bytes, &mut offset, 4)?.try_into().expect("4 bytes")) as usize;
        frames.push(take(bytes, &mut offset, len)?.to_vec());
    }
    Ok(frames)
}

/// The external-KV back-end: an in-process cache for reads plus
/// write-through persistence of every mutation.
#[derive(Debug)]
pub struct KeyValueExecutionDatabase {
    cache: InMemoryExecutionDatabase,
    store: Box<dyn KeyValueStore>,
    order_serializer: OrderSerializer,
    event_serializer: EventSerializer,
}

impl KeyValueExecutionDatabase {
    pub fn new(trader_id: TraderId, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            cache: InMemoryExecutionDatabase::new(trader_id),
            store,
            order_serializer: OrderSerializer::new(),
            event_serializer: EventSerializer::new(),
        }
    }

    pub fn trader_id(&self) -> &TraderId {
        self.cache.trader_id()
    }

    /// Consume the database, returning the backing store.
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }

    fn namespace(&self) -> String {
        format!("trader:{}:", self.trader_id())
    }

    fn order_key(&self, order_id: &OrderId) -> String {
        format!("{}orders:{order_id}", self.namespace())
    }

    fn order_events_key(&self, order_id: &OrderId) -> String {
        format!("{}order-events:{order_id}", self.namespace())
    }

    fn order_index_key(&self, order_id: &OrderId) -> String {
        format!("{}order-index:{order_id}", self.namespace())
    }

    fn position_key(&self, position_id: &PositionId) -> String {
        format!("{}positions:{position_id}", self.namespace())
    }

    fn position_index_key(&self, position_id: &PositionId) -> String {
        format!("{}position-index:{position_id}", self.namespace())
    }

    fn account_key(&self, account_id: &AccountId) -> String {
        format!("{}accounts:{account_id}", self.namespace())
    }

    fn strategy_key(&self, strategy_id: &StrategyId) -> String {
        format!("{}strategies:{strategy_id}", self.namespace())
    }

    fn persist_order(&mut self, order: &Order) -> Result<(), TradingError> {
        let definition = self.order_serializer.serialize(order)?;
        let frames = order
            .events()
            .iter()
            .map(|e| self.event_serializer.serialize(&Event::Order(e.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.put(&self.order_key(order.id()), definition)?;
        self.store
            .put(&self.order_events_key(order.id()), pack_frames(&frames))?;
        Ok(())
    }

    fn persist_position(&mut self, position: &Position) -> Result<(), TradingError> {
        let frames = position
            .events()
            .iter()
            .map(|e| self.event_serializer.serialize(&Event::Order(e.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        self.store
            .put(&self.position_key(position.id()), pack_frames(&frames))?;
        Ok(())
    }

    fn persist_account(&mut self, account: &Account) -> Result<(), TradingError> {
        let frames = account
            .events()
            .iter()
            .map(|e| self.event_serializer.serialize(&Event::Account(e.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        self.store
            .put(&self.account_key(account.id()), pack_frames(&frames))?;
        Ok(())
    }

    fn decode_order_event(&self, bytes: &[u8]) -> Result<crate::orders::OrderEventAny, TradingError> {
        match self.event_serializer.deserialize(bytes)? {
            Event::Order(event) => Ok(event),
            other => Err(TradingError::Serialization(format!(
                "expected an order event, found {}",
                other.type_name()
            ))),
        }
    }

    fn decode_account_event(&self, bytes: &[u8]) -> Result<AccountStateEvent, TradingError> {
        match self.event_serializer.deserialize(bytes)? {
            Event::Account(event) => Ok(event),
            other => Err(TradingError::Serialization(format!(
                "expected an account event, found {}",
                other.type_name()
            ))),
        }
    }

    /// Rebuild the in-process cache from the store, replaying each entity's
    /// event log.
    pub fn load_cache(&mut self) -> Result<(), TradingError> {
        self.cache.reset();

        let order_prefix = format!("{}orders:", self.namespace());
        for key in self.store.keys_with_prefix(&order_prefix)? {
            let order_id = OrderId::from(&key[order_prefix.len()..]);
            let definition = self
                .store
                .get(&key)?
                .ok_or_else(|| TradingError::NotFound(format!("order payload {key}")))?;
            let mut order = self.order_serializer.deserialize(&definition)?;

            if let Some(bytes) = self.store.get(&self.order_events_key(&order_id))? {
                for frame in unpack_frames(&bytes)? {
                    let event = self.decode_order_event(&frame)?;
                    order
                        .apply(event)
                        .map_err(|e| TradingError::Serialization(e.to_string()))?;
                }
            }

            let index_bytes = self
                .store
                .get(&self.order_index_key(&order_id))?
                .ok_or_else(|| TradingError::NotFound(format!("order index {order_id}")))?;
            let index = ObjectMap::decode(&index_bytes)?;
            let strategy_id = StrategyId::from(index.get_str("StrategyId")?);
            let position_id = PositionId::from(index.get_str("PositionId")?);

            self.cache.add_order(order.clone(), &strategy_id, &position_id)?;
            self.cache.update_order(&order)?;
        }

        let position_prefix = format!("{}positions:", self.namespace());
        for key in self.store.keys_with_prefix(&position_prefix)? {
            let position_id = PositionId::from(&key[position_prefix.len()..]);
            let bytes = self
                .store
                .get(&key)?
                .ok_or_else(|| TradingError::NotFound(format!("position payload {key}")))?;
            let frames = unpack_frames(&bytes)?;
            let mut events = frames.iter().map(|f| self.decode_order_event(f));
            let first = events
                .next()
                .ok_or_else(|| TradingError::Serialization(format!("empty position log {key}")))??;
            let mut position = Position::new(position_id.clone(), &first)
                .map_err(|e| TradingError::Serialization(e.to_string()))?;
            for event in events {
                position
                    .apply(&event?)
                    .map_err(|e| TradingError::Serialization(e.to_string()))?;
            }

            let index_bytes = self
                .store
                .get(&self.position_index_key(&position_id))?
                .ok_or_else(|| TradingError::NotFound(format!("position index {position_id}")))?;
            let index = ObjectMap::decode(&index_bytes)?;
            let strategy_id = StrategyId::from(index.get_str("StrategyId")?);

            self.cache.add_position(position.clone(), &strategy_id)?;
            self.cache.update_position(&position)?;
        }

        let account_prefix = format!("{}accounts:", self.namespace());
        for key in self.store.keys_with_prefix(&account_prefix)? {
            let bytes = self
                .store
                .get(&key)?
                .ok_or_else(|| TradingError::NotFound(format!("account payload {key}")))?;
            let frames = unpack_frames(&bytes)?;
            let mut events = frames.iter().map(|f| self.decode_account_event(f));
            let first = events
                .next()
                .ok_or_else(|| TradingError::Serialization(format!("empty account log {key}")))??;
            let mut account = Account::new(first);
            for event in events {
                account
                    .apply(event?)
                    .map_err(|e| TradingError::Serialization(e.to_string()))?;
            }
            self.cache.add_account(account)?;
        }

        let strategy_prefix = format!("{}strategies:", self.namespace());
        for key in self.store.keys_with_prefix(&strategy_prefix)? {
            let strategy_id = StrategyId::from(&key[strategy_prefix.len()..]);
            let bytes = self
                .store
                .get(&key)?
                .ok_or_else(|| TradingError::NotFound(format!("strategy payload {key}")))?;
            let map = ObjectMap::decode(&bytes)?;
            let mut state = StrategyState::new();
            for entry_key in map_keys(&map) {
                state.insert(entry_key.clone(), map.get_str(&entry_key)?.to_string());
            }
            self.cache.update_strategy_state(&strategy_id, state)?;
        }

        Ok(())
    }
}

// ObjectMap has no key iterator on purpose (the wire side never needs one);
// the strategy-state payload stores its own key list under a reserved entry.
fn map_keys(map: &ObjectMap) -> Vec<String> {
    match map.get_str("__keys__") {
        Ok(joined) if !joined.is_empty() => joined.split('\u{1f}').map(String::from).collect(),
        _ => Vec::new(),
    }
}

fn encode_strategy_state(state: &StrategyState) -> Vec<u8> {
    let mut map = ObjectMap::new();
    let mut keys: Vec<&String> = state.keys().collect();
    keys.sort();
    map.put(
        "__keys__",
        keys.iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join("\u{1f}"),
    );
    for (key, value) in state {
        map.put(key, value.as_str());
    }
    map.encode()
}

impl ExecutionDatabase for KeyValueExecutionDatabase {
    fn add_account(&mut self, account: Account) -> Result<(), TradingError> {
        self.cache.add_account(account.clone())?;
        self.persist_account(&account)
    }

    fn add_order(
        &mut self,
        order: Order,
        strategy_id: &StrategyId,
        position_id: &PositionId,
    ) -> Result<(), TradingError> {
        self.cache.add_order(order.clone(), strategy_id, position_id)?;
        let mut index = ObjectMap::new();
        index.put("StrategyId", strategy_id.as_str());
        index.put("PositionId", position_id.as_str());
        self.store
            .put(&self.order_index_key(order.id()), index.encode())?;
        self.persist_order(&order)
    }

    fn add_position(
        &mut self,
        position: Position,
        strategy_id: &StrategyId,
    ) -> Result<(), TradingError> {
        self.cache.add_position(position.clone(), strategy_id)?;
        let mut index = ObjectMap::new();
        index.put("StrategyId", strategy_id.as_str());
        self.store
            .put(&self.position_index_key(position.id()), index.encode())?;
        self.persist_position(&position)
    }

    fn update_account(&mut self, account: &Account) -> Result<(), TradingError> {
        self.cache.update_account(account)?;
        self.persist_account(account)
    }

    fn update_order(&mut self, order: &Order) -> Result<(), TradingError> {
        self.cache.update_order(order)?;
        self.persist_order(order)
    }

    fn update_position(&mut self, position: &Position) -> Result<(), TradingError> {
        self.cache.update_position(position)?;
        self.persist_position(position)
    }

    fn update_strategy_state(
        &mut self,
        strategy_id: &StrategyId,
        state: StrategyState,
    ) -> Result<(), TradingError> {
        self.cache.update_strategy_state(strategy_id, state.clone())?;
        self.store
            .put(&self.strategy_key(strategy_id), encode_strategy_state(&state))
    }

    fn delete_strategy(&mut self, strategy_id: &StrategyId) -> Result<(), TradingError> {
        self.cache.delete_strategy(strategy_id)?;
        self.store.delete(&self.strategy_key(strategy_id))
    }

    fn get_account(&self, account_id: &AccountId) -> Option<Account> {
        self.cache.get_account(account_id)
    }

    fn get_order(&self, order_id: &OrderId) -> Option<Order> {
        self.cache.get_order(order_id)
    }

    fn get_orders(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order> {
        self.cache.get_orders(strategy_id)
    }

    fn get_order_ids(&self) -> HashSet<OrderId> {
        self.cache.get_order_ids()
    }

    fn get_orders_working(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order> {
        self.cache.get_orders_working(strategy_id)
    }

    fn get_orders_completed(&self, strategy_id: Option<&StrategyId>) -> HashMap<OrderId, Order> {
        self.cache.get_orders_completed(strategy_id)
    }

    fn get_position(&self, position_id: &PositionId) -> Option<Position> {
        self.cache.get_position(position_id)
    }

    fn get_position_for_order(&self, order_id: &OrderId) -> Option<Position> {
        self.cache.get_position_for_order(order_id)
    }

    fn get_position_id(&self, order_id: &OrderId) -> Option<PositionId> {
        self.cache.get_position_id(order_id)
    }

    fn get_position_id_for_broker_id(
        &self,
        position_id_broker: &PositionIdBroker,
    ) -> Option<PositionId> {
        self.cache.get_position_id_for_broker_id(position_id_broker)
    }

    fn get_positions(&self, strategy_id: Option<&StrategyId>) -> HashMap<PositionId, Position> {
        self.cache.get_positions(strategy_id)
    }

    fn get_position_ids(&self) -> HashSet<PositionId> {
        self.cache.get_position_ids()
    }

    fn get_positions_open(
        &self,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<PositionId, Position> {
        self.cache.get_positions_open(strategy_id)
    }

    fn get_positions_closed(
        &self,
        strategy_id: Option<&StrategyId>,
    ) -> HashMap<PositionId, Position> {
        self.cache.get_positions_closed(strategy_id)
    }

    fn get_strategy_for_order(&self, order_id: &OrderId) -> Option<StrategyId> {
        self.cache.get_strategy_for_order(order_id)
    }

    fn get_strategy_for_position(&self, position_id: &PositionId) -> Option<StrategyId> {
        self.cache.get_strategy_for_position(position_id)
    }

    fn get_strategy_ids(&self) -> HashSet<StrategyId> {
        self.cache.get_strategy_ids()
    }

    fn get_strategy_state(&self, strategy_id: &StrategyId) -> Option<StrategyState> {
        self.cache.get_strategy_state(strategy_id)
    }

    fn order_exists(&self, order_id: &OrderId) -> bool {
        self.cache.order_exists(order_id)
    }

    fn position_exists(&self, position_id: &PositionId) -> bool {
        self.cache.position_exists(position_id)
    }

    fn position_exists_for_order(&self, order_id: &OrderId) -> bool {
        self.cache.position_exists_for_order(order_id)
    }

    fn position_indexed_for_order(&self, order_id: &OrderId) -> bool {
        self.cache.position_indexed_for_order(order_id)
    }

    fn is_position_open(&self, position_id: &PositionId) -> bool {
        self.cache.is_position_open(position_id)
    }

    fn is_position_closed(&self, position_id: &PositionId) -> bool {
        self.cache.is_position_closed(position_id)
    }

    fn count_orders_total(&self) -> usize {
        self.cache.count_orders_total()
    }

    fn count_orders_working(&self) -> usize {
        self.cache.count_orders_working()
    }

    fn count_orders_completed(&self) -> usize {
        self.cache.count_orders_completed()
    }

    fn count_positions_total(&self) -> usize {
        self.cache.count_positions_total()
    }

    fn count_positions_open(&self) -> usize {
        self.cache.count_positions_open()
    }

    fn count_positions_closed(&self) -> usize {
        self.cache.count_positions_closed()
    }

    fn check_residuals(&self) {
        self.cache.check_residuals();
    }

    fn reset(&mut self) {
        self.cache.reset();
    }

    fn flush(&mut self) {
        let namespace = self.namespace();
        if let Err(e) = self.store.clear_with_prefix(&namespace) {
            tracing::error!(error = %e, "failed to flush key-value store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{ExecutionId, Symbol};
    use crate::orders::{
        OrderAccepted, OrderEventAny, OrderFilled, OrderSide, OrderSubmitted, OrderType,
        TimeInForce,
    };
    use crate::types::{Currency, Money, Price, Quantity};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn unix_epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn database() -> KeyValueExecutionDatabase {
        KeyValueExecutionDatabase::new(
            TraderId::from("TESTER-000"),
            Box::new(InMemoryKeyValueStore::new()),
        )
    }

    fn market_order(id: &str) -> Order {
        Order::new(
            OrderId::from(id),
            Symbol::new("AUDUSD", "FXCM").unwrap(),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from_units(100_000),
            TimeInForce::Day,
            None,
            None,
            Uuid::from_u128(1),
            unix_epoch(),
        )
        .unwrap()
    }

    fn submitted(order: &Order) -> OrderEventAny {
        OrderEventAny::Submitted(OrderSubmitted {
            order_id: order.id().clone(),
            account_id: AccountId::from("FXCM-123456"),
            submitted_time: unix_epoch(),
            id: Uuid::from_u128(10),
            timestamp: unix_epoch(),
        })
    }

    fn accepted(order: &Order) -> OrderEventAny {
        OrderEventAny::Accepted(OrderAccepted {
            order_id: order.id().clone(),
            account_id: AccountId::from("FXCM-123456"),
            accepted_time: unix_epoch(),
            id: Uuid::from_u128(11),
            timestamp: unix_epoch(),
        })
    }

    fn filled(order: &Order, side: OrderSide) -> OrderEventAny {
        OrderEventAny::Filled(OrderFilled {
            order_id: order.id().clone(),
            account_id: AccountId::from("FXCM-123456"),
            execution_id: ExecutionId::from("E-1"),
            position_id_broker: crate::identifiers::PositionIdBroker::from("ET-1"),
            symbol: order.symbol().clone(),
            side,
            filled_quantity: order.quantity(),
            average_price: Price::parse("1.00001").unwrap(),
            quote_currency: Currency::Usd,
            execution_time: unix_epoch(),
            id: Uuid::from_u128(12),
            timestamp: unix_epoch(),
        })
    }

    fn account_event() -> AccountStateEvent {
        AccountStateEvent {
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
        }
    }

    #[test]
    fn reads_are_consistent_after_writes() {
        let mut db = database();
        let strategy = StrategyId::from("EMACross-001");
        let position_id = PositionId::from("P-1");
        let mut order = market_order("O-1");

        db.add_order(order.clone(), &strategy, &position_id).unwrap();
        assert!(db.order_exists(order.id()));

        order.apply(submitted(&order)).unwrap();
        order.apply(accepted(&order)).unwrap();
        order.apply(filled(&order, OrderSide::Buy)).unwrap();
        db.update_order(&order).unwrap();
        assert_eq!(db.count_orders_completed(), 1);

        let fill = filled(&order, OrderSide::Buy);
        let position = Position::new(position_id.clone(), &fill).unwrap();
        db.add_position(position, &strategy).unwrap();
        assert!(db.is_position_open(&position_id));
    }

    #[test]
    fn cache_rebuilds_from_store() {
        let strategy = StrategyId::from("EMACross-001");
        let position_id = PositionId::from("P-1");

        // Populate through one database instance.
        let mut db = database();
        let mut order = market_order("O-1");
        db.add_order(order.clone(), &strategy, &position_id).unwrap();
        order.apply(submitted(&order)).unwrap();
        order.apply(accepted(&order)).unwrap();
        order.apply(filled(&order, OrderSide::Buy)).unwrap();
        db.update_order(&order).unwrap();

        let fill = filled(&order, OrderSide::Buy);
        db.add_position(Position::new(position_id.clone(), &fill).unwrap(), &strategy)
            .unwrap();
        db.add_account(Account::new(account_event())).unwrap();
        db.update_strategy_state(
            &strategy,
            StrategyState::from([("bars_seen".to_string(), "42".to_string())]),
        )
        .unwrap();

        let store = db.into_store();
        let mut rebuilt = KeyValueExecutionDatabase::new(TraderId::from("TESTER-000"), store);
        assert_eq!(rebuilt.count_orders_total(), 0);
        rebuilt.load_cache().unwrap();

        assert_eq!(rebuilt.count_orders_total(), 1);
        assert_eq!(rebuilt.count_orders_completed(), 1);
        assert_eq!(rebuilt.count_positions_total(), 1);
        assert!(rebuilt.is_position_open(&position_id));
        assert_eq!(
            rebuilt.get_strategy_for_order(&OrderId::from("O-1")),
            Some(strategy.clone())
        );
        assert!(rebuilt
            .get_account(&AccountId::from("FXCM-123456"))
            .is_some());
        assert_eq!(
            rebuilt.get_strategy_state(&strategy),
            Some(StrategyState::from([(
                "bars_seen".to_string(),
                "42".to_string()
            )]))
        );
    }

    #[test]
    fn flush_wipes_the_namespace() {
        let mut db = database();
        db.add_account(Account::new(account_event())).unwrap();
        db.flush();
        db.reset();
        db.load_cache().unwrap();
        assert!(db.get_account(&AccountId::from("FXCM-123456")).is_none());
    }

    #[test]
    fn duplicate_order_leaves_store_untouched() {
        let mut db = database();
        let strategy = StrategyId::from("EMACross-001");
        let position_id = PositionId::from("P-1");
        db.add_order(market_order("O-1"), &strategy, &position_id)
            .unwrap();
        let err = db
            .add_order(market_order("O-1"), &strategy, &position_id)
            .unwrap_err();
        assert!(matches!(err, TradingError::DuplicateKey(_)));
    }
}
