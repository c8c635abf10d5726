//! Tick data source and the bounded per-symbol tick cache.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::identifiers::Symbol;
use crate::types::QuoteTick;

/// An in-memory tick stream, replayed in timestamp order.
///
/// Ticks are stably sorted at construction, so two ticks sharing a
/// timestamp keep their input order.
#[derive(Debug, Clone)]
pub struct TickDataSource {
    ticks: Vec<QuoteTick>,
    index: usize,
}

impl TickDataSource {
    pub fn new(mut ticks: Vec<QuoteTick>) -> Self {
        ticks.sort_by_key(|tick| tick.timestamp);
        Self { ticks, index: 0 }
    }

    /// The timestamp of the next tick, if any remain.
    pub fn peek_timestamp(&self) -> Option<DateTime<Utc>> {
        self.ticks.get(self.index).map(|tick| tick.timestamp)
    }

    pub fn next_tick(&mut self) -> Option<QuoteTick> {
        let tick = self.ticks.get(self.index).cloned();
        if tick.is_some() {
            self.index += 1;
        }
        tick
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.ticks.len() - self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// The data client's bounded tick cache: the most recent `capacity` ticks
/// per symbol, newest first.
#[derive(Debug)]
pub struct DataClient {
    capacity: usize,
    ticks: HashMap<Symbol, VecDeque<QuoteTick>>,
}

impl DataClient {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ticks: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a tick, evicting the oldest once at capacity.
    pub fn process_tick(&mut self, tick: &QuoteTick) {
        let cache = self.ticks.entry(tick.symbol.clone()).or_default();
        cache.push_front(tick.clone());
        if cache.len() > self.capacity {
            cache.pop_back();
        }
    }

    /// The tick at reverse index `index` (0 is the most recent).
    pub fn quote_tick(&self, symbol: &Symbol, index: usize) -> Option<&QuoteTick> {
        self.ticks.get(symbol).and_then(|cache| cache.get(index))
    }

    pub fn tick_count(&self, symbol: &Symbol) -> usize {
        self.ticks.get(symbol).map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.ticks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Price, Quantity};
    use chrono::TimeZone;

    fn audusd() -> Symbol {
        Symbol::new("AUDUSD", "FXCM").unwrap()
    }

    fn tick(bid: &str, secs: i64) -> QuoteTick {
        QuoteTick::new(
            audusd(),
            Price::parse(bid).unwrap(),
            Price::parse(bid).unwrap(),
            Quantity::from_units(1_000_000),
            Quantity::from_units(1_000_000),
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[test]
    fn source_replays_in_timestamp_order() {
        let mut source =
            TickDataSource::new(vec![tick("1.2", 5), tick("1.1", 1), tick("1.3", 3)]);
        assert_eq!(source.len(), 3);
        let times: Vec<i64> = std::iter::from_fn(|| source.next_tick())
            .map(|t| t.timestamp.timestamp())
            .collect();
        assert_eq!(times, vec![1, 3, 5]);
        assert_eq!(source.remaining(), 0);

        source.reset();
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.peek_timestamp().unwrap().timestamp(), 1);
    }

    #[test]
    fn equal_timestamps_preserve_input_order() {
        let a = tick("1.1", 1);
        let b = tick("1.2", 1);
        let mut source = TickDataSource::new(vec![a.clone(), b.clone()]);
        assert_eq!(source.next_tick().unwrap(), a);
        assert_eq!(source.next_tick().unwrap(), b);
    }

    #[test]
    fn cache_evicts_beyond_capacity() {
        let mut client = DataClient::new(2);
        client.process_tick(&tick("1.1", 1));
        client.process_tick(&tick("1.2", 2));
        client.process_tick(&tick("1.3", 3));

        assert_eq!(client.tick_count(&audusd()), 2);
        assert_eq!(
            client.quote_tick(&audusd(), 0).unwrap().timestamp.timestamp(),
            3
        );
        assert_eq!(
            client.quote_tick(&audusd(), 1).unwrap().timestamp.timestamp(),
            2
        );
        assert!(client.quote_tick(&audusd(), 2).is_none());
    }
}
