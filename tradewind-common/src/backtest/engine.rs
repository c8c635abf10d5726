//! The backtest driver loop.
//!
//! Owns the master test clock, the tick source, the simulated venue (inside
//! the execution engine) and the strategies. The run is a pure function of
//! its inputs: virtual time only moves with the data, timer events due
//! before a tick fire before the tick is processed, and every identifier
//! drawn along the way comes from seeded deterministic factories.

use chrono::{DateTime, Utc};
use tracing::info;

use super::data::{DataClient, TickDataSource};
use crate::clock::{Clock, LiveClock, TestClock};
use crate::config::{BacktestConfig, ExecDbKind};
use crate::database::{
    InMemoryExecutionDatabase, InMemoryKeyValueStore, KeyValueExecutionDatabase,
    SharedExecutionDatabase,
};
use crate::error::TradingError;
use crate::events::Event;
use crate::execution::{
    ExecutionEngine, FillModel, SimulatedVenue, SimulatedVenueConfig,
};
use crate::identifiers::UuidFactory;
use crate::strategy::{Strategy, StrategyContext};
use crate::types::QuoteTick;

pub struct BacktestEngine {
    config: BacktestConfig,
    clock: TestClock,
    wall_clock: LiveClock,
    data: TickDataSource,
    data_client: DataClient,
    engine: ExecutionEngine,
    database: SharedExecutionDatabase,
    strategy_count: u64,
}

impl BacktestEngine {
    pub fn new(
        config: BacktestConfig,
        ticks: Vec<QuoteTick>,
        fill_model: FillModel,
    ) -> Result<Self, TradingError> {
        config.validate()?;

        let database: SharedExecutionDatabase = match config.exec_db_type {
            ExecDbKind::InMemory => std::rc::Rc::new(std::cell::RefCell::new(
                InMemoryExecutionDatabase::new(config.trader_id.clone()),
            )),
            ExecDbKind::KeyValue => std::rc::Rc::new(std::cell::RefCell::new(
                KeyValueExecutionDatabase::new(
                    config.trader_id.clone(),
                    Box::new(InMemoryKeyValueStore::new()),
                ),
            )),
        };

        let venue = SimulatedVenue::new(
            SimulatedVenueConfig {
                venue_name: config.venue_name.clone(),
                account_id: config.account_id.clone(),
                account_currency: config.account_currency,
                starting_capital: config.starting_capital,
                commission_rate_bp: config.commission_rate_bp,
                rollover_interest_rate: config.short_term_interest_rate,
                frozen_account: config.frozen_account,
            },
            fill_model,
        );

        let mut engine = ExecutionEngine::new(
            config.trader_id.clone(),
            config.account_id.clone(),
            config.account_currency,
            database.clone(),
            UuidFactory::deterministic(0xE0),
        );
        engine.register_venue(Box::new(venue));

        Ok(Self {
            data_client: DataClient::new(config.tick_capacity),
            data: TickDataSource::new(ticks),
            clock: TestClock::new(DateTime::UNIX_EPOCH),
            wall_clock: LiveClock::new(),
            engine,
            database,
            config,
            strategy_count: 0,
        })
    }

    /// Register a strategy, giving it its own test clock and deterministic
    /// id factories.
    pub fn add_strategy(&mut self, strategy: Box<dyn Strategy>) -> Result<(), TradingError> {
        self.strategy_count += 1;
        let namespace = 0xA0_u64 + self.strategy_count;
        let ctx = StrategyContext::new(
            strategy.strategy_id(),
            self.config.trader_id.clone(),
            self.config.account_id.clone(),
            Box::new(TestClock::new(DateTime::UNIX_EPOCH)),
            self.database.clone(),
            UuidFactory::deterministic(namespace),
            UuidFactory::deterministic(namespace | 0x1000),
        )?;
        self.engine.register_strategy(strategy, ctx)
    }

    pub fn database(&self) -> SharedExecutionDatabase {
        self.database.clone()
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    /// Every event processed during the last run, in processing order.
    pub fn processed_events(&self) -> &[Event] {
        self.engine.processed_events()
    }

    /// Run the backtest over `[start, stop]`.
    pub fn run(
        &mut self,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<(), TradingError> {
        if start >= stop {
            return Err(TradingError::InvalidArgument(
                "the backtest start must precede the stop".to_string(),
            ));
        }
        let run_started = self.wall_clock.time_now();
        info!(
            start = %start.to_rfc3339(),
            stop = %stop.to_rfc3339(),
            ticks = self.data.len(),
            "backtest starting"
        );

        // Reset every component once, then pin all clocks to the start.
        self.database.borrow_mut().reset();
        self.engine.reset();
        self.data.reset();
        self.data_client.reset();
        self.clock.set_time(start);
        self.engine.set_strategy_clocks(start);
        self.engine.start_strategies();

        while let Some(next) = self.data.peek_timestamp() {
            if next > stop {
                break;
            }
            let Some(tick) = self.data.next_tick() else {
                break;
            };
            if tick.timestamp < start {
                continue;
            }

            // Timer events due in (prev_tick, tick] fire before the tick.
            self.engine.advance_strategy_clocks(tick.timestamp);
            self.clock.set_time(tick.timestamp);

            self.engine.process_venue_tick(&tick);
            self.data_client.process_tick(&tick);
            self.engine.on_tick(&tick);
        }

        self.engine.stop_strategies();
        self.database.borrow_mut().check_residuals();

        let elapsed = self.wall_clock.time_now() - run_started;
        info!(
            events = self.engine.event_count(),
            commands = self.engine.command_count(),
            elapsed_ms = elapsed.num_milliseconds(),
            "backtest complete"
        );
        Ok(())
    }
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("trader_id", &self.config.trader_id)
            .field("ticks", &self.data.len())
            .field("strategies", &self.strategy_count)
            .finish()
    }
}
