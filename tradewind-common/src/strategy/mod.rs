//! The strategy contract.
//!
//! Strategies implement lifecycle hooks and handlers; the execution engine
//! calls into them and routes the commands they queue on their context.
//! Strategies never mutate the execution database — they observe through
//! its read API on the context.

mod context;

pub use context::StrategyContext;

use crate::events::Event;
use crate::identifiers::StrategyId;
use crate::types::QuoteTick;

pub trait Strategy {
    /// The unique identifier for this strategy instance.
    fn strategy_id(&self) -> StrategyId;

    /// Called once when the trading session starts.
    fn on_start(&mut self, _ctx: &mut StrategyContext) {}

    /// Called for every market tick.
    fn on_tick(&mut self, _tick: &QuoteTick, _ctx: &mut StrategyContext) {}

    /// Called for every order, position, account and time event addressed
    /// to this strategy.
    fn on_event(&mut self, _event: &Event, _ctx: &mut StrategyContext) {}

    /// Called once when the trading session stops.
    fn on_stop(&mut self, _ctx: &mut StrategyContext) {}

    /// Called when the engine resets between runs.
    fn on_reset(&mut self) {}

    /// Cancel this strategy's working orders automatically at stop.
    fn cancel_all_orders_on_stop(&self) -> bool {
        true
    }

    /// Flatten this strategy's open positions automatically at stop.
    fn flatten_on_stop(&self) -> bool {
        false
    }
}
