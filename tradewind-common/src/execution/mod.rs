//! Execution subsystem: trading commands, the execution engine, the venue
//! adapter seam, and the simulated venue with its probabilistic fill model.

mod commands;
mod engine;
mod fill_model;
mod simulated_venue;
mod venue;

pub use commands::{
    AccountInquiry, CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder, TradingCommand,
};
pub use engine::ExecutionEngine;
pub use fill_model::FillModel;
pub use simulated_venue::{SimulatedVenue, SimulatedVenueConfig};
pub use venue::ExecutionClient;
