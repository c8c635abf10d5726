//! Position domain: the net-inventory aggregator and derived position
//! events.

mod events;
mod position;

pub use events::{PositionClosed, PositionEventAny, PositionModified, PositionOpened};
pub use position::{MarketPosition, Position};
