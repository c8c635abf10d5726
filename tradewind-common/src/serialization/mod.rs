//! Wire serialization: the message envelope label set, the binary
//! string-keyed map codec, timestamp formatting, and the object
//! serializers for orders, commands and events.
//!
//! Round-trip equality (`deserialize(serialize(x)) == x`) is the contract
//! for every serializer here; failures surface as
//! `TradingError::Serialization` and propagate to the transport boundary.

pub mod keys;

mod datetime;
mod map;
mod serializers;

pub use datetime::{format_timestamp, parse_timestamp};
pub use map::ObjectMap;
pub use serializers::{CommandSerializer, EventSerializer, OrderSerializer};

/// Sentinel for absent optional values inside an envelope.
pub const NONE: &str = "NONE";
