//! The unified event type routed between the venue, the execution engine
//! and strategies.

use chrono::{DateTime, Utc};

use crate::accounts::AccountStateEvent;
use crate::clock::TimeEvent;
use crate::orders::OrderEventAny;
use crate::positions::PositionEventAny;

/// Any event a strategy can receive.
#[derive(Debug, Clone)]
pub enum Event {
    Order(OrderEventAny),
    Position(PositionEventAny),
    Account(AccountStateEvent),
    Time(TimeEvent),
}

impl Event {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Order(e) => e.timestamp(),
            Event::Position(e) => e.timestamp(),
            Event::Account(e) => e.timestamp,
            Event::Time(e) => e.timestamp,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Order(e) => e.type_name(),
            Event::Position(e) => e.type_name(),
            Event::Account(e) => e.type_name(),
            Event::Time(_) => "TimeEvent",
        }
    }
}

impl From<OrderEventAny> for Event {
    fn from(e: OrderEventAny) -> Self {
        Event::Order(e)
    }
}

impl From<PositionEventAny> for Event {
    fn from(e: PositionEventAny) -> Self {
        Event::Position(e)
    }
}

impl From<AccountStateEvent> for Event {
    fn from(e: AccountStateEvent) -> Self {
        Event::Account(e)
    }
}

impl From<TimeEvent> for Event {
    fn from(e: TimeEvent) -> Self {
        Event::Time(e)
    }
}
