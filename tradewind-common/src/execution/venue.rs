//! The venue adapter seam.

use std::fmt;

use super::commands::{
    AccountInquiry, CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder,
};
use crate::events::Event;
use crate::types::QuoteTick;

/// A venue adapter the execution engine routes commands to.
///
/// Adapters return the events produced by a command synchronously; the
/// engine feeds them straight back through its own event path. Live
/// adapters that receive events asynchronously return nothing here and post
/// inbound events through the engine instead.
pub trait ExecutionClient: fmt::Debug {
    fn venue_name(&self) -> &str;

    fn account_inquiry(&mut self, command: &AccountInquiry) -> Vec<Event>;

    fn submit_order(&mut self, command: &SubmitOrder) -> Vec<Event>;

    fn submit_bracket_order(&mut self, command: &SubmitBracketOrder) -> Vec<Event>;

    fn modify_order(&mut self, command: &ModifyOrder) -> Vec<Event>;

    fn cancel_order(&mut self, command: &CancelOrder) -> Vec<Event>;

    /// Market data push for simulated venues. Live adapters take their data
    /// from the network and ignore this.
    fn process_tick(&mut self, tick: &QuoteTick) -> Vec<Event> {
        let _ = tick;
        Vec::new()
    }

    fn reset(&mut self);
}
