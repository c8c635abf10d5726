//! Order domain: enums, lifecycle events, the order entity and its state
//! machine, bracket orders and the order factory.

mod bracket;
mod events;
mod factory;
mod order;
mod types;

pub use bracket::BracketOrder;
pub use events::{
    FillView, OrderAccepted, OrderCancelReject, OrderCancelled, OrderDenied, OrderEventAny,
    OrderExpired, OrderFilled, OrderInvalid, OrderModified, OrderPartiallyFilled, OrderRejected,
    OrderSubmitted, OrderWorking,
};
pub use factory::OrderFactory;
pub use order::Order;
pub use types::{OrderSide, OrderStatus, OrderType, TimeInForce};
