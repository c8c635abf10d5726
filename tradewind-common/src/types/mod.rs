//! Core value types: fixed-precision decimals, prices, quantities, money and
//! market ticks.

mod decimal;
mod money;
mod tick;

pub use decimal::{Decimal64, Price, Quantity};
pub use money::{Currency, Money};
pub use tick::QuoteTick;
