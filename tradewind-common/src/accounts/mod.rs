//! Account domain: cash/margin state folded from account state events.

mod account;
mod events;

pub use account::Account;
pub use events::AccountStateEvent;
