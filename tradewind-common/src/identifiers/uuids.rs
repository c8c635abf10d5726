//! UUID generation with a deterministic mode for backtesting.
//!
//! Event and command identifiers are UUIDs. Live components draw random v4
//! values; backtest components use counter-based UUIDs inside a namespace so
//! that replays with identical inputs produce byte-identical event streams.

use uuid::Uuid;

/// Produces UUIDs either randomly (live) or deterministically (backtest).
#[derive(Debug, Clone)]
pub struct UuidFactory {
    namespace: u64,
    count: u64,
    deterministic: bool,
}

impl UuidFactory {
    /// A factory producing random v4 UUIDs.
    pub fn random() -> Self {
        Self {
            namespace: 0,
            count: 0,
            deterministic: false,
        }
    }

    /// A factory producing counter-based UUIDs within `namespace`.
    ///
    /// Distinct namespaces never collide: the namespace occupies the high 64
    /// bits and the counter the low 64 bits.
    pub fn deterministic(namespace: u64) -> Self {
        Self {
            namespace,
            count: 0,
            deterministic: true,
        }
    }

    pub fn generate(&mut self) -> Uuid {
        if self.deterministic {
            self.count += 1;
            Uuid::from_u128(((self.namespace as u128) << 64) | self.count as u128)
        } else {
            Uuid::new_v4()
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
