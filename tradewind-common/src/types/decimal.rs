//! Fixed-precision decimal value types.
//!
//! `Decimal64` wraps `rust_decimal::Decimal` with an explicit precision.
//! Construction rounds to the target precision with banker's rounding
//! (`MidpointNearestEven`); addition and subtraction are lossless at the
//! wider of the two precisions. Equality is exact on (value, precision).

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::TradingError;

/// A decimal number with explicit precision (fractional digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Decimal64 {
    value: Decimal,
    precision: u32,
}

impl Decimal64 {
    /// Maximum supported fractional digits.
    pub const MAX_PRECISION: u32 = 15;

    /// Create from a raw decimal, rounding to `precision` with banker's
    /// rounding.
    pub fn new(value: Decimal, precision: u32) -> Result<Self, TradingError> {
        if precision > Self::MAX_PRECISION {
            return Err(TradingError::InvalidArgument(format!(
                "precision {precision} exceeds maximum {}",
                Self::MAX_PRECISION
            )));
        }
        Ok(Self {
            value: value.round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven),
            precision,
        })
    }

    /// Parse from a string at the given precision.
    pub fn from_str_with_precision(value: &str, precision: u32) -> Result<Self, TradingError> {
        let parsed = Decimal::from_str(value).map_err(|e| {
            TradingError::InvalidArgument(format!("cannot parse decimal '{value}': {e}"))
        })?;
        Self::new(parsed, precision)
    }

    /// Parse from a string, inferring the precision from its scale.
    pub fn parse(value: &str) -> Result<Self, TradingError> {
        let parsed = Decimal::from_str(value).map_err(|e| {
            TradingError::InvalidArgument(format!("cannot parse decimal '{value}': {e}"))
        })?;
        Self::new(parsed, parsed.scale())
    }

    pub fn zero(precision: u32) -> Self {
        Self {
            value: Decimal::ZERO,
            precision,
        }
    }

    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Lossless addition at the wider precision.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            value: self.value + other.value,
            precision: self.precision.max(other.precision),
        }
    }

    /// Lossless subtraction at the wider precision.
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            value: self.value - other.value,
            precision: self.precision.max(other.precision),
        }
    }
}

impl fmt::Display for Decimal64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.precision as usize, self.value)
    }
}

/// A non-negative price with explicit precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(Decimal64);

impl Price {
    pub fn new(value: Decimal, precision: u32) -> Result<Self, TradingError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(TradingError::InvalidArgument(format!(
                "price cannot be negative (was {value})"
            )));
        }
        Ok(Self(Decimal64::new(value, precision)?))
    }

    /// Parse from a string, inferring precision from the scale.
    pub fn parse(value: &str) -> Result<Self, TradingError> {
        let inner = Decimal64::parse(value)?;
        Self::new(inner.as_decimal(), inner.precision())
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0.as_decimal()
    }

    pub fn precision(&self) -> u32 {
        self.0.precision()
    }

    /// The smallest representable increment at this precision.
    pub fn tick_size(&self) -> Decimal {
        Decimal::new(1, self.0.precision())
    }

    /// This price shifted by `ticks` minimum increments (may be negative).
    pub fn offset_ticks(&self, ticks: i64) -> Result<Self, TradingError> {
        let delta = self.tick_size() * Decimal::from(ticks);
        Self::new(self.as_decimal() + delta, self.precision())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative quantity with explicit precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(Decimal64);

impl Quantity {
    pub fn new(value: Decimal, precision: u32) -> Result<Self, TradingError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(TradingError::InvalidArgument(format!(
                "quantity cannot be negative (was {value})"
            )));
        }
        Ok(Self(Decimal64::new(value, precision)?))
    }

    /// A whole-unit quantity at precision zero.
    pub fn from_units(units: u64) -> Self {
        Self(Decimal64 {
            value: Decimal::from(units),
            precision: 0,
        })
    }

    pub fn parse(value: &str) -> Result<Self, TradingError> {
        let inner = Decimal64::parse(value)?;
        Self::new(inner.as_decimal(), inner.precision())
    }

    pub fn zero(precision: u32) -> Self {
        Self(Decimal64::zero(precision))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0.as_decimal()
    }

    pub fn precision(&self) -> u32 {
        self.0.precision()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
