//! Type-safe money representation using decimal arithmetic.
//!
//! All prices in Staybook are US dollars as quoted by the booking API, so the
//! currency is implicit. Arithmetic stays in [`Decimal`] end to end; there is
//! no float rounding between the nightly rate and the booking total.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in dollars.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from whole cents, e.g. `from_cents(10_000)` is `$100.00`.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a whole number of units (nights). `None` if the result
    /// does not fit in a [`Decimal`].
    #[must_use]
    pub fn checked_times(self, units: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(units)).map(Self)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Money {
    /// Formats as dollars with two decimals, e.g. `$300.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_cents(30_000).to_string(), "$300.00");
        assert_eq!(Money::new(Decimal::new(1995, 1)).to_string(), "$199.50");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_times_is_exact() {
        let nightly = Money::new(Decimal::new(3333, 2));
        assert_eq!(nightly.checked_times(3), Some(Money::new(Decimal::new(9999, 2))));
    }

    #[test]
    fn test_times_overflow_is_none() {
        assert_eq!(Money::new(Decimal::MAX).checked_times(2), None);
        assert_eq!(Money::new(Decimal::MAX).checked_times(1), Some(Money::new(Decimal::MAX)));
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Money = serde_json::from_str("120.5").unwrap_or_default();
        let from_string: Money = serde_json::from_str("\"120.5\"").unwrap_or_default();
        assert_eq!(from_number, Money::from_cents(12_050));
        assert_eq!(from_string, from_number);
    }
}
