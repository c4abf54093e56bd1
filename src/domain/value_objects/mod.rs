//! Value Objects for Travel Commerce

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel currency reported when lines span more than one currency.
pub const MIXED_CURRENCY: &str = "MIXED";

/// Currency assigned to catalog entries created without one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Money value object
///
/// Accumulation across currencies does not fail; the currency collapses to
/// the `MIXED` sentinel while the numeric sum keeps going, which is what the
/// cart summary reports for heterogeneous carts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_mixed(&self) -> bool { self.currency == MIXED_CURRENCY }

    /// Adds a line total, collapsing the currency to `MIXED` on a mismatch.
    pub fn accumulate(&mut self, amount: Decimal, currency: &str) {
        self.amount += amount;
        if self.currency != currency { self.currency = MIXED_CURRENCY.to_string(); }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount, self.currency) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accumulate_same_currency() {
        let mut m = Money::new(dec!(100), "USD");
        m.accumulate(dec!(50), "USD");
        assert_eq!(m.amount(), dec!(150));
        assert_eq!(m.currency(), "USD");
    }

    #[test]
    fn test_accumulate_collapses_to_mixed() {
        let mut m = Money::new(dec!(100), "USD");
        m.accumulate(dec!(50), "EUR");
        assert_eq!(m.amount(), dec!(150));
        assert!(m.is_mixed());
    }
}
