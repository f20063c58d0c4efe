//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;

/// An amount in the store currency (Indian rupees).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    /// Amount in rupees, not paise.
    pub amount: Decimal,
}

impl Price {
    /// Symbol shown before every amount.
    pub const SYMBOL: &'static str = "₹";

    /// Create a price in the store currency.
    #[must_use]
    pub const fn store(amount: Decimal) -> Self {
        Self { amount }
    }
}

impl fmt::Display for Price {
    /// Formats as symbol plus two decimals, e.g. `₹312.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", Self::SYMBOL, self.amount.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_two_decimals() {
        assert_eq!(Price::store(Decimal::new(300, 0)).to_string(), "₹300.00");
        assert_eq!(Price::store(Decimal::new(125, 1)).to_string(), "₹12.50");
    }

    #[test]
    fn test_display_rounds() {
        assert_eq!(Price::store(Decimal::new(19_999, 3)).to_string(), "₹20.00");
    }
}
