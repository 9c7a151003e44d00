//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    R$ 5,00 × 2 = 500 × 2 = 1000 centavos, exactly                      │
//! │    Percentages stay exact as rust_decimal::Decimal until the single    │
//! │    rounding step that turns them back into centavos                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cantina_core::money::Money;
//!
//! let price = Money::from_cents(500); // R$ 5.00
//! let line = price.checked_mul_quantity(2).unwrap();
//! assert_eq!(line.cents(), 1000);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (two fractional digits).
///
/// ## Design Decisions
/// - **i64 (signed)**: headroom for intermediate arithmetic
/// - **Checked helpers**: the sale engine never lets a total wrap
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► SaleLine.unit_price ──► SaleLine.subtotal
///                                                      │
///          Sale.subtotal ◄─────────────────────────────┘
///               │
///               ├──► discount_amount(rate) ──► Sale.discount
///               ▼
///          Sale.total = subtotal − discount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Converts an exact decimal amount (e.g. `5.00`) into Money.
    ///
    /// Returns `None` when the amount has more than two fractional digits
    /// or does not fit in centavos. Nothing is ever rounded here.
    ///
    /// ## Example
    /// ```rust
    /// use cantina_core::money::Money;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let price = Money::from_decimal(Decimal::from_str("5.50").unwrap()).unwrap();
    /// assert_eq!(price.cents(), 550);
    /// assert!(Money::from_decimal(Decimal::from_str("5.555").unwrap()).is_none());
    /// ```
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        let cents = amount.checked_mul(Decimal::ONE_HUNDRED)?;
        if !cents.fract().is_zero() {
            return None;
        }
        cents.to_i64().map(Money)
    }

    /// Returns the amount as a decimal with exactly two fractional digits.
    ///
    /// This is the form used on the wire (`"9.00"`), never for arithmetic.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies a unit price by a quantity, `None` on overflow.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Suco R$ 5.00
    /// Quantity: 2
    ///      │
    ///      ▼
    /// checked_mul_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line subtotal: R$ 10.00
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Calculates the discount amount for a percentage rate.
    ///
    /// ## Rounding
    /// `amount × pct / 100` is computed exactly in decimal and rounded once
    /// to whole centavos using round-half-to-even:
    /// ```text
    /// R$ 0.25 at 10%  = 2.5 centavos → 2
    /// R$ 0.35 at 10%  = 3.5 centavos → 4
    /// R$ 10.00 at 10% = 100 centavos → 100 (no rounding needed)
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use cantina_core::money::Money;
    /// use cantina_core::types::DiscountRate;
    ///
    /// let subtotal = Money::from_cents(1000);
    /// let rate = DiscountRate::parse("10").unwrap();
    /// assert_eq!(subtotal.discount_amount(rate).cents(), 100);
    /// ```
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        let exact = Decimal::from(self.0) * rate.percentage() / Decimal::ONE_HUNDRED;
        let rounded = exact.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        // 0 ≤ pct ≤ 50, so |rounded| ≤ |self| and always fits back in i64
        Money(rounded.to_i64().unwrap_or(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount in reais, for logs and messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}R$ {}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate(pct: &str) -> DiscountRate {
        DiscountRate::parse(pct).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10.99");
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5.50");
        assert_eq!(Money::zero().to_string(), "R$ 0.00");
    }

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(Money::from_decimal(dec!(5.00)), Some(Money::from_cents(500)));
        assert_eq!(Money::from_decimal(dec!(0.1)), Some(Money::from_cents(10)));
        assert_eq!(Money::from_decimal(dec!(1.234)), None);
        assert_eq!(Money::from_cents(900).to_decimal(), dec!(9.00));
        assert_eq!(Money::from_cents(900).to_decimal().to_string(), "9.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_cents(500);
        assert_eq!(price.checked_mul_quantity(2), Some(Money::from_cents(1000)));
        assert_eq!(price.checked_mul_quantity(i64::MAX), None);
        assert_eq!(
            Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)),
            None
        );
        assert_eq!((price + price - price).cents(), 500);
    }

    #[test]
    fn test_discount_amount_exact() {
        assert_eq!(Money::from_cents(1000).discount_amount(rate("10")).cents(), 100);
        assert_eq!(Money::from_cents(1000).discount_amount(rate("0")).cents(), 0);
        assert_eq!(Money::from_cents(1000).discount_amount(rate("50")).cents(), 500);
    }

    #[test]
    fn test_discount_amount_rounds_half_to_even() {
        // 25 * 10% = 2.5 → 2, 35 * 10% = 3.5 → 4
        assert_eq!(Money::from_cents(25).discount_amount(rate("10")).cents(), 2);
        assert_eq!(Money::from_cents(35).discount_amount(rate("10")).cents(), 4);
        // 333 * 12.5% = 41.625 → 42
        assert_eq!(Money::from_cents(333).discount_amount(rate("12.5")).cents(), 42);
        // 999 * 33.33% = 332.9667 → 333
        assert_eq!(Money::from_cents(999).discount_amount(rate("33.33")).cents(), 333);
    }
}
