//! # Cart Pricing
//!
//! Turns locked unit prices and quantities into the numbers stored on a sale.
//!
//! ```text
//! line.subtotal  = unit_price × quantity          (exact, checked)
//! subtotal       = Σ line.subtotal                (exact, checked)
//! discount       = round_half_even(subtotal × pct / 100)
//! total          = subtotal − discount
//! ```
//!
//! Unit prices always come from the product rows read under lock, never from
//! the client.

use serde::Serialize;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DiscountRate;
use crate::validation::ValidationResult;

/// A cart line with its price resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A priced cart line, ready to be persisted as a sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// The full price breakdown of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartQuote {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub discount_rate: DiscountRate,
    pub discount: Money,
    pub total: Money,
}

/// Prices a cart.
///
/// ## Errors
/// `TooLarge` when a line or the cart subtotal does not fit in centavos.
///
/// ## Example
/// ```rust
/// use cantina_core::money::Money;
/// use cantina_core::pricing::{quote_cart, LineInput};
/// use cantina_core::types::DiscountRate;
///
/// let quote = quote_cart(
///     &[LineInput { product_id: 1, quantity: 2, unit_price: Money::from_cents(500) }],
///     DiscountRate::parse("10").unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(quote.subtotal.cents(), 1000);
/// assert_eq!(quote.discount.cents(), 100);
/// assert_eq!(quote.total.cents(), 900);
/// ```
pub fn quote_cart(lines: &[LineInput], discount_rate: DiscountRate) -> ValidationResult<CartQuote> {
    let too_large = |field: &str| ValidationError::TooLarge {
        field: field.to_string(),
    };

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();

    for line in lines {
        let line_subtotal = line
            .unit_price
            .checked_mul_quantity(line.quantity)
            .ok_or_else(|| too_large("quantidade"))?;
        subtotal = subtotal
            .checked_add(line_subtotal)
            .ok_or_else(|| too_large("subtotal"))?;

        priced.push(PricedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line_subtotal,
        });
    }

    let discount = subtotal.discount_amount(discount_rate);

    Ok(CartQuote {
        lines: priced,
        subtotal,
        discount_rate,
        discount,
        total: subtotal - discount,
    })
}
