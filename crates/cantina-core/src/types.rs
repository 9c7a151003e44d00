//! # Domain Types
//!
//! Core domain types used throughout Cantina POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price_cents    │   │  subtotal       │   │  kind (ENT/PER) │       │
//! │  │  stock          │   │  discount_pct   │   │  quantity       │       │
//! │  │  tracks_stock   │   │  total          │   │  reason         │       │
//! │  └─────────────────┘   │  paid / settled │   └─────────────────┘       │
//! │                        └────────┬────────┘                              │
//! │  ┌─────────────────┐            │ owns                                  │
//! │  │    Customer     │   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │  card_code      │   │    SaleLine     │   │  PaymentMethod  │       │
//! │  │  active         │   │  unit price     │   │  DIN CAR PIX FIA│       │
//! │  └─────────────────┘   │  (snapshot)     │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire codes (`DIN`, `FIA`, `ENT`, ...) are the ones the canteen's existing
//! front end already sends; Rust names are descriptive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Largest discount percentage a sale may carry.
pub const MAX_DISCOUNT_PERCENT: i64 = 50;

/// A sale-level discount percentage, always within `[0, 50]` with at most
/// two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    /// Parses and bounds-checks a percentage such as `"10"` or `"12.5"`.
    ///
    /// ## Rules
    /// - Must parse as a decimal number
    /// - At most 2 fractional digits (matches storage precision)
    /// - `0 ≤ pct ≤ 50`
    ///
    /// ## Example
    /// ```rust
    /// use cantina_core::types::DiscountRate;
    ///
    /// assert!(DiscountRate::parse("10").is_ok());
    /// assert!(DiscountRate::parse("60").is_err());
    /// assert!(DiscountRate::parse("dez").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        let value = Decimal::from_str(input)
            .or_else(|_| Decimal::from_scientific(input))
            .map_err(|_| ValidationError::InvalidFormat {
                field: "desconto_percentual".to_string(),
                reason: "must be a decimal number".to_string(),
            })?;

        DiscountRate::from_decimal(value)
    }

    /// Bounds-checks an already-parsed percentage.
    pub fn from_decimal(value: Decimal) -> Result<Self, ValidationError> {
        let value = value.normalize();

        if value.scale() > 2 {
            return Err(ValidationError::InvalidFormat {
                field: "desconto_percentual".to_string(),
                reason: "at most 2 decimal places".to_string(),
            });
        }

        if value < Decimal::ZERO || value > Decimal::from(MAX_DISCOUNT_PERCENT) {
            return Err(ValidationError::OutOfRange {
                field: "desconto_percentual".to_string(),
                min: 0,
                max: MAX_DISCOUNT_PERCENT,
            });
        }

        Ok(DiscountRate(value.abs()))
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(Decimal::ZERO)
    }

    /// Returns the percentage (10% → `10`).
    #[inline]
    pub const fn percentage(&self) -> Decimal {
        self.0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Display name shown to the operator.
    pub name: String,

    pub description: String,

    /// Current sale price in centavos.
    pub price_cents: i64,

    /// Unit cost in centavos.
    pub cost_cents: i64,

    /// Stock counter. Only meaningful when `tracks_stock` is set.
    pub stock: i64,

    /// Whether sales check and decrement `stock`.
    pub tracks_stock: bool,

    /// Inactive products cannot be sold.
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        !self.tracks_stock || quantity <= self.stock
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A canteen customer, optionally identified by a card code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    /// Unique when present.
    pub card_code: Option<String>,
    pub phone: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale is paid. `Credit` ("fiado") leaves the sale as a receivable.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "DIN")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "DIN"))]
    Cash,

    #[serde(rename = "CAR")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CAR"))]
    Card,

    #[serde(rename = "PIX")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PIX"))]
    Pix,

    #[serde(rename = "FIA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "FIA"))]
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Pix,
        PaymentMethod::Credit,
    ];

    /// The wire code.
    pub const fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "DIN",
            PaymentMethod::Card => "CAR",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Credit => "FIA",
        }
    }

    /// Deferred payment: the sale is created unpaid.
    #[inline]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "forma_pagamento".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.code().to_string()).collect(),
            })
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale. Immutable except for `paid`/`settled_at`.
///
/// ## Invariants
/// - `total_cents = subtotal_cents − discount_cents`
/// - `discount_cents = round_half_even(subtotal × pct / 100)`
/// - `discount_percentage ∈ [0, 50]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sale {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub operator: String,
    pub created_at: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub discount_percentage: DiscountRate,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub paid: bool,
    pub settled_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
/// The unit price is frozen at finalization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity × unit_price_cents`
    pub subtotal_cents: i64,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a manual stock correction.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Restock ("entrada").
    #[serde(rename = "ENT", alias = "IN")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ENT"))]
    In,

    /// Loss ("perda").
    #[serde(rename = "PER", alias = "OUT")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PER"))]
    Out,
}

impl MovementKind {
    pub const fn code(&self) -> &'static str {
        match self {
            MovementKind::In => "ENT",
            MovementKind::Out => "PER",
        }
    }
}

impl FromStr for MovementKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ENT" | "IN" => Ok(MovementKind::In),
            "PER" | "OUT" => Ok(MovementKind::Out),
            _ => Err(ValidationError::NotAllowed {
                field: "tipo".to_string(),
                allowed: vec!["ENT".to_string(), "PER".to_string()],
            }),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Append-only ledger entry for a manual stock correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
    pub operator: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

/// One cart line as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Raw input to sale finalization.
///
/// Payment method and discount arrive unparsed so that malformed values are
/// reported as validation failures in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleRequest {
    pub customer_id: Option<i64>,
    pub payment_method: String,
    pub discount_percentage: String,
    pub lines: Vec<CartLine>,
    pub notes: Option<String>,
}

/// Raw input to a manual stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustmentRequest {
    pub product_id: i64,
    pub kind: String,
    pub quantity: i64,
    pub reason: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
