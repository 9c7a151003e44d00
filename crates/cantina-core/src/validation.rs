//! # Validation Module
//!
//! Input validation for the sale finalization and stock adjustment requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/server)                                   │
//! │  └── Envelope shape (JSON / form deserialization)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, no I/O)                                   │
//! │  ├── Cart not empty, payment method known, discount within [0, 50]     │
//! │  └── Quantities positive, reason text bounded                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engines in cantina-db (inside the unit of work)              │
//! │  └── Customer/product existence, stock sufficiency under lock          │
//! │                                                                         │
//! │  Layers 1-2 fail before any transaction is opened                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{
    CartLine, DiscountRate, MovementKind, PaymentMethod, SaleRequest, StockAdjustmentRequest,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a stock movement reason.
pub const MAX_REASON_LEN: usize = 255;

/// Maximum number of customers returned by a lookup.
pub const CUSTOMER_SEARCH_LIMIT: u32 = 10;

// =============================================================================
// Validated Requests
// =============================================================================

/// A [`SaleRequest`] that passed every check not requiring storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSale {
    pub customer_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub discount: DiscountRate,
    pub lines: Vec<CartLine>,
    pub notes: String,
}

/// A [`StockAdjustmentRequest`] that passed every check not requiring storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAdjustment {
    pub product_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
}

/// Validates a sale request in a fixed order.
///
/// ## Order
/// ```text
/// 1. lines non-empty
/// 2. payment method ∈ {DIN, CAR, PIX, FIA}
/// 3. discount parses, 0 ≤ pct ≤ 50
/// 4. FIA requires a customer
/// 5. every quantity > 0
/// ```
/// The first failure wins, so resubmitting the same cart yields the same error.
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<ValidSale> {
    if request.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "itens".to_string(),
        });
    }

    let payment_method: PaymentMethod = request.payment_method.parse()?;
    let discount = DiscountRate::parse(&request.discount_percentage)?;

    if payment_method.is_deferred() && request.customer_id.is_none() {
        return Err(ValidationError::CreditRequiresCustomer);
    }

    for line in &request.lines {
        validate_quantity(line.quantity)?;
    }

    Ok(ValidSale {
        customer_id: request.customer_id,
        payment_method,
        discount,
        lines: request.lines.clone(),
        notes: request
            .notes
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Validates a manual stock adjustment request.
pub fn validate_adjustment(request: &StockAdjustmentRequest) -> ValidationResult<ValidAdjustment> {
    let kind: MovementKind = request.kind.parse()?;
    validate_quantity(request.quantity)?;
    let reason = validate_reason(request.reason.as_deref())?;

    Ok(ValidAdjustment {
        product_id: request.product_id,
        kind,
        quantity: request.quantity,
        reason,
    })
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a line or movement quantity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantidade".to_string(),
        });
    }

    Ok(())
}

/// Normalizes a movement reason: trimmed, blank becomes `None`.
pub fn validate_reason(reason: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "motivo".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(Some(reason.to_string()))
}

/// Validates the operator recorded on sales and stock movements.
pub fn validate_operator(operator: &str) -> ValidationResult<String> {
    let operator = operator.trim();

    if operator.is_empty() {
        return Err(ValidationError::Required {
            field: "operador".to_string(),
        });
    }

    if operator.chars().count() > 150 {
        return Err(ValidationError::TooLong {
            field: "operador".to_string(),
            max: 150,
        });
    }

    Ok(operator.to_string())
}

/// Validates a customer search term ("nome ou código do cartão").
///
/// ## Returns
/// The trimmed term.
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.is_empty() {
        return Err(ValidationError::Required {
            field: "termo".to_string(),
        });
    }

    if term.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "termo".to_string(),
            max: 100,
        });
    }

    Ok(term.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
