//! # Stock Adjustment Ledger
//!
//! Manual stock corrections (restock / loss) and the locked stock routine
//! shared with sale finalization.
//!
//! ## User Workflow
//! ```text
//! Operator: "3 sucos vencidos"   tipo=PER quantidade=3 motivo="vencido"
//!      │
//!      ▼
//! validate_adjustment()           kind, quantity > 0, reason ≤ 255
//!      │
//!      ▼
//! lock product row                missing → NotFound
//!      │
//!      ▼
//! apply_locked_delta()            PER 3 with stock 2 → InsufficientStock
//!      │
//!      ▼
//! insert stock_movements row      same unit of work
//!      │
//!      ▼
//! COMMIT                          stock and ledger entry land together
//! ```

use tracing::info;

use cantina_core::validation::{validate_adjustment, validate_operator};
use cantina_core::{
    CoreError, CoreResult, MovementKind, Product, StockAdjustmentRequest, StockMovement,
    ValidationError,
};

use crate::engine::log_failure;
use crate::pool::Database;
use crate::unit_of_work::UnitOfWork;

/// Applies a stock change to a product already locked by `uow`.
///
/// `Out` never takes the counter below zero; `In` never overflows it.
/// Returns the new stock value.
pub(crate) async fn apply_locked_delta(
    uow: &mut UnitOfWork<'_>,
    product: &Product,
    kind: MovementKind,
    quantity: i64,
) -> CoreResult<i64> {
    let new_stock = match kind {
        MovementKind::Out => {
            if quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    product: product.name.clone(),
                    available: product.stock,
                    requested: quantity,
                });
            }
            product.stock - quantity
        }
        MovementKind::In => {
            product
                .stock
                .checked_add(quantity)
                .ok_or_else(|| ValidationError::TooLarge {
                    field: "quantidade".to_string(),
                })?
        }
    };

    uow.set_stock(product.id, new_stock).await?;
    Ok(new_stock)
}

/// Records a manual stock movement and applies it to the product.
///
/// The check against current stock applies whether or not the product
/// tracks stock, so manual corrections never drive a counter negative.
///
/// ## Errors
/// - `InvalidInput` for an unknown kind, non-positive quantity, long reason
///   or restock overflow
/// - `NotFound` if the product does not exist
/// - `InsufficientStock` for a loss larger than the current stock
/// - `Internal` for storage or lock-timeout faults
pub async fn adjust_stock(
    db: &Database,
    operator: &str,
    request: &StockAdjustmentRequest,
) -> CoreResult<StockMovement> {
    let result = record_adjustment(db, operator, request).await;

    match &result {
        Ok(movement) => info!(
            movement_id = movement.id,
            product_id = movement.product_id,
            kind = %movement.kind,
            quantity = movement.quantity,
            operator = %movement.operator,
            "Stock adjusted"
        ),
        Err(e) => log_failure("adjust_stock", e),
    }

    result
}

async fn record_adjustment(
    db: &Database,
    operator: &str,
    request: &StockAdjustmentRequest,
) -> CoreResult<StockMovement> {
    let operator = validate_operator(operator)?;
    let valid = validate_adjustment(request)?;

    let mut uow = db.begin().await?;

    let product = uow
        .lock_product(valid.product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", valid.product_id))?;

    apply_locked_delta(&mut uow, &product, valid.kind, valid.quantity).await?;

    let movement = uow
        .insert_movement(
            product.id,
            valid.kind,
            valid.quantity,
            valid.reason.as_deref(),
            &operator,
        )
        .await?;

    uow.commit().await?;

    Ok(movement)
}

// =============================================================================
// Unit Tests
// =============================================================================
