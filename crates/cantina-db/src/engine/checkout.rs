//! # Sale Finalization Engine
//!
//! Turns a cart into a persisted sale, its lines and the matching stock
//! debits, all in one unit of work.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     finalize_sale                                       │
//! │                                                                         │
//! │  1. validate_sale_request()      pure, before any transaction          │
//! │       │   empty cart / payment / discount / FIA customer / quantity    │
//! │       ▼                                                                 │
//! │  2. BEGIN + lock products        ascending id, first statement         │
//! │       ▼                                                                 │
//! │  3. customer exists & active     else NotFound                         │
//! │  4. products exist & active      else NotFound                         │
//! │  5. Σ quantity ≤ stock           tracked products only,                │
//! │       │                          else InsufficientStock                │
//! │       ▼                                                                 │
//! │  6. quote_cart()                 current prices, exact cents           │
//! │  7. INSERT sale, sale_lines                                            │
//! │  8. debit stock                  apply_locked_delta(Out)               │
//! │  9. COMMIT                                                             │
//! │                                                                         │
//! │  Any failure in 2-9 drops the unit of work: nothing is persisted.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use cantina_core::pricing::{quote_cart, LineInput};
use cantina_core::validation::{validate_operator, validate_sale_request};
use cantina_core::{
    CoreError, CoreResult, MovementKind, Product, Sale, SaleLine, SaleRequest, ValidationError,
};

use crate::engine::ledger::apply_locked_delta;
use crate::engine::log_failure;
use crate::pool::Database;
use crate::unit_of_work::NewSale;

/// A sale as committed, with its lines in cart order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedSale {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Finalizes a sale.
///
/// ## Errors
/// - `InvalidInput` for an empty cart, unknown payment method, discount
///   outside `[0, 50]`, credit without a customer, a non-positive quantity
///   or a cart whose total does not fit
/// - `NotFound` for a missing or inactive customer or product
/// - `InsufficientStock` when a tracked product has fewer units than the
///   cart asks for in total
/// - `Internal` for storage or lock-timeout faults
///
/// ## Example
/// ```rust,ignore
/// let request = SaleRequest {
///     customer_id: None,
///     payment_method: "DIN".to_string(),
///     discount_percentage: "10".to_string(),
///     lines: vec![CartLine { product_id: suco_id, quantity: 2 }],
///     notes: None,
/// };
/// let finalized = finalize_sale(&db, "caixa1", &request).await?;
/// assert_eq!(finalized.sale.total_cents, 900);
/// ```
pub async fn finalize_sale(
    db: &Database,
    operator: &str,
    request: &SaleRequest,
) -> CoreResult<FinalizedSale> {
    let result = finalize(db, operator, request).await;

    match &result {
        Ok(finalized) => info!(
            sale_id = finalized.sale.id,
            lines = finalized.lines.len(),
            total = %finalized.sale.total(),
            payment_method = %finalized.sale.payment_method,
            paid = finalized.sale.paid,
            "Sale finalized"
        ),
        Err(e) => log_failure("finalize_sale", e),
    }

    result
}

async fn finalize(db: &Database, operator: &str, request: &SaleRequest) -> CoreResult<FinalizedSale> {
    let operator = validate_operator(operator)?;
    let valid = validate_sale_request(request)?;

    let product_ids: Vec<i64> = valid.lines.iter().map(|l| l.product_id).collect();

    let mut uow = db.begin().await?;

    let products: HashMap<i64, Product> = uow
        .lock_products(&product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    if let Some(customer_id) = valid.customer_id {
        match uow.customer(customer_id).await? {
            Some(customer) if customer.active => {}
            _ => return Err(CoreError::not_found("Customer", customer_id)),
        }
    }

    for line in &valid.lines {
        sellable(&products, line.product_id)?;
    }

    // Repeated lines of one product draw from the same counter.
    let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
    for line in &valid.lines {
        let total = requested.entry(line.product_id).or_insert(0);
        *total = total
            .checked_add(line.quantity)
            .ok_or_else(|| ValidationError::TooLarge {
                field: "quantidade".to_string(),
            })?;
    }

    for (&product_id, &quantity) in &requested {
        let product = sellable(&products, product_id)?;
        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                product_id,
                product: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }
    }

    let inputs = valid
        .lines
        .iter()
        .map(|line| {
            Ok(LineInput {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: sellable(&products, line.product_id)?.price(),
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let quote = quote_cart(&inputs, valid.discount)?;

    let now = Utc::now();
    let paid = !valid.payment_method.is_deferred();
    let settled_at = paid.then_some(now);

    let sale_id = uow
        .insert_sale(&NewSale {
            customer_id: valid.customer_id,
            operator: &operator,
            created_at: now,
            subtotal_cents: quote.subtotal.cents(),
            discount_percentage: quote.discount_rate.percentage().to_string(),
            discount_cents: quote.discount.cents(),
            total_cents: quote.total.cents(),
            payment_method: valid.payment_method,
            paid,
            settled_at,
            notes: &valid.notes,
        })
        .await?;

    let mut lines = Vec::with_capacity(quote.lines.len());
    for priced in &quote.lines {
        let id = uow.insert_sale_line(sale_id, priced).await?;
        lines.push(SaleLine {
            id,
            sale_id,
            product_id: priced.product_id,
            quantity: priced.quantity,
            unit_price_cents: priced.unit_price.cents(),
            subtotal_cents: priced.subtotal.cents(),
        });
    }

    for (&product_id, &quantity) in &requested {
        let product = sellable(&products, product_id)?;
        if product.tracks_stock {
            apply_locked_delta(&mut uow, product, MovementKind::Out, quantity).await?;
        }
    }

    uow.commit().await?;

    Ok(FinalizedSale {
        sale: Sale {
            id: sale_id,
            customer_id: valid.customer_id,
            operator,
            created_at: now,
            subtotal_cents: quote.subtotal.cents(),
            discount_percentage: quote.discount_rate,
            discount_cents: quote.discount.cents(),
            total_cents: quote.total.cents(),
            payment_method: valid.payment_method,
            paid,
            settled_at,
            notes: valid.notes,
        },
        lines,
    })
}

/// Looks up a locked product that may be sold.
fn sellable(products: &HashMap<i64, Product>, id: i64) -> CoreResult<&Product> {
    products
        .get(&id)
        .filter(|p| p.active)
        .ok_or_else(|| CoreError::not_found("Product", id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use crate::repository::customer::NewCustomer;
    use crate::repository::product::NewProduct;
    use crate::test_support::{insert_customer, insert_product, sale_request};
    use cantina_core::{CartLine, ErrorKind, PaymentMethod};
    use std::time::Duration;

    async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn stock_of(db: &Database, id: i64) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    async fn assert_no_sales(db: &Database) {
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_suco_example() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        let finalized = finalize_sale(&db, "caixa1", &sale_request("DIN", "10", &[(suco, 2)]))
            .await
            .unwrap();

        let sale = &finalized.sale;
        assert_eq!(sale.subtotal_cents, 1000);
        assert_eq!(sale.discount_cents, 100);
        assert_eq!(sale.total_cents, 900);
        assert_eq!(sale.total(), sale.subtotal() - sale.discount());
        assert_eq!(stock_of(&db, suco).await, 8);

        assert_eq!(finalized.lines.len(), 1);
        assert_eq!(finalized.lines[0].unit_price_cents, 500);
        assert_eq!(finalized.lines[0].subtotal_cents, 1000);

        let stored = db.sales().get_by_id(sale.id).await.unwrap().unwrap();
        assert_eq!(&stored, sale);
        assert_eq!(db.sales().get_lines(sale.id).await.unwrap(), finalized.lines);
    }

    #[tokio::test]
    async fn test_paid_methods_settle_immediately() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        for method in ["DIN", "CAR", "PIX"] {
            let sale = finalize_sale(&db, "caixa1", &sale_request(method, "0", &[(suco, 1)]))
                .await
                .unwrap()
                .sale;
            assert!(sale.paid);
            assert_eq!(sale.settled_at, Some(sale.created_at));
        }
    }

    #[tokio::test]
    async fn test_credit_sale_is_unpaid() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;
        let maria = insert_customer(&db, NewCustomer::new("Maria")).await;

        let mut request = sale_request("FIA", "0", &[(suco, 1)]);
        request.customer_id = Some(maria);
        let sale = finalize_sale(&db, "caixa1", &request).await.unwrap().sale;

        assert_eq!(sale.payment_method, PaymentMethod::Credit);
        assert!(!sale.paid);
        assert!(sale.settled_at.is_none());
        assert_eq!(db.sales().list_unpaid_for_customer(maria).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_credit_without_customer_rejected() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        let err = finalize_sale(&db, "caixa1", &sale_request("FIA", "0", &[(suco, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_no_sales(&db).await;
    }

    #[tokio::test]
    async fn test_discount_above_limit_rejected() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        for pct in ["60", "50.5", "-1", "abc"] {
            let err = finalize_sale(&db, "caixa1", &sale_request("DIN", pct, &[(suco, 1)]))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "pct {pct}");
        }
        assert_no_sales(&db).await;
        assert_eq!(stock_of(&db, suco).await, 10);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;
        let pao = insert_product(&db, NewProduct::tracked("Pão", 300, 10)).await;

        let err = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[(suco, 2), (pao, 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_no_sales(&db).await;
        assert_eq!(stock_of(&db, suco).await, 10);
    }

    #[tokio::test]
    async fn test_empty_cart_and_unknown_payment() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        let err = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = finalize_sale(&db, "caixa1", &sale_request("CHQ", "0", &[(suco, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_no_sales(&db).await;
    }

    #[tokio::test]
    async fn test_missing_or_inactive_entities() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;
        let old = insert_product(&db, NewProduct::tracked("Bala", 50, 10).inactive()).await;
        let gone = insert_customer(&db, NewCustomer::new("Ex-aluno").inactive()).await;

        for lines in [vec![(suco, 1), (999, 1)], vec![(old, 1)]] {
            let err = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &lines))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        for customer in [gone, 12345] {
            let mut request = sale_request("DIN", "0", &[(suco, 1)]);
            request.customer_id = Some(customer);
            let err = finalize_sale(&db, "caixa1", &request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        assert_no_sales(&db).await;
        assert_eq!(stock_of(&db, suco).await, 10);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_whole_cart() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;
        let pao = insert_product(&db, NewProduct::tracked("Pão", 300, 1)).await;

        let err = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[(suco, 3), (pao, 2)]))
            .await
            .unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => {
                assert_eq!(product_id, pao);
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_no_sales(&db).await;
        assert_eq!(stock_of(&db, suco).await, 10);
        assert_eq!(stock_of(&db, pao).await, 1);
    }

    #[tokio::test]
    async fn test_repeated_lines_are_summed() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 3)).await;

        let err = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[(suco, 2), (suco, 2)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let finalized =
            finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[(suco, 2), (suco, 1)]))
                .await
                .unwrap();
        assert_eq!(finalized.lines.len(), 2);
        assert_eq!(finalized.sale.subtotal_cents, 1500);
        assert_eq!(stock_of(&db, suco).await, 0);
    }

    #[tokio::test]
    async fn test_untracked_products_are_not_counted() {
        let db = memory_db().await;
        let coxinha = insert_product(&db, NewProduct::untracked("Coxinha", 650)).await;

        let finalized = finalize_sale(&db, "caixa1", &sale_request("PIX", "0", &[(coxinha, 40)]))
            .await
            .unwrap();
        assert_eq!(finalized.sale.total_cents, 26000);
        assert_eq!(stock_of(&db, coxinha).await, 0);
    }

    #[tokio::test]
    async fn test_rejection_is_repeatable() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 1)).await;
        let request = sale_request("DIN", "0", &[(suco, 5)]);

        let first = finalize_sale(&db, "caixa1", &request).await.unwrap_err();
        let second = finalize_sale(&db, "caixa1", &request).await.unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first.kind(), ErrorKind::InsufficientStock);
    }

    #[tokio::test]
    async fn test_unit_price_is_a_snapshot() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        let finalized = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[(suco, 1)]))
            .await
            .unwrap();

        sqlx::query("UPDATE products SET price_cents = 700 WHERE id = ?1")
            .bind(suco)
            .execute(db.pool())
            .await
            .unwrap();

        let lines = db.sales().get_lines(finalized.sale.id).await.unwrap();
        assert_eq!(lines[0].unit_price_cents, 500);
    }

    #[tokio::test]
    async fn test_notes_are_stored() {
        let db = memory_db().await;
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        let mut request = sale_request("DIN", "0", &[(suco, 1)]);
        request.notes = Some("  sem gelo ".to_string());
        let sale = finalize_sale(&db, "caixa1", &request).await.unwrap().sale;

        assert_eq!(sale.notes, "sem gelo");
        assert_eq!(db.sales().get_by_id(sale.id).await.unwrap().unwrap().notes, "sem gelo");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("cantina.db"))
            .max_connections(4)
            .lock_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 1)).await;

        let request = SaleRequest {
            payment_method: "DIN".to_string(),
            discount_percentage: "0".to_string(),
            lines: vec![CartLine {
                product_id: suco,
                quantity: 1,
            }],
            ..SaleRequest::default()
        };

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let db = db.clone();
                let request = request.clone();
                tokio::spawn(async move {
                    finalize_sale(&db, &format!("caixa{i}"), &request).await
                })
            })
            .collect();

        let mut ok = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) if e.kind() == ErrorKind::InsufficientStock => insufficient += 1,
                Err(e) => panic!("unexpected failure: {e}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(stock_of(&db, suco).await, 0);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lock_timeout_is_internal() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("cantina.db"))
            .max_connections(2)
            .lock_timeout(Duration::from_millis(100));
        let db = Database::new(config).await.unwrap();
        let suco = insert_product(&db, NewProduct::tracked("Suco", 500, 5)).await;

        // Hold the write lock from another unit of work.
        let mut holder = db.begin().await.unwrap();
        holder.lock_product(suco).await.unwrap();

        let err = finalize_sale(&db, "caixa1", &sale_request("DIN", "0", &[(suco, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalFailure);

        holder.rollback().await;
        assert_eq!(stock_of(&db, suco).await, 5);
        assert_no_sales(&db).await;
    }
}
