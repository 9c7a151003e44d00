//! # Receivable Settlement
//!
//! Marks a credit ("fiado") sale as paid.

use chrono::{DateTime, Utc};
use tracing::info;

use cantina_core::{CoreError, CoreResult, Sale, ValidationError};

use crate::engine::log_failure;
use crate::pool::Database;

/// Settles an unpaid sale at `at`.
///
/// ## Errors
/// - `NotFound` if the sale does not exist
/// - `InvalidInput` (`AlreadySettled`) if it is already paid, which includes
///   every sale not made on credit
pub async fn settle_sale(db: &Database, sale_id: i64, at: DateTime<Utc>) -> CoreResult<Sale> {
    let result = settle(db, sale_id, at).await;

    match &result {
        Ok(sale) => info!(sale_id = sale.id, total = %sale.total(), "Sale settled"),
        Err(e) => log_failure("settle_sale", e),
    }

    result
}

async fn settle(db: &Database, sale_id: i64, at: DateTime<Utc>) -> CoreResult<Sale> {
    let sales = db.sales();
    let settled = sales.mark_settled(sale_id, at).await?;

    match sales.get_by_id(sale_id).await? {
        Some(sale) if settled => Ok(sale),
        Some(_) => Err(ValidationError::AlreadySettled { sale_id }.into()),
        None => Err(CoreError::not_found("Sale", sale_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkout::finalize_sale;
    use crate::pool::DbConfig;
    use crate::repository::customer::NewCustomer;
    use crate::repository::product::NewProduct;
    use crate::test_support::{insert_customer, insert_product, sale_request};
    use cantina_core::ErrorKind;

    async fn credit_sale(db: &Database) -> Sale {
        let suco = insert_product(db, NewProduct::tracked("Suco", 500, 10)).await;
        let maria = insert_customer(db, NewCustomer::new("Maria")).await;

        let mut request = sale_request("FIA", "0", &[(suco, 2)]);
        request.customer_id = Some(maria);
        finalize_sale(db, "caixa1", &request).await.unwrap().sale
    }

    #[tokio::test]
    async fn test_settle_credit_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = credit_sale(&db).await;

        let at = Utc::now();
        let settled = settle_sale(&db, sale.id, at).await.unwrap();
        assert!(settled.paid);
        assert_eq!(settled.settled_at, Some(at));
        assert_eq!(settled.total_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn test_settle_twice_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = credit_sale(&db).await;
        let first_at = Utc::now();

        settle_sale(&db, sale.id, first_at).await.unwrap();
        let err = settle_sale(&db, sale.id, Utc::now()).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::InvalidInput(ValidationError::AlreadySettled { .. })
        ));
        let stored = db.sales().get_by_id(sale.id).await.unwrap().unwrap();
        assert_eq!(stored.settled_at, Some(first_at));
    }

    #[tokio::test]
    async fn test_settle_missing_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = settle_sale(&db, 77, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
