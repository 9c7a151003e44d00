//! # Sale Repository
//!
//! Read access to finalized sales and the settlement update.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. FINALIZE (engine::checkout, inside a unit of work)                 │
//! │     └── sale + lines inserted together, stock debited                  │
//! │         paid = true, settled_at = created_at   (DIN / CAR / PIX)       │
//! │         paid = false, settled_at = NULL        (FIA)                   │
//! │                                                                         │
//! │  2. SETTLE (FIA only)                                                  │
//! │     └── mark_settled() → paid = true, settled_at = now                 │
//! │                                                                         │
//! │  Nothing else about a sale ever changes.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cantina_core::{DiscountRate, PaymentMethod, Sale, SaleLine};

const SALE_COLUMNS: &str = "id, customer_id, operator, created_at, subtotal_cents, \
     discount_percentage, discount_cents, total_cents, payment_method, paid, settled_at, notes";

/// Raw sale row. The discount percentage is stored as decimal text and
/// re-validated on the way out.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    customer_id: Option<i64>,
    operator: String,
    created_at: DateTime<Utc>,
    subtotal_cents: i64,
    discount_percentage: String,
    discount_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    paid: bool,
    settled_at: Option<DateTime<Utc>>,
    notes: String,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let discount_percentage =
            DiscountRate::parse(&row.discount_percentage).map_err(|e| DbError::CorruptRow {
                table: "sales".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Sale {
            id: row.id,
            customer_id: row.customer_id,
            operator: row.operator,
            created_at: row.created_at,
            subtotal_cents: row.subtotal_cents,
            discount_percentage,
            discount_cents: row.discount_cents,
            total_cents: row.total_cents,
            payment_method: row.payment_method,
            paid: row.paid,
            settled_at: row.settled_at,
            notes: row.notes,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let row = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Sale::try_from).transpose()
    }

    /// Gets the lines of a sale in insertion order.
    pub async fn get_lines(&self, sale_id: i64) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists unpaid (FIA) sales of a customer, oldest first.
    pub async fn list_unpaid_for_customer(&self, customer_id: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE customer_id = ?1 AND paid = 0 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    /// Marks an unpaid sale as settled.
    ///
    /// ## Returns
    /// `true` if this call settled the sale, `false` if the sale is missing
    /// or was already paid. The `paid = 0` guard makes concurrent
    /// settlements of one sale succeed exactly once.
    pub async fn mark_settled(&self, id: i64, at: DateTime<Utc>) -> DbResult<bool> {
        debug!(sale_id = id, "Settling sale");

        let result =
            sqlx::query("UPDATE sales SET paid = 1, settled_at = ?2 WHERE id = ?1 AND paid = 0")
                .bind(id)
                .bind(at)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns the total sale count.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn insert_raw_sale(db: &Database, pct: &str, paid: bool) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO sales (operator, created_at, subtotal_cents, discount_percentage,
                               discount_cents, total_cents, payment_method, paid, notes)
            VALUES ('caixa', ?1, 1000, ?2, 100, 900, ?3, ?4, '')
            "#,
        )
        .bind(Utc::now())
        .bind(pct)
        .bind(if paid { PaymentMethod::Cash } else { PaymentMethod::Credit })
        .bind(paid)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_get_by_id_decodes_discount() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = insert_raw_sale(&db, "12.5", true).await;

        let sale = db.sales().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(sale.discount_percentage, DiscountRate::parse("12.5").unwrap());
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert!(db.sales().get_by_id(id + 1).await.unwrap().is_none());
        assert!(db.sales().get_lines(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_discount_is_reported() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = insert_raw_sale(&db, "75", true).await;

        let err = db.sales().get_by_id(id).await.unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { .. }));
    }

    #[tokio::test]
    async fn test_mark_settled_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = insert_raw_sale(&db, "0", false).await;

        let now = Utc::now();
        assert!(db.sales().mark_settled(id, now).await.unwrap());
        assert!(!db.sales().mark_settled(id, now).await.unwrap());

        let sale = db.sales().get_by_id(id).await.unwrap().unwrap();
        assert!(sale.paid);
        assert_eq!(sale.settled_at, Some(now));
    }
}
