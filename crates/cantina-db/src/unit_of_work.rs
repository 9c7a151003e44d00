//! # Scoped Unit of Work
//!
//! One SQLite transaction with every statement a mutating engine needs.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Unit of Work                                      │
//! │                                                                         │
//! │  db.begin()                     BEGIN (deferred)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock_products([3, 1, 3])       UPDATE products SET stock = stock      │
//! │       │                         WHERE id = 1 RETURNING ...   ◄── takes │
//! │       │                         WHERE id = 3 RETURNING ...   the write │
//! │       │                                                        lock    │
//! │       ▼                                                                 │
//! │  reads / inserts / set_stock    all see the locked values              │
//! │       │                                                                 │
//! │       ├── commit()  ──► COMMIT                                         │
//! │       │                                                                 │
//! │       └── error `?` / panic / future dropped                           │
//! │                 ──► Transaction dropped ──► ROLLBACK                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why the lock comes first
//! A deferred SQLite transaction that *reads* before it writes pins a
//! snapshot; if another writer commits in between, the later write fails
//! immediately with `SQLITE_BUSY_SNAPSHOT` instead of waiting. Making the
//! lock-claiming `UPDATE` the first statement means the wait happens inside
//! `busy_timeout`, and the rows returned are the latest committed values.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use cantina_core::pricing::PricedLine;
use cantina_core::{Customer, MovementKind, PaymentMethod, Product, StockMovement};

use crate::error::{DbError, DbResult};
use crate::repository::customer::CUSTOMER_COLUMNS;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::stock_movement::MOVEMENT_COLUMNS;

/// Column values of a sale row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewSale<'a> {
    pub customer_id: Option<i64>,
    pub operator: &'a str,
    pub created_at: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub discount_percentage: String,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub paid: bool,
    pub settled_at: Option<DateTime<Utc>>,
    pub notes: &'a str,
}

/// A scoped transaction. Rolls back on drop unless [`commit`](Self::commit)
/// was called.
#[derive(Debug)]
pub struct UnitOfWork<'c> {
    tx: Transaction<'c, Sqlite>,
}

impl UnitOfWork<'static> {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::Internal(msg) => DbError::TransactionFailed(msg),
                other => other,
            })?;
        debug!("Unit of work started");
        Ok(UnitOfWork { tx })
    }
}

impl<'c> UnitOfWork<'c> {
    // =========================================================================
    // Locking
    // =========================================================================

    /// Locks the given products in ascending id order and returns the ones
    /// that exist, in that order. Duplicate ids are locked once.
    ///
    /// Must be the first statement of the unit of work (see module docs).
    pub async fn lock_products(&mut self, ids: &[i64]) -> DbResult<Vec<Product>> {
        let ordered: BTreeSet<i64> = ids.iter().copied().collect();
        let mut locked = Vec::with_capacity(ordered.len());

        for id in ordered {
            if let Some(product) = self.lock_product(id).await? {
                locked.push(product);
            }
        }

        Ok(locked)
    }

    /// Locks one product row, returning its current values.
    pub async fn lock_product(&mut self, id: i64) -> DbResult<Option<Product>> {
        debug!(product_id = id, "Locking product");

        let sql = format!(
            "UPDATE products SET stock = stock WHERE id = ?1 RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(product)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads a customer inside the transaction.
    pub async fn customer(&mut self, id: i64) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(customer)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Overwrites a locked product's stock counter.
    pub async fn set_stock(&mut self, product_id: i64, stock: i64) -> DbResult<()> {
        debug!(product_id, stock, "Setting stock");

        let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(product_id)
            .bind(stock)
            .bind(Utc::now())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Inserts a sale row and returns its id.
    pub async fn insert_sale(&mut self, sale: &NewSale<'_>) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                customer_id, operator, created_at,
                subtotal_cents, discount_percentage, discount_cents, total_cents,
                payment_method, paid, settled_at, notes
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11
            )
            "#,
        )
        .bind(sale.customer_id)
        .bind(sale.operator)
        .bind(sale.created_at)
        .bind(sale.subtotal_cents)
        .bind(&sale.discount_percentage)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.paid)
        .bind(sale.settled_at)
        .bind(sale.notes)
        .execute(&mut *self.tx)
        .await?;

        let id = result.last_insert_rowid();
        debug!(sale_id = id, "Inserted sale");
        Ok(id)
    }

    /// Inserts one sale line and returns its id.
    pub async fn insert_sale_line(&mut self, sale_id: i64, line: &PricedLine) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sale_lines (sale_id, product_id, quantity, unit_price_cents, subtotal_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(sale_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.subtotal.cents())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Appends a stock movement and returns the stored row.
    pub async fn insert_movement(
        &mut self,
        product_id: i64,
        kind: MovementKind,
        quantity: i64,
        reason: Option<&str>,
        operator: &str,
    ) -> DbResult<StockMovement> {
        let sql = format!(
            r#"
            INSERT INTO stock_movements (product_id, kind, quantity, reason, operator, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        );
        let movement = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(product_id)
            .bind(kind)
            .bind(quantity)
            .bind(reason)
            .bind(operator)
            .bind(Utc::now())
            .fetch_one(&mut *self.tx)
            .await?;

        debug!(movement_id = movement.id, product_id, "Inserted stock movement");
        Ok(movement)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Commits every staged change.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::LockTimeout => DbError::LockTimeout,
                other => DbError::TransactionFailed(other.to_string()),
            })?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Rolls back explicitly. A failed rollback is logged only; the
    /// connection discards the transaction when it returns to the pool.
    pub async fn rollback(self) {
        if let Err(e) = self.tx.rollback().await {
            warn!(error = %e, "Rollback failed");
        } else {
            debug!("Unit of work rolled back");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use crate::test_support::insert_product;

    #[tokio::test]
    async fn test_lock_products_orders_and_dedups() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;
        let b = insert_product(&db, NewProduct::tracked("Pão", 300, 5)).await;

        let mut uow = db.begin().await.unwrap();
        let locked = uow.lock_products(&[b, a, b, 999]).await.unwrap();
        let ids: Vec<i64> = locked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);
        uow.rollback().await;
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        {
            let mut uow = db.begin().await.unwrap();
            uow.lock_product(id).await.unwrap();
            uow.set_stock(id, 3).await.unwrap();
            // dropped without commit
        }

        let product = db.products().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(product.stock, 10);
    }

    #[tokio::test]
    async fn test_commit_persists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = insert_product(&db, NewProduct::tracked("Suco", 500, 10)).await;

        let mut uow = db.begin().await.unwrap();
        uow.lock_product(id).await.unwrap();
        uow.set_stock(id, 7).await.unwrap();
        uow.insert_movement(id, MovementKind::Out, 3, Some("quebra"), "caixa")
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let product = db.products().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(product.stock, 7);
        let movements = db.stock_movements().list_for_product(id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].reason.as_deref(), Some("quebra"));
    }
}
