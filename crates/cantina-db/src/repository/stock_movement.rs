//! # Stock Movement Repository
//!
//! Read access to the append-only stock ledger. Entries are written only by
//! [`adjust_stock`](crate::engine::ledger::adjust_stock).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cantina_core::StockMovement;

pub(crate) const MOVEMENT_COLUMNS: &str =
    "id, product_id, kind, quantity, reason, operator, created_at";

/// Repository for stock movement queries.
#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
}

impl StockMovementRepository {
    /// Creates a new StockMovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockMovementRepository { pool }
    }

    /// Lists a product's movements, newest first.
    pub async fn list_for_product(&self, product_id: i64, limit: u32) -> DbResult<Vec<StockMovement>> {
        debug!(product_id, limit, "Listing stock movements");

        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Counts a product's movements.
    pub async fn count_for_product(&self, product_id: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
