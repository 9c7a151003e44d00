//! # Product Repository
//!
//! Read-side and catalog operations for products.
//!
//! Stock is never written here: every stock change goes through a
//! [`UnitOfWork`](crate::unit_of_work::UnitOfWork) after the row is locked.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cantina_core::Product;

/// Column list matching [`Product`]'s `FromRow` derive.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, cost_cents, \
     stock, tracks_stock, active, created_at, updated_at";

/// Input for inserting a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub stock: i64,
    pub tracks_stock: bool,
    pub active: bool,
}

impl NewProduct {
    /// An active product whose stock is enforced.
    pub fn tracked(name: impl Into<String>, price_cents: i64, stock: i64) -> Self {
        NewProduct {
            name: name.into(),
            description: String::new(),
            price_cents,
            cost_cents: 0,
            stock,
            tracks_stock: true,
            active: true,
        }
    }

    /// An active product sold without a stock check (e.g. made to order).
    pub fn untracked(name: impl Into<String>, price_cents: i64) -> Self {
        NewProduct {
            tracks_stock: false,
            stock: 0,
            ..NewProduct::tracked(name, price_cents, 0)
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a product and returns the stored row.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(name = %product.name, "Inserting product");

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO products (
                name, description, price_cents, cost_cents,
                stock, tracks_stock, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price_cents)
            .bind(product.cost_cents)
            .bind(product.stock)
            .bind(product.tracks_stock)
            .bind(product.active)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(product)
    }

    /// Returns the total product count.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let suco = repo.insert(&NewProduct::tracked("Suco", 500, 10)).await.unwrap();
        assert!(suco.tracks_stock);
        assert_eq!(suco.stock, 10);

        let fetched = repo.get_by_id(suco.id).await.unwrap().unwrap();
        assert_eq!(fetched, suco);
        assert!(repo.get_by_id(suco.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&NewProduct::tracked("Suco", 500, 10)).await.unwrap();
        repo.insert(&NewProduct::untracked("Coxinha", 650)).await.unwrap();
        repo.insert(&NewProduct::tracked("Bala", 50, 100).inactive())
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Coxinha", "Suco"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
