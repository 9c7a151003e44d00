//! # Customer Repository
//!
//! Customer lookups by id, card code or name.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cantina_core::Customer;

pub(crate) const CUSTOMER_COLUMNS: &str = "id, name, card_code, phone, active, created_at";

/// Input for inserting a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub card_code: Option<String>,
    pub phone: String,
    pub active: bool,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>) -> Self {
        NewCustomer {
            name: name.into(),
            card_code: None,
            phone: String::new(),
            active: true,
        }
    }

    pub fn card_code(mut self, code: impl Into<String>) -> Self {
        self.card_code = Some(code.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Searches active customers by card code or name.
    ///
    /// ## Matching
    /// ```text
    /// card_code = term   (ASCII case-insensitive)
    ///   OR
    /// name LIKE %term%   (ASCII case-insensitive, SQLite default)
    /// ```
    /// `%` and `_` in the term match literally.
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<Customer>> {
        debug!(term = %term, limit, "Searching customers");

        let pattern = format!("%{}%", escape_like(term));
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE active = 1
              AND (card_code = ?1 COLLATE NOCASE OR name LIKE ?2 ESCAPE '\')
            ORDER BY name, id
            LIMIT ?3
            "#
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(term)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Inserts a customer and returns the stored row.
    ///
    /// A duplicate card code surfaces as `DbError::UniqueViolation`.
    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %customer.name, "Inserting customer");

        let sql = format!(
            r#"
            INSERT INTO customers (name, card_code, phone, active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let stored = sqlx::query_as::<_, Customer>(&sql)
            .bind(&customer.name)
            .bind(&customer.card_code)
            .bind(&customer.phone)
            .bind(customer.active)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
