//! # cantina-db: Database Layer for Cantina POS
//!
//! SQLite storage plus the transactional engines that mutate it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cantina POS Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /api/finalizar-venda)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    cantina-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    engine     │    │  UnitOfWork   │    │ Repositories │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ finalize_sale │───►│ lock_products │    │ ProductRepo  │  │   │
//! │  │   │ adjust_stock  │    │ insert_sale   │    │ CustomerRepo │  │   │
//! │  │   │ settle_sale   │    │ set_stock     │    │ SaleRepo     │  │   │
//! │  │   │ find_customers│    │ commit        │    │ MovementRepo │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                SQLite Database (WAL)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`unit_of_work`] - Scoped transaction with locking statements
//! - [`engine`] - Sale finalization, stock ledger, settlement, customer lookup
//! - [`repository`] - Pool-backed reads
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cantina_db::{engine, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cantina.db")).await?;
//! let finalized = engine::checkout::finalize_sale(&db, "caixa1", &request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

pub use engine::checkout::{finalize_sale, FinalizedSale};
pub use engine::customers::find_customers;
pub use engine::ledger::adjust_stock;
pub use engine::settlement::settle_sale;

pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::sale::SaleRepository;
pub use repository::stock_movement::StockMovementRepository;
