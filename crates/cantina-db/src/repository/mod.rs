//! # Repository Module
//!
//! Pool-backed database access for Cantina POS.
//!
//! ## Repositories vs. Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Handler / engine                                                      │
//! │       │                                                                 │
//! │       ├── db.products().get_by_id(id)      ← single statement, pool    │
//! │       ├── db.customers().search(term, 10)                              │
//! │       ├── db.sales().get_lines(sale_id)                                │
//! │       │                                                                 │
//! │       └── db.begin() → UnitOfWork           ← locked read-modify-write │
//! │              lock_products / insert_sale / set_stock / commit          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product catalog reads and inserts
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer lookup
//! - [`SaleRepository`](sale::SaleRepository) - Sale reads and settlement
//! - [`StockMovementRepository`](stock_movement::StockMovementRepository) - Ledger history

pub mod customer;
pub mod product;
pub mod sale;
pub mod stock_movement;
