//! # cantina-core: Pure Business Logic for Cantina POS
//!
//! This crate holds everything about a sale that can be decided without
//! touching storage: money arithmetic, discount bounds, request validation
//! and cart pricing.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cantina POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/server (HTTP handlers)                     │   │
//! │  │       finalizar-venda, estoque, buscar-cliente, quitar          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         cantina-db (unit of work, engines, repositories)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cantina-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CartQuote │  │  request  │  │   │
//! │  │   │   Sale    │  │ discount  │  │           │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, StockMovement, ...)
//! - [`money`] - Money type with integer centavos
//! - [`pricing`] - Cart subtotal/discount/total
//! - [`validation`] - Request validation
//! - [`error`] - Domain error types

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use pricing::{quote_cart, CartQuote, LineInput, PricedLine};
pub use types::*;
