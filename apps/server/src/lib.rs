//! # Cantina Server
//!
//! HTTP surface of the canteen point of sale.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  browser / POS front end                                                │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  TraceLayer ──► handler ──► cantina-db engine ──► UnitOfWork ──► SQLite │
//! │        ▲            │                                                   │
//! │        └────────────┘  ApiError / Redirect                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/finalizar-venda", post(handlers::sale::finalize))
        .route("/vendas/:id/quitar", post(handlers::sale::settle))
        .route(handlers::stock::STOCK_PAGE, post(handlers::stock::adjust))
        .route("/api/buscar-cliente", post(handlers::customer::search))
        .route("/health", get(handlers::health::check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
