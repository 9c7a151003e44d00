//! # HTTP Handlers
//!
//! ```text
//! POST /api/finalizar-venda     sale::finalize        JSON in, JSON out
//! POST /vendas/:id/quitar       sale::settle          JSON out
//! POST /estoque                 stock::adjust         form in, 303 out
//! POST /api/buscar-cliente      customer::search      form in, JSON out
//! GET  /health                  health::check
//! ```
//!
//! Handlers only translate envelopes; every rule lives in cantina-db's
//! engines.

pub mod customer;
pub mod health;
pub mod sale;
pub mod stock;

use axum::http::HeaderMap;

use crate::state::AppState;

/// Header set by the upstream auth layer with the logged-in operator.
pub const OPERATOR_HEADER: &str = "x-operator";

/// Operator for this request: the header if present, else the default.
pub(crate) fn operator(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(&state.config.default_operator)
        .to_string()
}
