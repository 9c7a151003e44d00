//! Stock adjustment form.
//!
//! The stock page posts a plain HTML form and expects to be sent back to
//! itself with a status banner, so every outcome is a `303 See Other`.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::Form;
use serde::Deserialize;
use tracing::debug;

use cantina_core::StockAdjustmentRequest;
use cantina_db::adjust_stock;

use crate::error::{user_message, MALFORMED_REQUEST};
use crate::handlers::operator;
use crate::state::AppState;

/// Page the form lives on.
pub const STOCK_PAGE: &str = "/estoque";

const ADJUSTED: &str = "Estoque atualizado";

#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub produto_id: i64,
    pub tipo: String,
    pub quantidade: i64,
    #[serde(default)]
    pub motivo: Option<String>,
}

impl From<StockForm> for StockAdjustmentRequest {
    fn from(form: StockForm) -> Self {
        StockAdjustmentRequest {
            product_id: form.produto_id,
            kind: form.tipo,
            quantity: form.quantidade,
            reason: form.motivo,
        }
    }
}

/// `POST /estoque`
pub async fn adjust(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<StockForm>, FormRejection>,
) -> Redirect {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Rejected stock form");
            return banner(false, MALFORMED_REQUEST);
        }
    };

    let operator = operator(&headers, &state);
    match adjust_stock(&state.db, &operator, &StockAdjustmentRequest::from(form)).await {
        Ok(_) => banner(true, ADJUSTED),
        Err(err) => banner(false, &user_message(&err)),
    }
}

fn banner(ok: bool, message: &str) -> Redirect {
    let status = if ok { "ok" } else { "erro" };
    Redirect::to(&format!(
        "{STOCK_PAGE}?status={status}&mensagem={}",
        urlencoding::encode(message)
    ))
}
