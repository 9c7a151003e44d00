//! Customer lookup for the point-of-sale screen.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use cantina_core::Customer;
use cantina_db::find_customers;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub termo: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub nome: String,
    pub codigo_cartao: Option<String>,
}

impl From<Customer> for CustomerSummary {
    fn from(customer: Customer) -> Self {
        CustomerSummary {
            id: customer.id,
            nome: customer.name,
            codigo_cartao: customer.card_code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub clientes: Vec<CustomerSummary>,
}

/// `POST /api/buscar-cliente`
pub async fn search(
    State(state): State<AppState>,
    form: Result<Form<SearchForm>, FormRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Form(form) = form?;

    let customers = find_customers(&state.db, &form.termo).await?;

    Ok(Json(SearchResponse {
        success: true,
        clientes: customers.into_iter().map(CustomerSummary::from).collect(),
    }))
}
