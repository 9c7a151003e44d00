//! # Sale Handlers
//!
//! ## Request
//! ```json
//! {
//!   "cliente_id": 7,
//!   "forma_pagamento": "DIN",
//!   "desconto_percentual": "10",
//!   "itens": [{ "id": 1, "quantity": 2 }],
//!   "observacao": "sem gelo"
//! }
//! ```
//!
//! ## Response
//! ```json
//! { "success": true, "venda_id": 42, "subtotal": "10.00",
//!   "desconto_percentual": "10", "desconto_valor": "1.00", "total": "9.00" }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cantina_core::{CartLine, SaleRequest};
use cantina_db::{finalize_sale, settle_sale};

use crate::error::ApiError;
use crate::handlers::operator;
use crate::state::AppState;

// =============================================================================
// Envelopes
// =============================================================================

/// Body of `POST /api/finalizar-venda`.
#[derive(Debug, Deserialize)]
pub struct FinalizeSaleBody {
    #[serde(default, alias = "cliente_id")]
    pub customer_id: Option<i64>,

    #[serde(default)]
    pub forma_pagamento: String,

    #[serde(default)]
    pub desconto_percentual: DiscountField,

    #[serde(default)]
    pub itens: Vec<CartItem>,

    #[serde(default)]
    pub observacao: Option<String>,
}

/// The discount arrives as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DiscountField {
    Number(serde_json::Number),
    Text(String),
}

impl Default for DiscountField {
    fn default() -> Self {
        DiscountField::Text("0".to_string())
    }
}

impl DiscountField {
    fn into_text(self) -> String {
        match self {
            DiscountField::Number(n) => n.to_string(),
            DiscountField::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartItem {
    pub id: i64,
    #[serde(alias = "quantidade")]
    pub quantity: i64,
}

impl From<FinalizeSaleBody> for SaleRequest {
    fn from(body: FinalizeSaleBody) -> Self {
        SaleRequest {
            customer_id: body.customer_id,
            payment_method: body.forma_pagamento,
            discount_percentage: body.desconto_percentual.into_text(),
            lines: body
                .itens
                .into_iter()
                .map(|item| CartLine {
                    product_id: item.id,
                    quantity: item.quantity,
                })
                .collect(),
            notes: body.observacao,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinalizeSaleResponse {
    pub success: bool,
    pub venda_id: i64,
    pub subtotal: Decimal,
    pub desconto_percentual: Decimal,
    pub desconto_valor: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SettleSaleResponse {
    pub success: bool,
    pub venda_id: i64,
    pub quitada_em: Option<DateTime<Utc>>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/finalizar-venda`
pub async fn finalize(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FinalizeSaleBody>, JsonRejection>,
) -> Result<Json<FinalizeSaleResponse>, ApiError> {
    let Json(body) = payload?;
    let operator = operator(&headers, &state);

    let finalized = finalize_sale(&state.db, &operator, &SaleRequest::from(body)).await?;
    let sale = finalized.sale;

    Ok(Json(FinalizeSaleResponse {
        success: true,
        venda_id: sale.id,
        subtotal: sale.subtotal().to_decimal(),
        desconto_percentual: sale.discount_percentage.percentage(),
        desconto_valor: sale.discount().to_decimal(),
        total: sale.total().to_decimal(),
    }))
}

/// `POST /vendas/:id/quitar`
pub async fn settle(
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
) -> Result<Json<SettleSaleResponse>, ApiError> {
    let sale = settle_sale(&state.db, sale_id, Utc::now()).await?;

    Ok(Json(SettleSaleResponse {
        success: true,
        venda_id: sale.id,
        quitada_em: sale.settled_at,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_body, post_json, post_empty, test_app};
    use axum::http::StatusCode;
    use cantina_db::{NewCustomer, NewProduct};
    use serde_json::json;

    #[tokio::test]
    async fn test_finalize_suco_example() {
        let (app, db) = test_app().await;
        let suco = db
            .products()
            .insert(&NewProduct::tracked("Suco", 500, 10))
            .await
            .unwrap();

        let response = post_json(
            &app,
            "/api/finalizar-venda",
            json!({
                "forma_pagamento": "DIN",
                "desconto_percentual": 10,
                "itens": [{ "id": suco.id, "quantity": 2 }]
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["subtotal"], "10.00");
        assert_eq!(body["desconto_percentual"], "10");
        assert_eq!(body["desconto_valor"], "1.00");
        assert_eq!(body["total"], "9.00");

        let sale_id = body["venda_id"].as_i64().unwrap();
        let sale = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.operator, "caixa");
        let stock = db.products().get_by_id(suco.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 8);
    }

    #[tokio::test]
    async fn test_discount_above_limit_is_client_error() {
        let (app, db) = test_app().await;
        let suco = db
            .products()
            .insert(&NewProduct::tracked("Suco", 500, 10))
            .await
            .unwrap();

        let response = post_json(
            &app,
            "/api/finalizar-venda",
            json!({
                "forma_pagamento": "DIN",
                "desconto_percentual": "60",
                "itens": [{ "id": suco.id, "quantity": 1 }]
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("desconto_percentual"));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (app, _db) = test_app().await;

        let response = post_json(
            &app,
            "/api/finalizar-venda",
            json!({ "forma_pagamento": "DIN", "itens": "nope" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body, json!({ "success": false, "error": "Dados inválidos" }));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (app, _db) = test_app().await;

        let response = post_json(
            &app,
            "/api/finalizar-venda",
            json!({ "forma_pagamento": "PIX", "itens": [{ "id": 404, "quantity": 1 }] }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_client_error() {
        let (app, db) = test_app().await;
        let suco = db
            .products()
            .insert(&NewProduct::tracked("Suco", 500, 1))
            .await
            .unwrap();

        let response = post_json(
            &app,
            "/api/finalizar-venda",
            json!({ "forma_pagamento": "DIN", "itens": [{ "id": suco.id, "quantity": 2 }] }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Insufficient stock"));
    }

    #[tokio::test]
    async fn test_credit_sale_then_settle() {
        let (app, db) = test_app().await;
        let suco = db
            .products()
            .insert(&NewProduct::tracked("Suco", 500, 10))
            .await
            .unwrap();
        let maria = db
            .customers()
            .insert(&NewCustomer::new("Maria"))
            .await
            .unwrap();

        let response = post_json(
            &app,
            "/api/finalizar-venda",
            json!({
                "cliente_id": maria.id,
                "forma_pagamento": "FIA",
                "itens": [{ "id": suco.id, "quantity": 1 }]
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let sale_id = json_body(response).await["venda_id"].as_i64().unwrap();
        assert!(!db.sales().get_by_id(sale_id).await.unwrap().unwrap().paid);

        let response = post_empty(&app, &format!("/vendas/{sale_id}/quitar")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert!(body["quitada_em"].is_string());

        let response = post_empty(&app, &format!("/vendas/{sale_id}/quitar")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_empty(&app, "/vendas/9999/quitar").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_discount_field_forms() {
        let body: FinalizeSaleBody =
            serde_json::from_value(json!({ "desconto_percentual": 12.5 })).unwrap();
        assert_eq!(body.desconto_percentual.into_text(), "12.5");

        let body: FinalizeSaleBody = serde_json::from_value(json!({})).unwrap();
        let request = SaleRequest::from(body);
        assert_eq!(request.discount_percentage, "0");
        assert!(request.lines.is_empty());
    }
}
