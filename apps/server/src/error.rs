//! # API Error Type
//!
//! Maps engine failures onto HTTP responses.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError                  HTTP    Body                                │
//! │  ───────────────────────    ────    ─────────────────────────────────   │
//! │  InvalidInput               400     {success:false, error:<detail>}     │
//! │  InsufficientStock          400     {success:false, error:<detail>}     │
//! │  NotFound                   404     {success:false, error:<detail>}     │
//! │  Internal                   500     {success:false, error:<generic>}    │
//! │                                                                         │
//! │  Malformed JSON / form      400     {success:false, error:"Dados        │
//! │                                      inválidos"}                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal detail is logged by the engines; it never reaches the client.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use cantina_core::{CoreError, ErrorKind};

/// Message for request bodies that do not deserialize.
pub const MALFORMED_REQUEST: &str = "Dados inválidos";

/// Message for internal failures.
pub const INTERNAL_ERROR: &str = "Erro interno, tente novamente";

/// API error returned from handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    /// 400 with the fixed malformed-request message.
    pub fn malformed() -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, MALFORMED_REQUEST)
    }
}

/// Status code for a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::InsufficientStock => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Text shown to the operator for a failure.
pub fn user_message(err: &CoreError) -> String {
    match err {
        CoreError::InvalidInput(validation) => validation.to_string(),
        CoreError::Internal(_) => INTERNAL_ERROR.to_string(),
        other => other.to_string(),
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(status_for(err.kind()), user_message(&err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected JSON body");
        ApiError::malformed()
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected form body");
        ApiError::malformed()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantina_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        let invalid: ApiError = CoreError::from(ValidationError::CreditRequiresCustomer).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let stock: ApiError = CoreError::InsufficientStock {
            product_id: 1,
            product: "Suco".to_string(),
            available: 0,
            requested: 1,
        }
        .into();
        assert_eq!(stock.status, StatusCode::BAD_REQUEST);

        let missing: ApiError = CoreError::not_found("Product", 9).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Product not found: 9");
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err: ApiError = CoreError::Internal("database is locked".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, INTERNAL_ERROR);
    }
}
