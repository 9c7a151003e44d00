//! # Error Types
//!
//! Domain-specific error types for cantina-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cantina-core errors (this file)                                       │
//! │  ├── CoreError        - The four failure kinds callers branch on        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cantina-db errors (separate crate)                                    │
//! │  └── DbError          - Storage faults, always wrapped as Internal     │
//! │                                                                         │
//! │  server errors (in app)                                                │
//! │  └── ApiError         - HTTP status + JSON envelope                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError                            │
//! │                              │                                          │
//! │                              └──► ApiError → client                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, ID, etc.)
//! 3. Every failure crossing the engine boundary is one of four kinds

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Failures surfaced by the sale finalization engine and the stock ledger.
///
/// ## Mapping to Responses
/// ```text
/// InvalidInput       → 400  (client error, never retried automatically)
/// NotFound           → 404  (entity missing or inactive)
/// InsufficientStock  → 400  (resubmit with a corrected cart)
/// Internal           → 500  (storage/lock fault, safe to retry)
/// ```
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-policy request data.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Referenced entity is missing or inactive.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested quantity exceeds the locked stock value.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: Suco x3
    ///      │
    ///      ▼
    /// Lock Suco row: stock=2
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Suco", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Whole cart rejected, nothing persisted
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        product: String,
        available: i64,
        requested: i64,
    },

    /// Unexpected persistence or lock fault. Detail is for logs only.
    #[error("Internal failure: {0}")]
    Internal(String),
}

/// Payload-free classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InsufficientStock,
    InternalFailure,
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns the failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::Internal(_) => ErrorKind::InternalFailure,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These run before any persistence, so a validation failure never leaves
/// side effects behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., not a decimal number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic on the value would overflow.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Deferred payment without an identified customer.
    #[error("Credit sales require an identified customer")]
    CreditRequiresCustomer,

    /// Settlement of a sale that is already paid.
    #[error("Sale {sale_id} is already settled")]
    AlreadySettled { sale_id: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
