//! # Customer Lookup
//!
//! Finds the customer a sale should be charged to, by card code or name.

use tracing::debug;

use cantina_core::validation::{validate_search_term, CUSTOMER_SEARCH_LIMIT};
use cantina_core::{CoreError, CoreResult, Customer};

use crate::engine::log_failure;
use crate::pool::Database;

/// Finds up to ten active customers matching `term`.
///
/// ## Errors
/// - `InvalidInput` for a blank or overlong term
/// - `NotFound` when nothing matches
pub async fn find_customers(db: &Database, term: &str) -> CoreResult<Vec<Customer>> {
    let result = search(db, term).await;

    match &result {
        Ok(found) => debug!(count = found.len(), "Customer lookup"),
        Err(e) => log_failure("find_customers", e),
    }

    result
}

async fn search(db: &Database, term: &str) -> CoreResult<Vec<Customer>> {
    let term = validate_search_term(term)?;

    let found = db.customers().search(&term, CUSTOMER_SEARCH_LIMIT).await?;
    if found.is_empty() {
        return Err(CoreError::not_found("Customer", term));
    }

    Ok(found)
}
