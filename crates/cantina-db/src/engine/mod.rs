//! # Engines
//!
//! Operations that cross the core boundary. Each one returns
//! [`CoreResult`](cantina_core::CoreResult), so callers only ever see the
//! four [`ErrorKind`]s.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout::finalize_sale ──┐                                            │
//! │                            ├──► ledger::apply_locked_delta             │
//! │  ledger::adjust_stock ─────┘       (locked check-and-update of stock)  │
//! │                                                                         │
//! │  settlement::settle_sale         conditional update, no lock needed    │
//! │  customers::find_customers       read only                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod checkout;
pub mod customers;
pub mod ledger;
pub mod settlement;

use cantina_core::{CoreError, ErrorKind};
use tracing::{error, warn};

/// Logs a failed operation at the level its kind deserves.
pub(crate) fn log_failure(operation: &'static str, err: &CoreError) {
    match err.kind() {
        ErrorKind::InternalFailure => error!(operation, error = %err, "Operation failed"),
        _ => warn!(operation, error = %err, "Operation rejected"),
    }
}
