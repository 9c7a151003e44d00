//! Fixtures shared by the crate's tests.

use cantina_core::{CartLine, SaleRequest};

use crate::pool::Database;
use crate::repository::customer::NewCustomer;
use crate::repository::product::NewProduct;

pub(crate) async fn insert_product(db: &Database, product: NewProduct) -> i64 {
    db.products().insert(&product).await.unwrap().id
}

pub(crate) async fn insert_customer(db: &Database, customer: NewCustomer) -> i64 {
    db.customers().insert(&customer).await.unwrap().id
}

/// A walk-in sale request for `(product_id, quantity)` lines.
pub(crate) fn sale_request(method: &str, discount: &str, lines: &[(i64, i64)]) -> SaleRequest {
    SaleRequest {
        customer_id: None,
        payment_method: method.to_string(),
        discount_percentage: discount.to_string(),
        lines: lines
            .iter()
            .map(|&(product_id, quantity)| CartLine {
                product_id,
                quantity,
            })
            .collect(),
        notes: None,
    }
}
