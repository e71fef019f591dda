use serde::{Deserialize, Serialize};

use models::ProductId;

/// Input of `update_product_amount`. Non-positive amounts are ignored by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}
