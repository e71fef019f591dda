use thiserror::Error;

use crate::product::ProductId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate line item for product {0}")]
    DuplicateItem(ProductId),
    #[error("line item for product {0} has a zero amount")]
    ZeroAmount(ProductId),
}
