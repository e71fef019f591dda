use thiserror::Error;

use models::errors::ModelError;
use models::ProductId;

use crate::errors::{CatalogError, StorageError};

/// Message shown verbatim whenever a request exceeds available stock.
pub const STOCK_EXCEEDED_MESSAGE: &str = "requested quantity out of stock";

/// Public cart operations, used to pick the fallback notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    AddProduct,
    RemoveProduct,
    UpdateProductAmount,
}

impl CartOperation {
    pub fn failure_message(&self) -> &'static str {
        match self {
            CartOperation::AddProduct => "failed to add product",
            CartOperation::RemoveProduct => "failed to remove product",
            CartOperation::UpdateProductAmount => "failed to change product quantity",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CartOperation::AddProduct => "add_product",
            CartOperation::RemoveProduct => "remove_product",
            CartOperation::UpdateProductAmount => "update_product_amount",
        }
    }
}

/// What the user gets told: the stock message, or the operation's fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartErrorKind {
    StockExceeded,
    Generic,
}

/// Business errors for cart mutations
#[derive(Debug, Error)]
pub enum CartError {
    #[error("requested quantity out of stock")]
    StockExceeded { product_id: ProductId, requested: u32, available: u32 },
    #[error("product {product_id} is not in the cart")]
    NotFound { product_id: ProductId },
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid cart state: {0}")]
    Model(#[from] ModelError),
}

impl CartError {
    pub fn kind(&self) -> CartErrorKind {
        match self {
            CartError::StockExceeded { .. } => CartErrorKind::StockExceeded,
            _ => CartErrorKind::Generic,
        }
    }

    /// Notice text for a failure of `op`.
    pub fn user_message(&self, op: CartOperation) -> &'static str {
        match self.kind() {
            CartErrorKind::StockExceeded => STOCK_EXCEEDED_MESSAGE,
            CartErrorKind::Generic => op.failure_message(),
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            CartError::StockExceeded { .. } => 2001,
            CartError::NotFound { .. } => 2002,
            CartError::Catalog(_) => 2101,
            CartError::Storage(_) => 2102,
            CartError::Model(_) => 2200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_exceeded_message_is_verbatim_for_every_operation() {
        let err = CartError::StockExceeded { product_id: 1, requested: 3, available: 2 };
        assert_eq!(err.to_string(), STOCK_EXCEEDED_MESSAGE);
        for op in [CartOperation::AddProduct, CartOperation::UpdateProductAmount] {
            assert_eq!(err.user_message(op), STOCK_EXCEEDED_MESSAGE);
        }
    }

    #[test]
    fn other_errors_fall_back_per_operation() {
        let network = CartError::Catalog(CatalogError::Network("out of stock proxy timeout".into()));
        assert_eq!(network.kind(), CartErrorKind::Generic);
        assert_eq!(network.user_message(CartOperation::AddProduct), "failed to add product");

        let missing = CartError::NotFound { product_id: 4 };
        assert_eq!(missing.user_message(CartOperation::RemoveProduct), "failed to remove product");
        assert_eq!(missing.user_message(CartOperation::UpdateProductAmount), "failed to change product quantity");
    }
}
