use thiserror::Error;

use models::ProductId;

/// Failures talking to the remote catalog (stock and product endpoints).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),
    #[error("catalog has no {resource} for product {product_id}")]
    NotFound { resource: &'static str, product_id: ProductId },
    #[error("catalog returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Network(_) => true,
            CatalogError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Failures of the persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("malformed data under key {key}: {reason}")]
    Malformed { key: String, reason: String },
}

impl StorageError {
    pub fn malformed(key: &str, reason: impl ToString) -> Self {
        Self::Malformed { key: key.to_string(), reason: reason.to_string() }
    }
}
