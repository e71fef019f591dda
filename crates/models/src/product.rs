use serde::{Deserialize, Serialize};

/// Catalog identifier of a product.
pub type ProductId = u64;

/// Product metadata as served by `GET products/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(alias = "imageUrl")]
    pub image: String,
}

/// Available quantity as served by `GET stock/{id}`.
///
/// Fetched for every mutation and never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(default)]
    pub id: ProductId,
    pub amount: u32,
}
