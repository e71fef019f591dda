//! Cart line items and the ordered cart itself.
//!
//! A [`Cart`] keeps insertion order (order of first add) and holds at most one
//! [`LineItem`] per product. Mutators return a new cart so callers can publish
//! a whole snapshot after persisting it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::product::{Product, ProductId};

/// One product plus the requested quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(alias = "imageUrl")]
    pub image: String,
    pub amount: u32,
}

impl LineItem {
    /// New line item for a product with an amount of one.
    pub fn from_product(product: Product) -> Self {
        Self { id: product.id, title: product.title, price: product.price, image: product.image, amount: 1 }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.amount)
    }
}

/// Ordered collection of line items, serialized as a bare JSON array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from untrusted items, rejecting duplicates and zero amounts.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.amount == 0 {
                return Err(ModelError::ZeroAmount(item.id));
            }
            if !seen.insert(item.id) {
                return Err(ModelError::DuplicateItem(item.id));
            }
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all requested amounts.
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of price * amount over all items.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Copy of this cart with `item` appended.
    pub fn with_item(&self, item: LineItem) -> Result<Self, ModelError> {
        if item.amount == 0 {
            return Err(ModelError::ZeroAmount(item.id));
        }
        if self.contains(item.id) {
            return Err(ModelError::DuplicateItem(item.id));
        }
        let mut items = self.items.clone();
        items.push(item);
        Ok(Self { items })
    }

    /// Copy of this cart with the amount of `id` replaced. Returns `None` when
    /// the product is not in the cart.
    pub fn with_amount(&self, id: ProductId, amount: u32) -> Result<Option<Self>, ModelError> {
        if amount == 0 {
            return Err(ModelError::ZeroAmount(id));
        }
        if !self.contains(id) {
            return Ok(None);
        }
        let items = self
            .items
            .iter()
            .map(|item| if item.id == id { LineItem { amount, ..item.clone() } } else { item.clone() })
            .collect();
        Ok(Some(Self { items }))
    }

    /// Copy of this cart without `id`, or `None` when it is absent.
    pub fn without(&self, id: ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let items = self.items.iter().filter(|item| item.id != id).cloned().collect();
        Some(Self { items })
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = ModelError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
