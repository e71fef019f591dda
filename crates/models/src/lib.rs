//! Cart domain models shared by the service and server crates.
//! - `product`: remote catalog records (`Product`, `Stock`).
//! - `cart`: ordered, uniqueness-checked line items.

pub mod cart;
pub mod errors;
pub mod product;

pub use cart::{Cart, LineItem};
pub use product::{Product, ProductId, Stock};
