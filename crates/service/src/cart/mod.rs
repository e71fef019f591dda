//! Cart module: in-memory cart snapshot, persisted and stock-checked mutations.
//!
//! Collaborators are injected through [`CartDeps`]; nothing is looked up from
//! ambient state.

pub mod domain;
pub mod errors;
pub mod store;

pub use domain::UpdateProductAmount;
pub use errors::{CartError, CartErrorKind, CartOperation, STOCK_EXCEEDED_MESSAGE};
pub use store::{load, CartDeps, CartStore};
