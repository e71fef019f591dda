//! Service layer for the storefront cart.
//! - `cart`: the cart store and its typed errors.
//! - `catalog`: stock and product lookups against the remote API.
//! - `storage`: durable key-value backends for the serialized cart.
//! - `notify`: user-facing notices for failed operations.

pub mod errors;
pub mod cart;
pub mod catalog;
pub mod storage;
pub mod notify;
pub mod runtime;
