//! Shared building blocks for the cart workspace: logging setup and small
//! HTTP payload types.

pub mod types;
pub mod utils;
