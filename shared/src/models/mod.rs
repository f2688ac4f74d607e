//! Data models
//!
//! Shared between the storefront service and its API consumers.
//! Money is always integer minor units; timestamps are Unix millis.

pub mod order;
pub mod product;

// Re-exports
pub use order::*;
pub use product::*;
