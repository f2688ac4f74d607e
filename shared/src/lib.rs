//! Shared types for the storefront
//!
//! Domain models, the unified error system, and small utilities used by the
//! storefront service and its tests.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
