//! Storefront error codes and the handler error type
//!
//! Codes are grouped by range: 0xxx request, 1xxx auth, 4xxx order,
//! 5xxx payment, 6xxx catalog and cart, 9xxx system.
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::ProductOutOfStock, "Only 3 left in size M")
//!     .with_detail("product_id", "p1");
//! assert_eq!(err.body().code, 6003);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, ErrorBody};
