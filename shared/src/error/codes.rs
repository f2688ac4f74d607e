//! Storefront error codes
//!
//! Serialized as bare numbers so the shop frontend and the admin panel can
//! switch on them without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ---- request ----
    /// Body or query could not be parsed
    InvalidRequest = 5,
    RequiredField = 7,

    // ---- auth ----
    NotAuthenticated = 1001,
    InvalidCredentials = 1002,

    // ---- order ----
    OrderNotFound = 4001,
    /// Status outside the allow-list of its axis
    OrderStatusInvalid = 4002,
    /// Status type is neither payment nor fulfillment
    OrderStatusTypeInvalid = 4003,
    TrackingNumberRequired = 4004,
    SessionIdRequired = 4005,

    // ---- payment ----
    /// Stripe rejected or failed a request
    PaymentProviderError = 5002,

    // ---- catalog / cart ----
    ProductNotFound = 6001,
    /// Missing or inactive at checkout
    ProductUnavailable = 6002,
    ProductOutOfStock = 6003,
    CartEmpty = 6101,
    CartTooLarge = 6102,
    InvalidQuantity = 6103,
    InvalidSize = 6104,
    MixedCurrency = 6105,

    // ---- system ----
    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 20] = [
        Self::InvalidRequest,
        Self::RequiredField,
        Self::NotAuthenticated,
        Self::InvalidCredentials,
        Self::OrderNotFound,
        Self::OrderStatusInvalid,
        Self::OrderStatusTypeInvalid,
        Self::TrackingNumberRequired,
        Self::SessionIdRequired,
        Self::PaymentProviderError,
        Self::ProductNotFound,
        Self::ProductUnavailable,
        Self::ProductOutOfStock,
        Self::CartEmpty,
        Self::CartTooLarge,
        Self::InvalidQuantity,
        Self::InvalidSize,
        Self::MixedCurrency,
        Self::InternalError,
        Self::DatabaseError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default customer-facing message
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "Invalid request",
            Self::RequiredField => "Required field is missing",
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid username or password",
            Self::OrderNotFound => "Order not found",
            Self::OrderStatusInvalid => "Invalid order status",
            Self::OrderStatusTypeInvalid => "Invalid status type",
            Self::TrackingNumberRequired => "Tracking number is required to mark as shipped",
            Self::SessionIdRequired => "Missing session_id",
            Self::PaymentProviderError => "Payment provider error, please try again",
            Self::ProductNotFound => "Product not found",
            Self::ProductUnavailable => "Product is not available",
            Self::ProductOutOfStock => "Not enough stock",
            Self::CartEmpty => "Cart is empty",
            Self::CartTooLarge => "Cart has too many lines",
            Self::InvalidQuantity => "Invalid quantity",
            Self::InvalidSize => "Invalid size",
            Self::MixedCurrency => "Cart mixes currencies",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

/// A number that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code {0}")]
pub struct InvalidErrorCode(pub u16);

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
