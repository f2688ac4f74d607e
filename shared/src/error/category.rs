//! Error code ranges

use super::codes::ErrorCode;

/// Range an error code falls in, by its thousands digit.
/// Unassigned ranges count as `Request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 0xxx
    Request,
    /// 1xxx
    Auth,
    /// 4xxx
    Order,
    /// 5xxx
    Payment,
    /// 6xxx
    Catalog,
    /// 9xxx and above
    System,
}

impl ErrorCategory {
    pub const fn of(code: u16) -> Self {
        match code / 1000 {
            1 => Self::Auth,
            4 => Self::Order,
            5 => Self::Payment,
            6 => Self::Catalog,
            9.. => Self::System,
            _ => Self::Request,
        }
    }
}

impl ErrorCode {
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::of(self.code())
    }
}
