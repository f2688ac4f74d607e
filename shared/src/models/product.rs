//! Product Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Apparel size. The set is closed: anything else is rejected, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Size {
    S,
    M,
    L,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::S, Size::M, Size::L];

    /// Parse an exact size label (`"S"`, `"M"`, `"L"`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::S),
            "M" => Some(Self::M),
            "L" => Some(Self::L),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product entity
///
/// Prices are integer minor currency units (cents). Stock is tracked per size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    /// ISO currency code, upper case (e.g. `EUR`)
    pub currency: String,
    pub active: bool,
    pub stock_s: i32,
    pub stock_m: i32,
    pub stock_l: i32,
    /// Unix millis
    pub created_at: i64,
}

impl Product {
    /// Recorded stock for one size
    pub fn stock_for(&self, size: Size) -> i32 {
        match size {
            Size::S => self.stock_s,
            Size::M => self.stock_m,
            Size::L => self.stock_l,
        }
    }

    pub fn stock_for_mut(&mut self, size: Size) -> &mut i32 {
        match size {
            Size::S => &mut self.stock_s,
            Size::M => &mut self.stock_m,
            Size::L => &mut self.stock_l,
        }
    }
}
