//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Loyalty errors
/// - 2xxx: Coupon errors
/// - 3xxx: Checkout errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Loyalty errors (1xxx)
    Loyalty,
    /// Coupon errors (2xxx)
    Coupon,
    /// Checkout errors (3xxx)
    Checkout,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Loyalty,
            2000..3000 => Self::Coupon,
            3000..4000 => Self::Checkout,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Loyalty => "loyalty",
            Self::Coupon => "coupon",
            Self::Checkout => "checkout",
            Self::System => "system",
        }
    }

    /// Infrastructure failures are generic and may succeed on retry;
    /// everything else is user-actionable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
