//! Unified error codes for the BBM storefront engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Loyalty (BBM Bucks) errors
//! - 2xxx: Coupon errors
//! - 3xxx: Checkout errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the storefront app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Loyalty ====================
    /// Redemption below the minimum redeemable amount
    MinimumRedemption = 1001,
    /// Not enough BBM Bucks for the requested redemption
    InsufficientBalance = 1002,
    /// Redemption exceeds the per-order cap
    RedemptionLimitExceeded = 1003,
    /// Reward or redemption amount is not a valid number
    InvalidLoyaltyAmount = 1004,

    // ==================== 2xxx: Coupon ====================
    /// No coupon with this code
    CouponNotFound = 2001,
    /// Coupon has been deactivated
    CouponInactive = 2002,
    /// Coupon reached its global usage limit
    CouponUsageLimitReached = 2003,
    /// Coupon validity window has ended
    CouponExpired = 2004,
    /// Coupon validity window has not started
    CouponNotYetValid = 2005,
    /// User is not on the coupon's allow-list
    CouponUserNotEligible = 2006,
    /// User reached the per-user usage limit
    CouponUserLimitReached = 2007,
    /// Order subtotal is below the coupon minimum
    CouponMinimumNotMet = 2008,
    /// Order subtotal is above the coupon maximum
    CouponMaximumExceeded = 2009,
    /// No cart item belongs to an applicable category
    CouponCategoryNotApplicable = 2010,
    /// A cart item belongs to an excluded category
    CouponCategoryExcluded = 2011,

    // ==================== 3xxx: Checkout ====================
    /// Cart has no items
    CartEmpty = 3001,
    /// Cart item has an invalid price or quantity
    InvalidCartItem = 3002,
    /// Payment processing failed
    PaymentFailed = 3003,
    /// Order could not be placed
    OrderPlacementFailed = 3004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",

            // Loyalty
            ErrorCode::MinimumRedemption => "Redemption is below the minimum amount",
            ErrorCode::InsufficientBalance => "Insufficient BBM Bucks balance",
            ErrorCode::RedemptionLimitExceeded => "Redemption exceeds the limit for this order",
            ErrorCode::InvalidLoyaltyAmount => "Invalid BBM Bucks amount",

            // Coupon
            ErrorCode::CouponNotFound => "Invalid coupon code",
            ErrorCode::CouponInactive => "This coupon is no longer active",
            ErrorCode::CouponUsageLimitReached => "This coupon has reached its usage limit",
            ErrorCode::CouponExpired => "This coupon has expired",
            ErrorCode::CouponNotYetValid => "This coupon is not valid yet",
            ErrorCode::CouponUserNotEligible => "This coupon is not available for your account",
            ErrorCode::CouponUserLimitReached => "You have already used this coupon",
            ErrorCode::CouponMinimumNotMet => "Order does not meet the coupon minimum",
            ErrorCode::CouponMaximumExceeded => "Order exceeds the coupon maximum",
            ErrorCode::CouponCategoryNotApplicable => {
                "This coupon does not apply to the items in your cart"
            }
            ErrorCode::CouponCategoryExcluded => {
                "This coupon cannot be used with some items in your cart"
            }

            // Checkout
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::InvalidCartItem => "Cart contains an invalid item",
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::OrderPlacementFailed => "Order could not be placed",

            // System
            ErrorCode::InternalError => "Something went wrong, please try again",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),

            // Loyalty
            1001 => Ok(ErrorCode::MinimumRedemption),
            1002 => Ok(ErrorCode::InsufficientBalance),
            1003 => Ok(ErrorCode::RedemptionLimitExceeded),
            1004 => Ok(ErrorCode::InvalidLoyaltyAmount),

            // Coupon
            2001 => Ok(ErrorCode::CouponNotFound),
            2002 => Ok(ErrorCode::CouponInactive),
            2003 => Ok(ErrorCode::CouponUsageLimitReached),
            2004 => Ok(ErrorCode::CouponExpired),
            2005 => Ok(ErrorCode::CouponNotYetValid),
            2006 => Ok(ErrorCode::CouponUserNotEligible),
            2007 => Ok(ErrorCode::CouponUserLimitReached),
            2008 => Ok(ErrorCode::CouponMinimumNotMet),
            2009 => Ok(ErrorCode::CouponMaximumExceeded),
            2010 => Ok(ErrorCode::CouponCategoryNotApplicable),
            2011 => Ok(ErrorCode::CouponCategoryExcluded),

            // Checkout
            3001 => Ok(ErrorCode::CartEmpty),
            3002 => Ok(ErrorCode::InvalidCartItem),
            3003 => Ok(ErrorCode::PaymentFailed),
            3004 => Ok(ErrorCode::OrderPlacementFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
