//! Coupon gate checks
//!
//! Gates run in a fixed order and the first failure wins:
//! active → global usage limit → validity window → user eligibility →
//! order amount → applicable category → excluded category.
//! Looking the coupon up by code comes before all of them.

use shared::error::{AppError, ErrorCode};
use shared::models::{CartItem, Coupon};

use super::matcher::matches_any;
use crate::money::{to_decimal, to_f64};

/// Active, under the global limit and inside its validity window
pub fn check_availability(coupon: &Coupon, now: i64) -> Result<(), AppError> {
    if !coupon.is_active {
        return Err(AppError::new(ErrorCode::CouponInactive));
    }
    if !coupon.is_under_usage_limit() {
        return Err(AppError::new(ErrorCode::CouponUsageLimitReached));
    }
    if coupon.is_expired_at(now) {
        return Err(AppError::new(ErrorCode::CouponExpired));
    }
    if !coupon.is_started_at(now) {
        let mut err = AppError::new(ErrorCode::CouponNotYetValid);
        if let Some(from) = coupon.valid_from {
            err = err.with_detail("valid_from", from);
        }
        return Err(err);
    }
    Ok(())
}

/// Allow-list, then the per-user cap
pub fn check_user(coupon: &Coupon, user_id: &str, user_usage: i64) -> Result<(), AppError> {
    if !coupon.is_user_allowed(user_id) {
        return Err(AppError::new(ErrorCode::CouponUserNotEligible));
    }
    if let Some(limit) = coupon.usage_limit_per_user
        && user_usage >= limit
    {
        return Err(AppError::new(ErrorCode::CouponUserLimitReached).with_detail("limit", limit));
    }
    Ok(())
}

pub fn check_order_amount(coupon: &Coupon, order_amount: f64) -> Result<(), AppError> {
    let amount = to_decimal(order_amount);
    if let Some(min) = coupon.min_order_amount
        && amount < to_decimal(min)
    {
        let shortfall = to_f64(to_decimal(min) - amount);
        return Err(AppError::with_message(
            ErrorCode::CouponMinimumNotMet,
            format!("Add items worth ₹{shortfall:.2} more to use this coupon (minimum ₹{min:.2})"),
        )
        .with_detail("min_order_amount", min)
        .with_detail("shortfall", shortfall));
    }
    if let Some(max) = coupon.max_order_amount
        && amount > to_decimal(max)
    {
        return Err(AppError::with_message(
            ErrorCode::CouponMaximumExceeded,
            format!("This coupon is valid on orders up to ₹{max:.2}"),
        )
        .with_detail("max_order_amount", max));
    }
    Ok(())
}

/// Some item in an applicable category, none in an excluded one
pub fn check_categories(coupon: &Coupon, items: &[CartItem]) -> Result<(), AppError> {
    if coupon.has_category_restriction()
        && !items
            .iter()
            .any(|item| matches_any(&coupon.applicable_categories, item.category.as_deref()))
    {
        return Err(AppError::new(ErrorCode::CouponCategoryNotApplicable)
            .with_detail("categories", coupon.applicable_categories.join(", ")));
    }
    if let Some(item) = items
        .iter()
        .find(|item| matches_any(&coupon.excluded_categories, item.category.as_deref()))
    {
        return Err(AppError::new(ErrorCode::CouponCategoryExcluded)
            .with_detail("product_id", item.product_id.clone()));
    }
    Ok(())
}

/// All gates after the code lookup
pub fn validate(
    coupon: &Coupon,
    items: &[CartItem],
    subtotal: f64,
    user_id: &str,
    user_usage: i64,
    now: i64,
) -> Result<(), AppError> {
    check_availability(coupon, now)?;
    check_user(coupon, user_id, user_usage)?;
    check_order_amount(coupon, subtotal)?;
    check_categories(coupon, items)
}
