//! Coupon validation and discount engine
//!
//! - [`matcher`] - category matching
//! - [`validator`] - ordered gate checks
//! - [`discount`] - discount arithmetic on eligible lines
//! - [`CouponEngine`] - lookup, usage recording, offer listing

pub mod discount;
mod engine;
pub mod matcher;
pub mod validator;

pub use engine::CouponEngine;

use async_trait::async_trait;
use shared::models::CouponApplication;

use crate::cart::OrderContext;
use crate::utils::ServiceResult;

/// Coupon operations checkout depends on
#[async_trait]
pub trait CouponService: Send + Sync {
    async fn validate_and_apply(
        &self,
        code: &str,
        ctx: &OrderContext,
        user_id: &str,
    ) -> ServiceResult<CouponApplication>;

    /// Only called once the order has been placed
    async fn record_usage(&self, coupon_id: &str, user_id: &str, order_number: &str) -> ServiceResult<()>;
}
