//! Coupon engine service

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Coupon, CouponApplication};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::{CouponService, discount, validator};
use crate::cart::OrderContext;
use crate::core::CheckoutConfig;
use crate::db::repository::{RepoError, coupon, coupon_usage};
use crate::utils::ServiceResult;

#[derive(Clone)]
pub struct CouponEngine {
    pool: SqlitePool,
    /// Reported as savings by free-shipping coupons
    shipping_fee: f64,
}

impl CouponEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            shipping_fee: CheckoutConfig::DEFAULT_SHIPPING_FEE,
        }
    }

    pub fn with_shipping_fee(mut self, shipping_fee: f64) -> Self {
        self.shipping_fee = shipping_fee;
        self
    }

    /// Run every gate for `code` against the cart and compute the discount
    pub async fn validate_and_apply(
        &self,
        code: &str,
        ctx: &OrderContext,
        user_id: &str,
    ) -> ServiceResult<CouponApplication> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::with_message(ErrorCode::CouponNotFound, "Enter a coupon code").into());
        }

        let (found, user_usage) = {
            let mut conn = self.pool.acquire().await?;
            let found = coupon::find_by_code(&mut conn, code).await?;
            let usage = match &found {
                Some(c) if c.usage_limit_per_user.is_some() => {
                    coupon_usage::count(&mut conn, &c.id, user_id).await?
                }
                _ => 0,
            };
            (found, usage)
        };
        let Some(found) = found else {
            return Err(AppError::new(ErrorCode::CouponNotFound)
                .with_detail("code", code.to_uppercase())
                .into());
        };

        if let Err(e) = validator::validate(
            &found,
            &ctx.items,
            ctx.subtotal_f64(),
            user_id,
            user_usage,
            now_millis(),
        ) {
            tracing::debug!(code = %found.code, user_id, error = %e, "Coupon rejected");
            return Err(e.into());
        }

        let application = discount::apply(&found, &ctx.items, ctx.subtotal(), self.shipping_fee);
        tracing::debug!(
            code = %found.code,
            user_id,
            discount = application.discount_amount,
            waives_shipping = application.waives_shipping,
            "Coupon applied"
        );
        Ok(application)
    }

    /// Count one use of the coupon by `user_id` for `order_number`
    ///
    /// A second call for the same order is a no-op.
    pub async fn record_usage(
        &self,
        coupon_id: &str,
        user_id: &str,
        order_number: &str,
    ) -> ServiceResult<()> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        if let Some(usage) = coupon_usage::find(&mut *tx, coupon_id, user_id).await?
            && usage.order_numbers.iter().any(|o| o == order_number)
        {
            tx.rollback().await?;
            tracing::info!(coupon_id, user_id, order_number, "Coupon usage already recorded");
            return Ok(());
        }

        match coupon::increment_usage(&mut *tx, coupon_id, now).await {
            Ok(true) => {}
            Ok(false) => {
                // Another checkout validated against the same last use
                tx.rollback().await?;
                tracing::warn!(coupon_id, user_id, order_number, "Coupon usage limit reached, usage not counted");
                return Err(AppError::new(ErrorCode::CouponUsageLimitReached)
                    .with_detail("coupon_id", coupon_id.to_string())
                    .into());
            }
            Err(RepoError::NotFound(_)) => {
                return Err(AppError::new(ErrorCode::CouponNotFound)
                    .with_detail("coupon_id", coupon_id.to_string())
                    .into());
            }
            Err(e) => return Err(e.into()),
        }
        coupon_usage::record(&mut *tx, coupon_id, user_id, order_number, now).await?;
        tx.commit().await?;

        tracing::info!(coupon_id, user_id, order_number, "Coupon usage recorded");
        Ok(())
    }

    /// Browse mode: active, inside the validity window, under the global limit
    pub async fn list_offers(&self) -> ServiceResult<Vec<Coupon>> {
        let now = now_millis();
        let mut conn = self.pool.acquire().await?;
        let coupons = coupon::find_active(&mut conn).await?;
        Ok(coupons
            .into_iter()
            .filter(|c| validator::check_availability(c, now).is_ok())
            .collect())
    }

    /// Checkout mode: browse filter plus user eligibility and order amount
    pub async fn list_applicable(&self, user_id: &str, order_amount: f64) -> ServiceResult<Vec<Coupon>> {
        let now = now_millis();
        let mut conn = self.pool.acquire().await?;
        let mut applicable = Vec::new();
        for c in coupon::find_active(&mut conn).await? {
            if validator::check_availability(&c, now).is_err()
                || validator::check_order_amount(&c, order_amount).is_err()
            {
                continue;
            }
            let usage = if c.usage_limit_per_user.is_some() {
                coupon_usage::count(&mut conn, &c.id, user_id).await?
            } else {
                0
            };
            if validator::check_user(&c, user_id, usage).is_ok() {
                applicable.push(c);
            }
        }
        Ok(applicable)
    }

    /// Store a new coupon (code normalized to uppercase)
    pub async fn create_coupon(&self, new_coupon: &Coupon) -> ServiceResult<Coupon> {
        let mut conn = self.pool.acquire().await?;
        match coupon::create(&mut conn, new_coupon).await {
            Ok(created) => {
                tracing::info!(code = %created.code, "Coupon created");
                Ok(created)
            }
            Err(RepoError::Duplicate(_)) => Err(AppError::with_message(
                ErrorCode::ValidationFailed,
                format!("Coupon code {} already exists", new_coupon.code.trim().to_uppercase()),
            )
            .into()),
            Err(RepoError::Validation(msg)) => Err(AppError::validation(msg).into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CouponService for CouponEngine {
    async fn validate_and_apply(
        &self,
        code: &str,
        ctx: &OrderContext,
        user_id: &str,
    ) -> ServiceResult<CouponApplication> {
        CouponEngine::validate_and_apply(self, code, ctx, user_id).await
    }

    async fn record_usage(&self, coupon_id: &str, user_id: &str, order_number: &str) -> ServiceResult<()> {
        CouponEngine::record_usage(self, coupon_id, user_id, order_number).await
    }
}
