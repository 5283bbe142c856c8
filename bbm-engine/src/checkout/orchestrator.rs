//! Checkout orchestration
//!
//! quote → redeem → charge → place order → record coupon usage → award →
//! notify. A failed redemption aborts before any money moves; a failed
//! charge or placement gives the points back. Everything after placement is
//! best-effort: failures are logged and reported in the receipt, never
//! returned as errors.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::CouponApplication;
use std::sync::Arc;

use super::collaborators::{OrderDraft, OrderGateway, OrderNotifier, PaymentGateway, PlacedOrder};
use super::types::{
    CheckoutQuote, CheckoutReceipt, CheckoutRequest, CouponUsageOutcome, LoyaltyOutcome,
    NotificationOutcome, OrderTotals, RedemptionOutcome,
};
use crate::cart::OrderContext;
use crate::core::{CheckoutConfig, RewardBase};
use crate::coupons::CouponService;
use crate::loyalty::reward::points_to_rupees;
use crate::loyalty::{CONVERSION_RATE, LoyaltyService, MINIMUM_REDEMPTION, calculate_reward, max_redeemable};
use crate::money::{to_decimal, to_f64};
use crate::notify::OrderConfirmation;
use crate::utils::ServiceResult;

pub struct CheckoutOrchestrator {
    loyalty: Arc<dyn LoyaltyService>,
    coupons: Arc<dyn CouponService>,
    orders: Arc<dyn OrderGateway>,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn OrderNotifier>,
    config: CheckoutConfig,
}

impl CheckoutOrchestrator {
    pub fn new(
        loyalty: Arc<dyn LoyaltyService>,
        coupons: Arc<dyn CouponService>,
        orders: Arc<dyn OrderGateway>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn OrderNotifier>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            loyalty,
            coupons,
            orders,
            payments,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Price the checkout without writing anything
    pub async fn quote(&self, request: &CheckoutRequest) -> ServiceResult<CheckoutQuote> {
        let ctx = OrderContext::new(request.items.clone())?;

        let coupon = match request.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(self.coupons.validate_and_apply(code, &ctx, &request.user_id).await?),
            None => None,
        };
        let coupon_discount = coupon
            .as_ref()
            .map_or(Decimal::ZERO, |c| to_decimal(c.discount_amount));
        let waives_shipping = coupon.as_ref().is_some_and(|c| c.waives_shipping);

        let balance = self.loyalty.get_user_balance(&request.user_id).await?;
        let after_coupon = (ctx.subtotal() - coupon_discount).max(Decimal::ZERO);
        let max_points = max_redeemable(balance.current_balance, to_f64(after_coupon));
        check_redemption(request.redeem_points, balance.current_balance, max_points)?;

        let loyalty_discount = Decimal::from(request.redeem_points) / Decimal::from(CONVERSION_RATE);
        let totals = OrderTotals::compute(
            ctx.subtotal(),
            coupon_discount,
            loyalty_discount,
            waives_shipping,
            &self.config,
        );
        let expected_reward = calculate_reward(self.reward_amount(&totals), &ctx.categories());

        Ok(CheckoutQuote {
            user_id: request.user_id.clone(),
            items: ctx.items,
            coupon,
            redeem_points: request.redeem_points,
            available_points: balance.current_balance,
            max_redeemable: max_points,
            totals,
            expected_reward,
        })
    }

    /// Redeem, charge, place the order and run the post-order side effects
    pub async fn place_order(&self, request: &CheckoutRequest) -> ServiceResult<CheckoutReceipt> {
        let quote = self.quote(request).await?;
        let user_id = request.user_id.as_str();
        let checkout_ref = format!("CHK-{}", shared::util::snowflake_id());

        // Points are spent before the charge; a balance that moved since the quote aborts here
        let redemption = self
            .apply_redemption(user_id, &checkout_ref, quote.redeem_points)
            .await?;

        let payment = match self
            .payments
            .charge(user_id, quote.totals.total, &checkout_ref)
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                tracing::warn!(user_id, checkout_ref = %checkout_ref, error = %e, "Payment failed");
                self.reverse_redemption(user_id, &checkout_ref, &redemption).await;
                return Err(
                    AppError::with_message(ErrorCode::PaymentFailed, format!("Payment failed: {e}")).into(),
                );
            }
        };

        let draft = OrderDraft {
            checkout_ref: checkout_ref.clone(),
            user_id: user_id.to_string(),
            items: quote.items.clone(),
            totals: quote.totals.clone(),
            coupon_code: quote.coupon.as_ref().map(|c| c.coupon.code.clone()),
            redeem_points: quote.redeem_points,
            payment_id: payment.payment_id.clone(),
        };
        let placed = match self.orders.place_order(&draft).await {
            Ok(placed) => placed,
            Err(e) => {
                // Money was taken; this needs a refund or manual follow-up
                tracing::error!(
                    user_id,
                    checkout_ref = %checkout_ref,
                    payment_id = %payment.payment_id,
                    error = %e,
                    "Order placement failed after payment"
                );
                self.reverse_redemption(user_id, &checkout_ref, &redemption).await;
                return Err(AppError::new(ErrorCode::OrderPlacementFailed)
                    .with_detail("payment_id", payment.payment_id.clone())
                    .into());
            }
        };
        tracing::info!(
            user_id,
            order_id = %placed.order_id,
            checkout_ref = %checkout_ref,
            total = quote.totals.total,
            "Order placed"
        );

        let coupon_usage = self.record_coupon_usage(user_id, &placed, quote.coupon.as_ref()).await;
        let loyalty = self.award_loyalty(user_id, &placed, &quote).await;
        let notification = self.send_confirmation(request, &placed, &quote).await;

        Ok(CheckoutReceipt {
            order: placed,
            checkout_ref,
            payment_id: payment.payment_id,
            totals: quote.totals,
            coupon: quote.coupon,
            redemption,
            coupon_usage,
            loyalty,
            notification,
        })
    }

    fn reward_amount(&self, totals: &OrderTotals) -> f64 {
        match self.config.reward_base {
            RewardBase::Subtotal => totals.subtotal,
            RewardBase::Payable => totals.taxable_amount,
        }
    }

    /// Spend the requested points against the checkout reference
    async fn apply_redemption(
        &self,
        user_id: &str,
        checkout_ref: &str,
        points: i64,
    ) -> ServiceResult<RedemptionOutcome> {
        if points <= 0 {
            return Ok(RedemptionOutcome::NotRequested);
        }
        match self.loyalty.redeem(user_id, points, checkout_ref).await {
            Ok(discount) => Ok(RedemptionOutcome::Applied { points, discount }),
            Err(e) => {
                tracing::warn!(user_id, checkout_ref, points, error = %e, "BBM Bucks redemption failed, checkout aborted");
                Err(e)
            }
        }
    }

    /// Give redeemed points back after the checkout failed downstream
    async fn reverse_redemption(&self, user_id: &str, checkout_ref: &str, redemption: &RedemptionOutcome) {
        let RedemptionOutcome::Applied { points, .. } = redemption else {
            return;
        };
        if let Err(e) = self.loyalty.reverse_redemption(user_id, checkout_ref).await {
            tracing::error!(
                user_id,
                checkout_ref,
                points,
                error = %e,
                "Failed to reverse BBM Bucks redemption, needs manual follow-up"
            );
        }
    }

    async fn record_coupon_usage(
        &self,
        user_id: &str,
        placed: &PlacedOrder,
        coupon: Option<&CouponApplication>,
    ) -> CouponUsageOutcome {
        let Some(applied) = coupon else {
            return CouponUsageOutcome::NoCoupon;
        };
        match self
            .coupons
            .record_usage(&applied.coupon.id, user_id, &placed.order_number)
            .await
        {
            Ok(()) => CouponUsageOutcome::Recorded,
            Err(e) => {
                tracing::warn!(user_id, order_id = %placed.order_id, coupon = %applied.coupon.code, error = %e, "Failed to record coupon usage");
                CouponUsageOutcome::Failed {
                    reason: AppError::from(e).message,
                }
            }
        }
    }

    async fn award_loyalty(&self, user_id: &str, placed: &PlacedOrder, quote: &CheckoutQuote) -> LoyaltyOutcome {
        let amount = self.reward_amount(&quote.totals);
        let categories: Vec<String> = OrderContext::categories_of(&quote.items);
        match self
            .loyalty
            .award(user_id, &placed.order_id, amount, &categories)
            .await
        {
            Ok(reward) if reward.is_zero() => LoyaltyOutcome::NotEligible {
                reason: reward.reason.unwrap_or_default(),
            },
            Ok(reward) => LoyaltyOutcome::Awarded { reward },
            Err(e) => {
                tracing::warn!(user_id, order_id = %placed.order_id, amount, error = %e, "BBM Bucks award failed after order placement");
                LoyaltyOutcome::Missed {
                    reason: AppError::from(e).message,
                }
            }
        }
    }

    async fn send_confirmation(
        &self,
        request: &CheckoutRequest,
        placed: &PlacedOrder,
        quote: &CheckoutQuote,
    ) -> NotificationOutcome {
        let Some(email) = request.contact.email() else {
            return NotificationOutcome::Skipped;
        };
        let confirmation = OrderConfirmation::new(email, &placed.order_number)
            .with_meta("order_id", &placed.order_id)
            .with_meta("customer_name", &request.contact.name)
            .with_meta("item_count", quote.items.len())
            .with_meta("total", format!("{:.2}", quote.totals.total));
        match self.notifier.send_confirmation(&confirmation).await {
            Ok(()) => NotificationOutcome::Sent {
                recipient: email.to_string(),
            },
            Err(e) => {
                tracing::warn!(order_id = %placed.order_id, error = %e, "Order confirmation failed");
                NotificationOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}

/// Redemption request against balance and the per-order cap
fn check_redemption(points: i64, balance: i64, max_points: i64) -> Result<(), AppError> {
    if points == 0 {
        return Ok(());
    }
    if points < 0 {
        return Err(AppError::new(ErrorCode::InvalidLoyaltyAmount).with_detail("requested", points));
    }
    if points < MINIMUM_REDEMPTION {
        return Err(AppError::with_message(
            ErrorCode::MinimumRedemption,
            format!(
                "Minimum redemption is {MINIMUM_REDEMPTION} BBM Bucks (₹{:.2})",
                points_to_rupees(MINIMUM_REDEMPTION)
            ),
        )
        .with_detail("minimum", MINIMUM_REDEMPTION));
    }
    if points > balance {
        return Err(AppError::new(ErrorCode::InsufficientBalance)
            .with_detail("available", balance)
            .with_detail("requested", points));
    }
    if points > max_points {
        return Err(AppError::with_message(
            ErrorCode::RedemptionLimitExceeded,
            format!("You can use up to {max_points} BBM Bucks on this order"),
        )
        .with_detail("max_redeemable", max_points));
    }
    Ok(())
}
