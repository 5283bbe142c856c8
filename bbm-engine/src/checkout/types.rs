//! Checkout request, quote and receipt types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{CartItem, CouponApplication, Reward};

use super::collaborators::PlacedOrder;
use crate::core::CheckoutConfig;
use crate::money::{round_money, to_decimal, to_f64};

/// Customer contact for the confirmation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CustomerContact {
    /// Email, if present and not blank
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    /// BBM Bucks to spend; 0 = none
    #[serde(default)]
    pub redeem_points: i64,
    #[serde(default)]
    pub contact: CustomerContact,
}

/// Order amounts in rupees, 2 dp
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub coupon_discount: f64,
    pub loyalty_discount: f64,
    /// `max(subtotal - coupon - loyalty, 0)`
    pub taxable_amount: f64,
    pub tax: f64,
    pub shipping: f64,
    /// Waived shipping fee, display only
    pub shipping_savings: f64,
    pub total: f64,
}

impl OrderTotals {
    pub fn compute(
        subtotal: Decimal,
        coupon_discount: Decimal,
        loyalty_discount: Decimal,
        waives_shipping: bool,
        config: &CheckoutConfig,
    ) -> Self {
        let taxable = (subtotal - coupon_discount - loyalty_discount).max(Decimal::ZERO);
        let tax = round_money(taxable * to_decimal(config.tax_rate_percent) / Decimal::ONE_HUNDRED);
        let fee = to_decimal(config.shipping_fee);
        let shipping = if waives_shipping { Decimal::ZERO } else { fee };
        let total = round_money(taxable) + tax + shipping;
        Self {
            subtotal: to_f64(subtotal),
            coupon_discount: to_f64(coupon_discount),
            loyalty_discount: to_f64(loyalty_discount),
            taxable_amount: to_f64(taxable),
            tax: to_f64(tax),
            shipping: to_f64(shipping),
            shipping_savings: if waives_shipping { to_f64(fee) } else { 0.0 },
            total: to_f64(total),
        }
    }
}

/// Priced checkout, nothing written yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutQuote {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub coupon: Option<CouponApplication>,
    pub redeem_points: i64,
    pub available_points: i64,
    pub max_redeemable: i64,
    pub totals: OrderTotals,
    /// Reward the order would earn
    pub expected_reward: Reward,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RedemptionOutcome {
    NotRequested,
    /// Debited before payment, keyed on the checkout reference
    Applied { points: i64, discount: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponUsageOutcome {
    NoCoupon,
    Recorded,
    Failed { reason: String },
}

/// Post-order loyalty award
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoyaltyOutcome {
    Awarded { reward: Reward },
    NotEligible { reason: String },
    /// The award failed; the order stands
    Missed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent { recipient: String },
    /// No email on file
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutReceipt {
    pub order: PlacedOrder,
    /// Reference the payment and the redemption were made under
    pub checkout_ref: String,
    pub payment_id: String,
    pub totals: OrderTotals,
    pub coupon: Option<CouponApplication>,
    pub redemption: RedemptionOutcome,
    pub coupon_usage: CouponUsageOutcome,
    pub loyalty: LoyaltyOutcome,
    pub notification: NotificationOutcome,
}

impl CheckoutReceipt {
    /// Copy for the order-success screen
    pub fn confirmation_message(&self) -> String {
        match &self.notification {
            NotificationOutcome::Sent { recipient } => format!(
                "Order {} placed. A confirmation email has been sent to {recipient}.",
                self.order.order_number
            ),
            NotificationOutcome::Skipped | NotificationOutcome::Failed { .. } => format!(
                "Order {} placed. We'll share your order updates on WhatsApp.",
                self.order.order_number
            ),
        }
    }

    /// Whether the customer should be told they missed out on BBM Bucks
    pub fn reward_missed(&self) -> bool {
        matches!(self.loyalty, LoyaltyOutcome::Missed { .. })
    }
}
