//! BBM Bucks reward arithmetic
//!
//! Pure functions: tier lookup, reward points, redemption limits.

use rust_decimal::prelude::*;
use shared::models::{LoyaltyTier, Reward};

use crate::money::{floor_to_i64, to_decimal, to_f64};

/// Points per rupee (100 points = ₹1)
pub const CONVERSION_RATE: i64 = 100;
/// Smallest redemption, in points
pub const MINIMUM_REDEMPTION: i64 = 50;
/// At most half of the order can be paid with points
pub const MAX_REDEMPTION_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
/// 12 × 30 days
pub const EXPIRY_DAYS: i64 = 360;

/// Categories that never earn BBM Bucks (compared case-insensitively)
pub const EXCLUDED_CATEGORIES: [&str; 4] = ["GIFT CARD", "GIFT CARDS", "GIFT VOUCHER", "SERVICES"];

struct TierRule {
    tier: LoyaltyTier,
    /// Inclusive lower bound in rupees
    min_amount: Decimal,
    /// Percent of the order amount
    percentage: Decimal,
}

/// Highest bracket first
const TIERS: [TierRule; 3] = [
    TierRule {
        tier: LoyaltyTier::Elite,
        min_amount: Decimal::from_parts(50_000, 0, 0, false, 0),
        percentage: Decimal::from_parts(2, 0, 0, false, 0),
    },
    TierRule {
        tier: LoyaltyTier::Premium,
        min_amount: Decimal::from_parts(25_000, 0, 0, false, 0),
        percentage: Decimal::from_parts(15, 0, 0, false, 1),
    },
    TierRule {
        tier: LoyaltyTier::Standard,
        min_amount: Decimal::ZERO,
        percentage: Decimal::ONE,
    },
];

/// Tier and reward percentage for an order amount; bounds belong to the higher tier
pub fn tier_for(order_amount: Decimal) -> (LoyaltyTier, Decimal) {
    TIERS
        .iter()
        .find(|rule| order_amount >= rule.min_amount)
        .map(|rule| (rule.tier, rule.percentage))
        .unwrap_or((LoyaltyTier::Standard, Decimal::ONE))
}

pub fn is_excluded_category(category: &str) -> bool {
    let category = category.trim();
    EXCLUDED_CATEGORIES
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(category))
}

/// Rupee value of a point amount
pub fn points_to_rupees(points: i64) -> f64 {
    to_f64(Decimal::from(points) / Decimal::from(CONVERSION_RATE))
}

/// Reward for an order: `floor(amount × pct / 100 × 100)` points
///
/// Zero (with a reason) for excluded categories and non-positive amounts.
pub fn calculate_reward<S: AsRef<str>>(order_amount: f64, categories: &[S]) -> Reward {
    if let Some(category) = categories.iter().map(|c| c.as_ref()).find(|c| is_excluded_category(c)) {
        return Reward::none(format!("{} purchases do not earn BBM Bucks", category.trim()));
    }
    if !order_amount.is_finite() || order_amount <= 0.0 {
        return Reward::none("Order amount must be greater than zero");
    }

    // No rounding before the tier lookup and floor
    let amount = to_decimal(order_amount);
    let (tier, percentage) = tier_for(amount);
    let points = floor_to_i64(amount * percentage / Decimal::ONE_HUNDRED * Decimal::from(CONVERSION_RATE));

    Reward {
        points,
        percentage: percentage.to_f64().unwrap_or_default(),
        discount_value: points_to_rupees(points),
        tier: Some(tier),
        reason: None,
    }
}

/// Largest redemption allowed for this balance and order amount
///
/// `min(50% of the order in points, balance rounded down to 50, balance)`,
/// never negative.
pub fn max_redeemable(current_balance: i64, order_amount: f64) -> i64 {
    if current_balance <= 0 || !order_amount.is_finite() || order_amount <= 0.0 {
        return 0;
    }
    let by_order =
        floor_to_i64(to_decimal(order_amount) * MAX_REDEMPTION_RATIO * Decimal::from(CONVERSION_RATE));
    let by_step = current_balance / MINIMUM_REDEMPTION * MINIMUM_REDEMPTION;
    by_order.min(by_step).min(current_balance).max(0)
}
