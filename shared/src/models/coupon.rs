//! Coupon Models

use serde::{Deserialize, Serialize};

/// Coupon discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DiscountType {
    Percentage,
    Fixed,
    FreeShipping,
}

/// Promotional coupon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: String,
    /// Stored uppercase, matched case-insensitively
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percentage: 10 = 10%; fixed: rupees
    pub discount_value: f64,
    /// Cap for percentage discounts
    pub max_discount: Option<f64>,
    pub min_order_amount: Option<f64>,
    pub max_order_amount: Option<f64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub applicable_categories: Vec<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub excluded_categories: Vec<String>,
    /// Allow-list of user IDs (blank entries ignored, empty = everyone)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub specific_users: Vec<String>,
    /// Global usage limit (None = unlimited)
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    /// Per-user usage limit (None = unlimited)
    pub usage_limit_per_user: Option<i64>,
    /// Valid from (Unix millis)
    pub valid_from: Option<i64>,
    /// Valid until (Unix millis)
    pub valid_until: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Coupon {
    /// Allow-list entries that are not blank
    pub fn allowed_users(&self) -> impl Iterator<Item = &str> {
        self.specific_users
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
    }

    pub fn is_user_allowed(&self, user_id: &str) -> bool {
        let mut allowed = self.allowed_users().peekable();
        allowed.peek().is_none() || allowed.any(|u| u == user_id.trim())
    }

    pub fn has_category_restriction(&self) -> bool {
        self.applicable_categories.iter().any(|c| !c.trim().is_empty())
    }

    pub fn is_under_usage_limit(&self) -> bool {
        self.usage_limit.is_none_or(|limit| self.usage_count < limit)
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.valid_until.is_some_and(|until| now > until)
    }

    pub fn is_started_at(&self, now: i64) -> bool {
        self.valid_from.is_none_or(|from| now >= from)
    }
}

/// Per user × coupon usage record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserCouponUsage {
    pub coupon_id: String,
    pub user_id: String,
    pub usage_count: i64,
    pub last_used: i64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub order_numbers: Vec<String>,
}

/// A coupon that passed validation, with its computed benefit
///
/// Free-shipping coupons carry no monetary discount: they set
/// `waives_shipping` and report `shipping_savings` for display only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponApplication {
    pub coupon: Coupon,
    /// Amount deducted from the item subtotal (2 dp)
    pub discount_amount: f64,
    /// Amount the discount was computed on
    pub discount_base: f64,
    pub waives_shipping: bool,
    /// Shipping fee the customer does not pay (display only)
    pub shipping_savings: f64,
}

impl CouponApplication {
    /// Total savings shown to the customer
    pub fn display_savings(&self) -> f64 {
        self.discount_amount + self.shipping_savings
    }
}
