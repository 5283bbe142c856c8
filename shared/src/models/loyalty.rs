//! BBM Bucks Loyalty Models

use serde::{Deserialize, Serialize};

/// Reward-rate bracket keyed by order amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum LoyaltyTier {
    Standard,
    Premium,
    Elite,
}

/// Ledger entry type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TransactionKind {
    Earned,
    Redeemed,
    Expired,
    /// Compensates a redemption whose checkout did not complete
    Reversed,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earned => "EARNED",
            TransactionKind::Redeemed => "REDEEMED",
            TransactionKind::Expired => "EXPIRED",
            TransactionKind::Reversed => "REVERSED",
        }
    }
}

/// Ledger entry status (ACTIVE → USED / ACTIVE → EXPIRED)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TransactionStatus {
    Active,
    Used,
    Expired,
}

/// Per-user BBM Bucks balance
///
/// `current_balance == total_earned - total_redeemed - total_expired`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserBalance {
    pub user_id: String,
    pub current_balance: i64,
    pub total_earned: i64,
    pub total_redeemed: i64,
    pub total_expired: i64,
    pub lifetime_balance: i64,
    /// Tier of the most recent award
    pub tier: Option<LoyaltyTier>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserBalance {
    /// Zero-valued balance for users without a ledger record
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_balance: 0,
            total_earned: 0,
            total_redeemed: 0,
            total_expired: 0,
            lifetime_balance: 0,
            tier: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.current_balance >= 0
            && self.current_balance == self.total_earned - self.total_redeemed - self.total_expired
    }
}

/// Append-only ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyTransaction {
    /// Deterministic ID, see `util::ledger_entry_id`
    pub id: String,
    pub user_id: String,
    pub order_id: String,
    pub kind: TransactionKind,
    /// Positive for EARNED / REVERSED, negative for REDEEMED / EXPIRED
    pub amount: i64,
    pub order_value: f64,
    pub reward_percentage: f64,
    pub tier: Option<LoyaltyTier>,
    /// Unix millis, EARNED entries only
    pub expiry_date: Option<i64>,
    pub status: TransactionStatus,
    /// Entry an EXPIRED or REVERSED entry was derived from
    pub source_id: Option<String>,
    pub created_at: i64,
}

/// Reward computed for an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reward {
    pub points: i64,
    /// Reward rate in percent (1.5 = 1.5%)
    pub percentage: f64,
    /// Rupee value of `points`
    pub discount_value: f64,
    pub tier: Option<LoyaltyTier>,
    /// Why the reward is zero, when it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Reward {
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            points: 0,
            percentage: 0.0,
            discount_value: 0.0,
            tier: None,
            reason: Some(reason.into()),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.points <= 0
    }
}

/// Outcome of one expiry sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpirySummary {
    /// Due entries found
    pub scanned: usize,
    /// Entries transitioned to EXPIRED
    pub expired: usize,
    /// Points deducted from balances
    pub points_expired: i64,
    /// Entries that failed and remain ACTIVE
    pub failed: usize,
}
