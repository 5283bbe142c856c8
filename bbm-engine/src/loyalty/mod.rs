//! BBM Bucks loyalty ledger
//!
//! - [`reward`] - tier table and point arithmetic
//! - [`LoyaltyLedger`] - award / redeem / reverse / expire against SQLite
//! - [`ExpirySweeper`] - periodic expiry job

mod ledger;
pub mod reward;
mod sweeper;

pub use ledger::LoyaltyLedger;
pub use reward::{
    CONVERSION_RATE, EXPIRY_DAYS, MAX_REDEMPTION_RATIO, MINIMUM_REDEMPTION, calculate_reward,
    max_redeemable,
};
pub use sweeper::ExpirySweeper;

use async_trait::async_trait;
use shared::models::{Reward, UserBalance};

use crate::utils::ServiceResult;

/// Loyalty operations checkout depends on
#[async_trait]
pub trait LoyaltyService: Send + Sync {
    /// Current balance (zeroed when the user has none)
    async fn get_user_balance(&self, user_id: &str) -> ServiceResult<UserBalance>;

    /// Credit the reward for an order; idempotent per order
    async fn award(
        &self,
        user_id: &str,
        order_id: &str,
        order_amount: f64,
        categories: &[String],
    ) -> ServiceResult<Reward>;

    /// Spend points on an order; returns the rupee discount. Idempotent per order.
    async fn redeem(&self, user_id: &str, points: i64, order_id: &str) -> ServiceResult<f64>;

    /// Give back the points redeemed against `order_id`; returns the points restored
    async fn reverse_redemption(&self, user_id: &str, order_id: &str) -> ServiceResult<i64>;
}
