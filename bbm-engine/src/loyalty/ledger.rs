//! Loyalty ledger service
//!
//! Every balance change is a ledger row plus a balance update in one SQL
//! transaction. Earn and redeem rows are keyed on `(order_id, kind)` so a
//! retried call finds its own row and returns the stored result.

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ExpirySummary, LoyaltyTransaction, Reward, TransactionKind, TransactionStatus, UserBalance,
};
use shared::util::{DAY_MILLIS, ledger_entry_id, now_millis};
use sqlx::SqlitePool;
use std::collections::HashSet;

use super::LoyaltyService;
use super::reward::{EXPIRY_DAYS, MINIMUM_REDEMPTION, calculate_reward, points_to_rupees};
use crate::db::repository::{balance, ledger};
use crate::utils::ServiceResult;

/// Due entries fetched per sweep batch
const EXPIRY_BATCH_SIZE: i64 = 500;

#[derive(Clone)]
pub struct LoyaltyLedger {
    pool: SqlitePool,
}

impl LoyaltyLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_user_balance(&self, user_id: &str) -> ServiceResult<UserBalance> {
        let mut conn = self.pool.acquire().await?;
        let found = balance::find(&mut conn, user_id).await?;
        Ok(found.unwrap_or_else(|| UserBalance::empty(user_id)))
    }

    pub async fn award<S: AsRef<str>>(
        &self,
        user_id: &str,
        order_id: &str,
        order_amount: f64,
        categories: &[S],
    ) -> ServiceResult<Reward> {
        let reward = calculate_reward(order_amount, categories);
        if reward.is_zero() {
            tracing::debug!(user_id, order_id, reason = ?reward.reason, "No BBM Bucks for order");
            return Ok(reward);
        }

        let now = now_millis();
        let entry = LoyaltyTransaction {
            id: ledger_entry_id(order_id, TransactionKind::Earned.as_str()),
            user_id: user_id.to_string(),
            order_id: order_id.to_string(),
            kind: TransactionKind::Earned,
            amount: reward.points,
            order_value: order_amount,
            reward_percentage: reward.percentage,
            tier: reward.tier,
            expiry_date: Some(now + EXPIRY_DAYS * DAY_MILLIS),
            status: TransactionStatus::Active,
            source_id: None,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        if !ledger::insert_if_absent(&mut *tx, &entry).await? {
            let stored = ledger::find_by_id(&mut *tx, &entry.id).await?;
            tx.rollback().await?;
            let stored = replayed_entry(stored, &entry.id, user_id)?;
            tracing::info!(user_id, order_id, points = stored.amount, "Award already recorded for order");
            return Ok(Reward {
                points: stored.amount,
                percentage: stored.reward_percentage,
                discount_value: points_to_rupees(stored.amount),
                tier: stored.tier,
                reason: None,
            });
        }
        balance::credit(&mut *tx, user_id, reward.points, reward.tier, now).await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            order_id,
            points = reward.points,
            tier = ?reward.tier,
            "BBM Bucks awarded"
        );
        Ok(reward)
    }

    pub async fn redeem(&self, user_id: &str, points: i64, order_id: &str) -> ServiceResult<f64> {
        if points < MINIMUM_REDEMPTION {
            return Err(AppError::with_message(
                ErrorCode::MinimumRedemption,
                format!(
                    "Minimum redemption is {MINIMUM_REDEMPTION} BBM Bucks (₹{:.2})",
                    points_to_rupees(MINIMUM_REDEMPTION)
                ),
            )
            .with_detail("minimum", MINIMUM_REDEMPTION)
            .with_detail("requested", points)
            .into());
        }

        let entry_id = ledger_entry_id(order_id, TransactionKind::Redeemed.as_str());
        let current = {
            let mut conn = self.pool.acquire().await?;
            if let Some(stored) = ledger::find_by_id(&mut conn, &entry_id).await? {
                let stored = replayed_entry(Some(stored), &entry_id, user_id)?;
                tracing::info!(user_id, order_id, "Redemption already recorded for order");
                return Ok(points_to_rupees(-stored.amount));
            }
            balance::find(&mut conn, user_id)
                .await?
                .map_or(0, |b| b.current_balance)
        };
        if current < points {
            return Err(insufficient_balance(current, points).into());
        }

        let now = now_millis();
        let entry = LoyaltyTransaction {
            id: entry_id,
            user_id: user_id.to_string(),
            order_id: order_id.to_string(),
            kind: TransactionKind::Redeemed,
            amount: -points,
            order_value: 0.0,
            reward_percentage: 0.0,
            tier: None,
            expiry_date: None,
            status: TransactionStatus::Used,
            source_id: None,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        if !ledger::insert_if_absent(&mut *tx, &entry).await? {
            let stored = ledger::find_by_id(&mut *tx, &entry.id).await?;
            tx.rollback().await?;
            let stored = replayed_entry(stored, &entry.id, user_id)?;
            return Ok(points_to_rupees(-stored.amount));
        }
        if !balance::debit_redemption(&mut *tx, user_id, points, now).await? {
            // Balance moved between the read and the write
            tx.rollback().await?;
            let current = self.get_user_balance(user_id).await?.current_balance;
            return Err(insufficient_balance(current, points).into());
        }
        tx.commit().await?;

        let discount = points_to_rupees(points);
        tracing::info!(user_id, order_id, points, discount, "BBM Bucks redeemed");
        Ok(discount)
    }

    /// Undo the redemption recorded against `order_id`
    ///
    /// Writes a REVERSED entry keyed on the order and gives the points back.
    /// Returns the points restored: zero when nothing was redeemed, the
    /// stored amount when the reversal already happened.
    pub async fn reverse_redemption(&self, user_id: &str, order_id: &str) -> ServiceResult<i64> {
        let redeemed_id = ledger_entry_id(order_id, TransactionKind::Redeemed.as_str());
        let redeemed = {
            let mut conn = self.pool.acquire().await?;
            ledger::find_by_id(&mut conn, &redeemed_id).await?
        };
        let Some(redeemed) = redeemed else {
            return Ok(0);
        };
        let redeemed = replayed_entry(Some(redeemed), &redeemed_id, user_id)?;
        let points = -redeemed.amount;

        let now = now_millis();
        let entry = LoyaltyTransaction {
            id: ledger_entry_id(order_id, TransactionKind::Reversed.as_str()),
            user_id: user_id.to_string(),
            order_id: order_id.to_string(),
            kind: TransactionKind::Reversed,
            amount: points,
            order_value: 0.0,
            reward_percentage: 0.0,
            tier: None,
            expiry_date: None,
            status: TransactionStatus::Used,
            source_id: Some(redeemed_id),
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        if !ledger::insert_if_absent(&mut *tx, &entry).await? {
            tx.rollback().await?;
            tracing::info!(user_id, order_id, "Redemption already reversed");
            return Ok(points);
        }
        if !balance::refund_redemption(&mut *tx, user_id, points, now).await? {
            tx.rollback().await?;
            return Err(AppError::internal(format!(
                "Balance for {user_id} cannot absorb a {points} point reversal"
            ))
            .into());
        }
        tx.commit().await?;

        tracing::info!(user_id, order_id, points, "BBM Bucks redemption reversed");
        Ok(points)
    }

    /// ACTIVE earned entries expiring within the next `within_days` days, earliest first
    pub async fn expiring_soon(
        &self,
        user_id: &str,
        within_days: i64,
    ) -> ServiceResult<Vec<LoyaltyTransaction>> {
        let now = now_millis();
        let until = now.saturating_add(within_days.max(0).saturating_mul(DAY_MILLIS));
        let mut conn = self.pool.acquire().await?;
        Ok(ledger::find_expiring_between(&mut conn, user_id, now, until).await?)
    }

    /// Newest-first transaction history
    pub async fn history(&self, user_id: &str, limit: i64) -> ServiceResult<Vec<LoyaltyTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Ok(ledger::list_by_user(&mut conn, user_id, limit.max(0)).await?)
    }

    /// Expire every ACTIVE earned entry with `expiry_date <= now`
    ///
    /// Each entry is expired in its own transaction; a failure is logged,
    /// counted and leaves that entry ACTIVE for the next sweep.
    pub async fn expire_old(&self, now: i64) -> ServiceResult<ExpirySummary> {
        let mut summary = ExpirySummary::default();
        // Failed entries stay ACTIVE and come back in later batches
        let mut failed = HashSet::new();
        loop {
            let due = {
                let mut conn = self.pool.acquire().await?;
                ledger::find_due_for_expiry(&mut conn, now, EXPIRY_BATCH_SIZE).await?
            };
            let batch_len = due.len();

            let mut progressed = 0;
            for entry in due {
                if failed.contains(&entry.id) {
                    continue;
                }
                summary.scanned += 1;
                match self.expire_entry(&entry, now).await {
                    Ok(Some(deducted)) => {
                        summary.expired += 1;
                        summary.points_expired += deducted;
                        progressed += 1;
                    }
                    // Already expired by a concurrent sweep
                    Ok(None) => progressed += 1,
                    Err(e) => {
                        tracing::warn!(entry_id = %entry.id, user_id = %entry.user_id, error = %e, "Failed to expire BBM Bucks");
                        summary.failed += 1;
                        failed.insert(entry.id);
                    }
                }
            }

            if batch_len < EXPIRY_BATCH_SIZE as usize || progressed == 0 {
                break;
            }
        }

        if summary.scanned > 0 {
            tracing::info!(
                scanned = summary.scanned,
                expired = summary.expired,
                points = summary.points_expired,
                failed = summary.failed,
                "BBM Bucks expiry sweep finished"
            );
        }
        Ok(summary)
    }

    async fn expire_entry(&self, entry: &LoyaltyTransaction, now: i64) -> ServiceResult<Option<i64>> {
        let mut tx = self.pool.begin().await?;
        if !ledger::mark_expired(&mut *tx, &entry.id).await? {
            tx.rollback().await?;
            return Ok(None);
        }
        let deducted = balance::debit_expiry(&mut *tx, &entry.user_id, entry.amount, now).await?;
        let expired = LoyaltyTransaction {
            id: ledger_entry_id(&entry.id, TransactionKind::Expired.as_str()),
            user_id: entry.user_id.clone(),
            order_id: entry.order_id.clone(),
            kind: TransactionKind::Expired,
            amount: -deducted,
            order_value: entry.order_value,
            reward_percentage: entry.reward_percentage,
            tier: entry.tier,
            expiry_date: None,
            status: TransactionStatus::Expired,
            source_id: Some(entry.id.clone()),
            created_at: now,
        };
        ledger::insert_if_absent(&mut *tx, &expired).await?;
        tx.commit().await?;

        tracing::debug!(entry_id = %entry.id, user_id = %entry.user_id, deducted, "BBM Bucks expired");
        Ok(Some(deducted))
    }
}

fn insufficient_balance(available: i64, requested: i64) -> AppError {
    AppError::with_message(
        ErrorCode::InsufficientBalance,
        format!("Insufficient BBM Bucks: {available} available, {requested} requested"),
    )
    .with_detail("available", available)
    .with_detail("requested", requested)
}

/// The stored row behind a replayed operation, which must belong to the same user
fn replayed_entry(
    stored: Option<LoyaltyTransaction>,
    entry_id: &str,
    user_id: &str,
) -> Result<LoyaltyTransaction, AppError> {
    match stored {
        Some(entry) if entry.user_id == user_id => Ok(entry),
        Some(entry) => {
            tracing::warn!(entry_id, user_id, owner = %entry.user_id, "Ledger entry belongs to another user");
            Err(AppError::invalid_request("Order is already linked to another account"))
        }
        None => Err(AppError::internal(format!("Ledger entry {entry_id} vanished"))),
    }
}

#[async_trait]
impl LoyaltyService for LoyaltyLedger {
    async fn get_user_balance(&self, user_id: &str) -> ServiceResult<UserBalance> {
        LoyaltyLedger::get_user_balance(self, user_id).await
    }

    async fn award(
        &self,
        user_id: &str,
        order_id: &str,
        order_amount: f64,
        categories: &[String],
    ) -> ServiceResult<Reward> {
        LoyaltyLedger::award(self, user_id, order_id, order_amount, categories).await
    }

    async fn redeem(&self, user_id: &str, points: i64, order_id: &str) -> ServiceResult<f64> {
        LoyaltyLedger::redeem(self, user_id, points, order_id).await
    }

    async fn reverse_redemption(&self, user_id: &str, order_id: &str) -> ServiceResult<i64> {
        LoyaltyLedger::reverse_redemption(self, user_id, order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::LoyaltyTier;

    async fn ledger() -> LoyaltyLedger {
        LoyaltyLedger::new(DbService::in_memory().await.unwrap().pool)
    }

    #[tokio::test]
    async fn test_award_creates_balance_and_entry() {
        let ledger = ledger().await;

        let reward = ledger.award("u1", "ORD-1", 30_000.0, &["TOOLS"]).await.unwrap();
        assert_eq!(reward.points, 45_000);

        let balance = ledger.get_user_balance("u1").await.unwrap();
        assert_eq!(balance.current_balance, 45_000);
        assert_eq!(balance.tier, Some(LoyaltyTier::Premium));
        assert!(balance.is_consistent());

        let history = ledger.history("u1", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "ORD-1:EARNED");
        assert_eq!(history[0].status, TransactionStatus::Active);
        let expiry = history[0].expiry_date.unwrap();
        assert_eq!(expiry - history[0].created_at, 360 * DAY_MILLIS);
    }

    #[tokio::test]
    async fn test_award_replay_is_idempotent() {
        let ledger = ledger().await;

        let first = ledger.award("u1", "ORD-1", 1000.0, &["TOOLS"]).await.unwrap();
        let second = ledger.award("u1", "ORD-1", 1000.0, &["TOOLS"]).await.unwrap();
        assert_eq!(first.points, second.points);

        let balance = ledger.get_user_balance("u1").await.unwrap();
        assert_eq!(balance.current_balance, 1000);
        assert_eq!(ledger.history("u1", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_reward_writes_nothing() {
        let ledger = ledger().await;

        let reward = ledger.award("u1", "ORD-1", 5000.0, &["Gift Card"]).await.unwrap();
        assert!(reward.is_zero());
        assert!(ledger.history("u1", 10).await.unwrap().is_empty());
        assert_eq!(ledger.get_user_balance("u1").await.unwrap(), UserBalance::empty("u1"));
    }

    #[tokio::test]
    async fn test_redeem_rules() {
        let ledger = ledger().await;
        ledger.award("u1", "ORD-1", 10_000.0, &["TOOLS"]).await.unwrap();

        let err = ledger.redeem("u1", 49, "ORD-2").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MinimumRedemption);
        assert!(AppError::from(err).message.contains("₹0.50"));

        let err = ledger.redeem("u1", 10_001, "ORD-2").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientBalance);

        let discount = ledger.redeem("u1", 5_000, "ORD-2").await.unwrap();
        assert_eq!(discount, 50.0);

        // Retry of the same order does not charge twice
        let discount = ledger.redeem("u1", 5_000, "ORD-2").await.unwrap();
        assert_eq!(discount, 50.0);

        let balance = ledger.get_user_balance("u1").await.unwrap();
        assert_eq!(balance.current_balance, 5_000);
        assert_eq!(balance.total_redeemed, 5_000);
        assert!(balance.is_consistent());
    }

    #[tokio::test]
    async fn test_reverse_redemption_gives_points_back() {
        let ledger = ledger().await;
        ledger.award("u1", "ORD-1", 10_000.0, &["TOOLS"]).await.unwrap();
        ledger.redeem("u1", 4_000, "CHK-1").await.unwrap();

        assert_eq!(ledger.reverse_redemption("u1", "CHK-1").await.unwrap(), 4_000);
        // Second call finds the REVERSED row and changes nothing
        assert_eq!(ledger.reverse_redemption("u1", "CHK-1").await.unwrap(), 4_000);
        // Nothing was redeemed against this one
        assert_eq!(ledger.reverse_redemption("u1", "CHK-2").await.unwrap(), 0);

        let balance = ledger.get_user_balance("u1").await.unwrap();
        assert_eq!(balance.current_balance, 10_000);
        assert_eq!(balance.total_redeemed, 0);
        assert!(balance.is_consistent());

        let history = ledger.history("u1", 10).await.unwrap();
        assert_eq!(history.len(), 3);
        let reversed = history
            .iter()
            .find(|t| t.kind == TransactionKind::Reversed)
            .unwrap();
        assert_eq!(reversed.amount, 4_000);
        assert_eq!(reversed.source_id.as_deref(), Some("CHK-1:REDEEMED"));

        let err = ledger.reverse_redemption("u2", "CHK-1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_expire_old_deducts_and_records() {
        let ledger = ledger().await;
        ledger.award("u1", "ORD-1", 10_000.0, &["TOOLS"]).await.unwrap();
        ledger.redeem("u1", 4_000, "ORD-2").await.unwrap();

        let far_future = now_millis() + 400 * DAY_MILLIS;
        let summary = ledger.expire_old(far_future).await.unwrap();
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.points_expired, 6_000);
        assert_eq!(summary.failed, 0);

        let balance = ledger.get_user_balance("u1").await.unwrap();
        assert_eq!(balance.current_balance, 0);
        assert_eq!(balance.total_expired, 6_000);
        assert!(balance.is_consistent());

        let history = ledger.history("u1", 10).await.unwrap();
        let expired = history
            .iter()
            .find(|t| t.kind == TransactionKind::Expired)
            .unwrap();
        assert_eq!(expired.amount, -6_000);
        assert_eq!(expired.source_id.as_deref(), Some("ORD-1:EARNED"));

        // Nothing left to sweep
        let again = ledger.expire_old(far_future).await.unwrap();
        assert_eq!(again, ExpirySummary::default());
    }

    #[tokio::test]
    async fn test_failed_entry_counted_once_across_batches() {
        let ledger = ledger().await;
        for n in 0..EXPIRY_BATCH_SIZE {
            ledger.award("u1", &format!("ORD-{n}"), 1000.0, &["TOOLS"]).await.unwrap();
        }
        ledger.award("u2", "BAD", 1000.0, &["TOOLS"]).await.unwrap();

        // Earliest expiry, so it leads the first batch and is refetched by the second
        sqlx::query("UPDATE loyalty_transaction SET expiry_date = 1 WHERE id = 'BAD:EARNED'")
            .execute(&ledger.pool)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TRIGGER block_bad_expiry BEFORE UPDATE OF status ON loyalty_transaction \
             WHEN OLD.id = 'BAD:EARNED' BEGIN SELECT RAISE(ABORT, 'entry locked'); END",
        )
        .execute(&ledger.pool)
        .await
        .unwrap();

        let far_future = now_millis() + 400 * DAY_MILLIS;
        let summary = ledger.expire_old(far_future).await.unwrap();
        assert_eq!(summary.scanned, EXPIRY_BATCH_SIZE as usize + 1);
        assert_eq!(summary.expired, EXPIRY_BATCH_SIZE as usize);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.points_expired, EXPIRY_BATCH_SIZE * 1000);

        let stuck = ledger.get_user_balance("u2").await.unwrap();
        assert_eq!(stuck.current_balance, 1000);
        assert!(stuck.is_consistent());
    }

    #[tokio::test]
    async fn test_expiring_soon_window() {
        let ledger = ledger().await;
        ledger.award("u1", "ORD-1", 1000.0, &["TOOLS"]).await.unwrap();

        assert!(ledger.expiring_soon("u1", 30).await.unwrap().is_empty());
        let soon = ledger.expiring_soon("u1", 361).await.unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].order_id, "ORD-1");
    }
}
