//! User Balance Repository

use super::RepoResult;
use shared::models::{LoyaltyTier, UserBalance};
use sqlx::SqliteConnection;

const BALANCE_SELECT: &str = "SELECT user_id, current_balance, total_earned, total_redeemed, total_expired, lifetime_balance, tier, created_at, updated_at FROM user_balance";

pub async fn find(conn: &mut SqliteConnection, user_id: &str) -> RepoResult<Option<UserBalance>> {
    let sql = format!("{BALANCE_SELECT} WHERE user_id = ?");
    let row = sqlx::query_as::<_, UserBalance>(&sql)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Create the balance or add `points` to it, recording the award tier
pub async fn credit(
    conn: &mut SqliteConnection,
    user_id: &str,
    points: i64,
    tier: Option<LoyaltyTier>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO user_balance (user_id, current_balance, total_earned, total_redeemed, total_expired, lifetime_balance, tier, created_at, updated_at) \
         VALUES (?1, ?2, ?2, 0, 0, ?2, ?3, ?4, ?4) \
         ON CONFLICT (user_id) DO UPDATE SET \
             current_balance = current_balance + excluded.current_balance, \
             total_earned = total_earned + excluded.total_earned, \
             lifetime_balance = lifetime_balance + excluded.lifetime_balance, \
             tier = excluded.tier, \
             updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(points)
    .bind(tier)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Deduct a redemption only if the balance still covers it
///
/// Returns `false` (nothing written) when the balance is missing or too low.
pub async fn debit_redemption(
    conn: &mut SqliteConnection,
    user_id: &str,
    points: i64,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE user_balance SET current_balance = current_balance - ?1, total_redeemed = total_redeemed + ?1, updated_at = ?2 \
         WHERE user_id = ?3 AND current_balance >= ?1",
    )
    .bind(points)
    .bind(now)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Give back a redemption: the inverse of [`debit_redemption`]
///
/// Returns `false` when there is no balance or it never redeemed that much.
pub async fn refund_redemption(
    conn: &mut SqliteConnection,
    user_id: &str,
    points: i64,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE user_balance SET current_balance = current_balance + ?1, total_redeemed = total_redeemed - ?1, updated_at = ?2 \
         WHERE user_id = ?3 AND total_redeemed >= ?1",
    )
    .bind(points)
    .bind(now)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Deduct expiring points, clamped so the balance never goes negative
///
/// Returns the number of points actually deducted. Must run inside the
/// transaction that owns the row.
pub async fn debit_expiry(
    conn: &mut SqliteConnection,
    user_id: &str,
    points: i64,
    now: i64,
) -> RepoResult<i64> {
    let current: Option<(i64,)> =
        sqlx::query_as("SELECT current_balance FROM user_balance WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((current,)) = current else {
        return Ok(0);
    };
    let deducted = points.min(current).max(0);
    if deducted == 0 {
        return Ok(0);
    }
    sqlx::query(
        "UPDATE user_balance SET current_balance = current_balance - ?1, total_expired = total_expired + ?1, updated_at = ?2 \
         WHERE user_id = ?3",
    )
    .bind(deducted)
    .bind(now)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(deducted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;

    #[tokio::test]
    async fn test_credit_creates_then_increments() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(find(&mut conn, "u1").await.unwrap().is_none());

        credit(&mut conn, "u1", 100, Some(LoyaltyTier::Standard), 1).await.unwrap();
        credit(&mut conn, "u1", 450, Some(LoyaltyTier::Premium), 2).await.unwrap();

        let balance = find(&mut conn, "u1").await.unwrap().unwrap();
        assert_eq!(balance.current_balance, 550);
        assert_eq!(balance.total_earned, 550);
        assert_eq!(balance.lifetime_balance, 550);
        assert_eq!(balance.tier, Some(LoyaltyTier::Premium));
        assert_eq!(balance.created_at, 1);
        assert_eq!(balance.updated_at, 2);
        assert!(balance.is_consistent());
    }

    #[tokio::test]
    async fn test_debit_redemption_is_conditional() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();
        credit(&mut conn, "u1", 100, None, 1).await.unwrap();

        assert!(!debit_redemption(&mut conn, "u1", 101, 2).await.unwrap());
        assert!(!debit_redemption(&mut conn, "nobody", 1, 2).await.unwrap());
        assert!(debit_redemption(&mut conn, "u1", 100, 2).await.unwrap());

        let balance = find(&mut conn, "u1").await.unwrap().unwrap();
        assert_eq!(balance.current_balance, 0);
        assert_eq!(balance.total_redeemed, 100);
        assert!(balance.is_consistent());
    }

    #[tokio::test]
    async fn test_refund_redemption_restores_balance() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();
        credit(&mut conn, "u1", 500, None, 1).await.unwrap();
        assert!(debit_redemption(&mut conn, "u1", 200, 2).await.unwrap());

        assert!(!refund_redemption(&mut conn, "u1", 201, 3).await.unwrap());
        assert!(!refund_redemption(&mut conn, "nobody", 1, 3).await.unwrap());
        assert!(refund_redemption(&mut conn, "u1", 200, 3).await.unwrap());

        let balance = find(&mut conn, "u1").await.unwrap().unwrap();
        assert_eq!(balance.current_balance, 500);
        assert_eq!(balance.total_redeemed, 0);
        assert!(balance.is_consistent());
    }

    #[tokio::test]
    async fn test_debit_expiry_clamps_at_zero() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();
        credit(&mut conn, "u1", 300, None, 1).await.unwrap();
        assert!(debit_redemption(&mut conn, "u1", 200, 2).await.unwrap());

        assert_eq!(debit_expiry(&mut conn, "u1", 300, 3).await.unwrap(), 100);
        assert_eq!(debit_expiry(&mut conn, "nobody", 300, 3).await.unwrap(), 0);

        let balance = find(&mut conn, "u1").await.unwrap().unwrap();
        assert_eq!(balance.current_balance, 0);
        assert_eq!(balance.total_expired, 100);
        assert!(balance.is_consistent());
    }
}
