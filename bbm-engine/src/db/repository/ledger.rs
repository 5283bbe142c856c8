//! Loyalty Transaction Repository
//!
//! Append-only ledger. The only in-place change is ACTIVE → EXPIRED on
//! EARNED entries.

use super::RepoResult;
use shared::models::LoyaltyTransaction;
use sqlx::SqliteConnection;

const TRANSACTION_SELECT: &str = "SELECT id, user_id, order_id, kind, amount, order_value, reward_percentage, tier, expiry_date, status, source_id, created_at FROM loyalty_transaction";

/// Insert the entry unless one with the same ID exists
///
/// Returns `false` when the ID was already present (replayed operation).
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    entry: &LoyaltyTransaction,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "INSERT INTO loyalty_transaction (id, user_id, order_id, kind, amount, order_value, reward_percentage, tier, expiry_date, status, source_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(&entry.id)
    .bind(&entry.user_id)
    .bind(&entry.order_id)
    .bind(entry.kind)
    .bind(entry.amount)
    .bind(entry.order_value)
    .bind(entry.reward_percentage)
    .bind(entry.tier)
    .bind(entry.expiry_date)
    .bind(entry.status)
    .bind(&entry.source_id)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> RepoResult<Option<LoyaltyTransaction>> {
    let sql = format!("{TRANSACTION_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Newest first
pub async fn list_by_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    limit: i64,
) -> RepoResult<Vec<LoyaltyTransaction>> {
    let sql = format!("{TRANSACTION_SELECT} WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?");
    let rows = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// ACTIVE EARNED entries with `expiry_date <= now`, oldest expiry first
pub async fn find_due_for_expiry(
    conn: &mut SqliteConnection,
    now: i64,
    limit: i64,
) -> RepoResult<Vec<LoyaltyTransaction>> {
    let sql = format!(
        "{TRANSACTION_SELECT} WHERE kind = 'EARNED' AND status = 'ACTIVE' AND expiry_date <= ? ORDER BY expiry_date ASC LIMIT ?"
    );
    let rows = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
        .bind(now)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// ACTIVE EARNED entries of one user expiring in `(after, until]`, earliest first
pub async fn find_expiring_between(
    conn: &mut SqliteConnection,
    user_id: &str,
    after: i64,
    until: i64,
) -> RepoResult<Vec<LoyaltyTransaction>> {
    let sql = format!(
        "{TRANSACTION_SELECT} WHERE user_id = ? AND kind = 'EARNED' AND status = 'ACTIVE' AND expiry_date > ? AND expiry_date <= ? ORDER BY expiry_date ASC"
    );
    let rows = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
        .bind(user_id)
        .bind(after)
        .bind(until)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// ACTIVE → EXPIRED; `false` if the entry was no longer ACTIVE
pub async fn mark_expired(conn: &mut SqliteConnection, id: &str) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE loyalty_transaction SET status = 'EXPIRED' WHERE id = ? AND status = 'ACTIVE'",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;
    use shared::models::{LoyaltyTier, TransactionKind, TransactionStatus};

    fn earned(order_id: &str, amount: i64, created_at: i64, expiry: i64) -> LoyaltyTransaction {
        LoyaltyTransaction {
            id: shared::util::ledger_entry_id(order_id, TransactionKind::Earned.as_str()),
            user_id: "u1".to_string(),
            order_id: order_id.to_string(),
            kind: TransactionKind::Earned,
            amount,
            order_value: 1000.0,
            reward_percentage: 1.0,
            tier: Some(LoyaltyTier::Standard),
            expiry_date: Some(expiry),
            status: TransactionStatus::Active,
            source_id: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_by_id() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let entry = earned("ORD-1", 1000, 1, 100);
        assert!(insert_if_absent(&mut conn, &entry).await.unwrap());
        assert!(!insert_if_absent(&mut conn, &entry).await.unwrap());

        let stored = find_by_id(&mut conn, &entry.id).await.unwrap().unwrap();
        assert_eq!(stored, entry);
    }

    #[tokio::test]
    async fn test_expiry_queries() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        insert_if_absent(&mut conn, &earned("A", 10, 1, 100)).await.unwrap();
        insert_if_absent(&mut conn, &earned("B", 20, 2, 200)).await.unwrap();
        insert_if_absent(&mut conn, &earned("C", 30, 3, 300)).await.unwrap();

        let due = find_due_for_expiry(&mut conn, 200, 100).await.unwrap();
        let ids: Vec<&str> = due.iter().map(|t| t.order_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        let soon = find_expiring_between(&mut conn, "u1", 100, 300).await.unwrap();
        let ids: Vec<&str> = soon.iter().map(|t| t.order_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);

        assert!(mark_expired(&mut conn, "A:EARNED").await.unwrap());
        assert!(!mark_expired(&mut conn, "A:EARNED").await.unwrap());
        assert_eq!(find_due_for_expiry(&mut conn, 200, 100).await.unwrap().len(), 1);

        let history = list_by_user(&mut conn, "u1", 2).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|t| t.order_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B"]);
    }
}
