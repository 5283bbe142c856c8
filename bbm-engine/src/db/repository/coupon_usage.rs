//! Per-user Coupon Usage Repository

use super::RepoResult;
use shared::models::UserCouponUsage;
use sqlx::SqliteConnection;

pub async fn find(
    conn: &mut SqliteConnection,
    coupon_id: &str,
    user_id: &str,
) -> RepoResult<Option<UserCouponUsage>> {
    let row = sqlx::query_as::<_, UserCouponUsage>(
        "SELECT coupon_id, user_id, usage_count, last_used, order_numbers FROM user_coupon_usage WHERE coupon_id = ? AND user_id = ?",
    )
    .bind(coupon_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Times `user_id` has used `coupon_id` (0 when never)
pub async fn count(conn: &mut SqliteConnection, coupon_id: &str, user_id: &str) -> RepoResult<i64> {
    Ok(find(conn, coupon_id, user_id)
        .await?
        .map_or(0, |usage| usage.usage_count))
}

/// Create or bump the usage record, appending `order_number`
pub async fn record(
    conn: &mut SqliteConnection,
    coupon_id: &str,
    user_id: &str,
    order_number: &str,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO user_coupon_usage (coupon_id, user_id, usage_count, last_used, order_numbers) \
         VALUES (?1, ?2, 1, ?3, json_array(?4)) \
         ON CONFLICT (coupon_id, user_id) DO UPDATE SET \
             usage_count = usage_count + 1, \
             last_used = excluded.last_used, \
             order_numbers = json_insert(order_numbers, '$[#]', ?4)",
    )
    .bind(coupon_id)
    .bind(user_id)
    .bind(now)
    .bind(order_number)
    .execute(conn)
    .await?;
    Ok(())
}
