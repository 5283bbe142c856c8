//! Coupon Repository

use super::{RepoError, RepoResult};
use shared::models::Coupon;
use sqlx::SqliteConnection;
use sqlx::types::Json;

const COUPON_SELECT: &str = "SELECT id, code, description, discount_type, discount_value, max_discount, min_order_amount, max_order_amount, applicable_categories, excluded_categories, specific_users, usage_limit, usage_count, usage_limit_per_user, valid_from, valid_until, is_active, created_at, updated_at FROM coupon";

/// Case-insensitive lookup on the trimmed code
pub async fn find_by_code(conn: &mut SqliteConnection, code: &str) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE code = ? COLLATE NOCASE");
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(code.trim())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Active coupons, soonest expiry first (open-ended last)
pub async fn find_active(conn: &mut SqliteConnection) -> RepoResult<Vec<Coupon>> {
    let sql = format!(
        "{COUPON_SELECT} WHERE is_active = 1 ORDER BY valid_until IS NULL, valid_until ASC, code ASC"
    );
    let rows = sqlx::query_as::<_, Coupon>(&sql).fetch_all(conn).await?;
    Ok(rows)
}

/// Insert a coupon; the code is stored trimmed and uppercase
pub async fn create(conn: &mut SqliteConnection, coupon: &Coupon) -> RepoResult<Coupon> {
    let code = coupon.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(RepoError::Validation("coupon code must not be empty".into()));
    }
    sqlx::query(
        "INSERT INTO coupon (id, code, description, discount_type, discount_value, max_discount, min_order_amount, max_order_amount, applicable_categories, excluded_categories, specific_users, usage_limit, usage_count, usage_limit_per_user, valid_from, valid_until, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
    )
    .bind(&coupon.id)
    .bind(&code)
    .bind(&coupon.description)
    .bind(coupon.discount_type)
    .bind(coupon.discount_value)
    .bind(coupon.max_discount)
    .bind(coupon.min_order_amount)
    .bind(coupon.max_order_amount)
    .bind(Json(&coupon.applicable_categories))
    .bind(Json(&coupon.excluded_categories))
    .bind(Json(&coupon.specific_users))
    .bind(coupon.usage_limit)
    .bind(coupon.usage_count)
    .bind(coupon.usage_limit_per_user)
    .bind(coupon.valid_from)
    .bind(coupon.valid_until)
    .bind(coupon.is_active)
    .bind(coupon.created_at)
    .bind(coupon.updated_at)
    .execute(&mut *conn)
    .await?;
    find_by_id(conn, &coupon.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create coupon".into()))
}

/// Increment the global usage counter unless the limit is already reached
///
/// Returns `false` when the limit blocked the increment.
pub async fn increment_usage(conn: &mut SqliteConnection, id: &str, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE coupon SET usage_count = usage_count + 1, updated_at = ? \
         WHERE id = ? AND (usage_limit IS NULL OR usage_count < usage_limit)",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        return Ok(true);
    }
    if find_by_id(conn, id).await?.is_none() {
        return Err(RepoError::NotFound(format!("Coupon {id} not found")));
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;
    use shared::models::DiscountType;

    fn coupon(id: &str, code: &str) -> Coupon {
        Coupon {
            id: id.to_string(),
            code: code.to_string(),
            description: Some("10% off tools".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            max_discount: Some(500.0),
            min_order_amount: None,
            max_order_amount: None,
            applicable_categories: vec!["TOOLS".to_string()],
            excluded_categories: vec![],
            specific_users: vec![],
            usage_limit: Some(100),
            usage_count: 0,
            usage_limit_per_user: None,
            valid_from: None,
            valid_until: None,
            is_active: true,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_case_insensitive() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let created = create(&mut conn, &coupon("c1", " tools10 ")).await.unwrap();
        assert_eq!(created.code, "TOOLS10");
        assert_eq!(created.applicable_categories, vec!["TOOLS"]);
        assert_eq!(created.max_discount, Some(500.0));

        let found = find_by_code(&mut conn, "  Tools10").await.unwrap().unwrap();
        assert_eq!(found.id, "c1");
        assert!(find_by_code(&mut conn, "TOOLS1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        create(&mut conn, &coupon("c1", "SAVE")).await.unwrap();
        let err = create(&mut conn, &coupon("c2", "save")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_increment_usage() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        create(&mut conn, &coupon("c1", "SAVE")).await.unwrap();
        assert!(increment_usage(&mut conn, "c1", 5).await.unwrap());
        let found = find_by_id(&mut conn, "c1").await.unwrap().unwrap();
        assert_eq!(found.usage_count, 1);
        assert_eq!(found.updated_at, 5);

        let err = increment_usage(&mut conn, "missing", 5).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_increment_usage_stops_at_limit() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut limited = coupon("c1", "ONCE");
        limited.usage_limit = Some(1);
        create(&mut conn, &limited).await.unwrap();

        assert!(increment_usage(&mut conn, "c1", 5).await.unwrap());
        assert!(!increment_usage(&mut conn, "c1", 6).await.unwrap());

        let found = find_by_id(&mut conn, "c1").await.unwrap().unwrap();
        assert_eq!(found.usage_count, 1);
        assert_eq!(found.updated_at, 5);
    }
}
