//! Mail Outbox Repository
//!
//! Rows are written PENDING; delivery happens outside this process.

use super::RepoResult;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use sqlx::types::Json;
use std::collections::BTreeMap;

/// Outbox row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct MailRecord {
    pub id: i64,
    pub recipient: String,
    pub subject: String,
    pub template: String,
    #[sqlx(json)]
    pub metadata: BTreeMap<String, String>,
    pub status: String,
    pub created_at: i64,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    recipient: &str,
    subject: &str,
    template: &str,
    metadata: &BTreeMap<String, String>,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO mail (id, recipient, subject, template, metadata, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 'PENDING', ?6)",
    )
    .bind(id)
    .bind(recipient)
    .bind(subject)
    .bind(template)
    .bind(Json(metadata))
    .bind(now)
    .execute(conn)
    .await?;
    Ok(id)
}

/// Oldest first
pub async fn list_pending(conn: &mut SqliteConnection, limit: i64) -> RepoResult<Vec<MailRecord>> {
    let rows = sqlx::query_as::<_, MailRecord>(
        "SELECT id, recipient, subject, template, metadata, status, created_at FROM mail WHERE status = 'PENDING' ORDER BY created_at ASC, id ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
