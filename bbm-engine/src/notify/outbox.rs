//! Mail outbox notifier
//!
//! Writes confirmations to the `mail` table; an external worker delivers them.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::OrderConfirmation;
use crate::checkout::{CollaboratorResult, OrderNotifier};
use crate::db::repository::mail;

#[derive(Clone)]
pub struct MailOutbox {
    pool: SqlitePool,
}

impl MailOutbox {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderNotifier for MailOutbox {
    async fn send_confirmation(&self, confirmation: &OrderConfirmation) -> CollaboratorResult<()> {
        let mut conn = self.pool.acquire().await?;
        let id = mail::insert(
            &mut conn,
            &confirmation.recipient,
            &confirmation.subject,
            &confirmation.template,
            &confirmation.metadata,
        )
        .await?;
        tracing::debug!(mail_id = id, template = %confirmation.template, "Confirmation queued");
        Ok(())
    }
}
