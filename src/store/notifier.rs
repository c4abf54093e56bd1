//! Notification dispatch and the per-user notification feed.
//!
//! Dispatch is fire-and-forget: a failure to record or publish is logged and
//! never propagates into the order or payment operation that raised the
//! event.

use sqlx::PgPool;
use uuid::Uuid;

use super::{page_limits, Store};
use crate::domain::events::{Notification, NotificationFilters, OrderEvent};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct Notifier {
    db: PgPool,
    nats: Option<async_nats::Client>,
}

impl Notifier {
    pub fn new(db: PgPool, nats: Option<async_nats::Client>) -> Self {
        Self { db, nats }
    }

    /// Records the event as a user notification and publishes it when a NATS
    /// client is configured.
    pub async fn notify(&self, user_id: Uuid, event: &OrderEvent) {
        if let Err(e) = self.record(user_id, event).await {
            tracing::warn!(error = %e, subject = event.subject(), "failed to record notification");
        }
        if let Some(nats) = &self.nats {
            match serde_json::to_vec(event) {
                Ok(payload) => {
                    if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
                        tracing::warn!(error = %e, subject = event.subject(), "failed to publish event");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode event"),
            }
        }
    }

    async fn record(&self, user_id: Uuid, event: &OrderEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, notification_type, message) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(event.notification_type())
        .bind(event.message())
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

impl Store {
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        filters: &NotificationFilters,
    ) -> Result<(Vec<Notification>, i64, u32)> {
        let (page, limit, offset) = page_limits(filters.page, filters.per_page);
        let unread_only = filters.unread_only.unwrap_or(false);

        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR read = FALSE) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR read = FALSE)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.db)
        .await?;

        Ok((notifications, total, page))
    }

    pub async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound("notification not found".into()))
    }
}
