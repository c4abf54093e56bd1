//! Order lifecycle events and the notification records they produce.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::order::OrderStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[sqlx(rename = "ORDER_CREATED")]
    OrderCreated,
    #[sqlx(rename = "ORDER_PAID")]
    OrderPaid,
    #[sqlx(rename = "ORDER_STATUS_UPDATE")]
    OrderStatusUpdate,
    #[sqlx(rename = "TRAVEL_REMINDER")]
    TravelReminder,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, order_number: String, total_amount: Decimal, currency: String },
    Paid { order_id: Uuid, order_number: String },
    StatusChanged { order_id: Uuid, order_number: String, status: OrderStatus },
    Cancelled { order_id: Uuid, order_number: String },
}

impl OrderEvent {
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::Created { .. } => NotificationType::OrderCreated,
            Self::Paid { .. } => NotificationType::OrderPaid,
            Self::StatusChanged { .. } | Self::Cancelled { .. } => NotificationType::OrderStatusUpdate,
        }
    }

    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "orders.created",
            Self::Paid { .. } => "orders.paid",
            Self::StatusChanged { .. } => "orders.status",
            Self::Cancelled { .. } => "orders.cancelled",
        }
    }

    /// User-facing notification message.
    pub fn message(&self) -> String {
        match self {
            Self::Created { order_number, total_amount, currency, .. } => format!(
                "Your order #{order_number} has been created. Total: {total_amount} {currency}"
            ),
            Self::Paid { order_number, .. } => format!(
                "Payment for your order #{order_number} has been confirmed. Thank you for your purchase!"
            ),
            Self::StatusChanged { order_number, status, .. } => format!(
                "The status of your order #{order_number} changed to {status}"
            ),
            Self::Cancelled { order_number, .. } => {
                format!("Your order #{order_number} has been cancelled")
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilters {
    pub unread_only: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_notification_types() {
        let created = OrderEvent::Created {
            order_id: Uuid::new_v4(),
            order_number: "ORD-00000001".into(),
            total_amount: dec!(176),
            currency: "USD".into(),
        };
        assert_eq!(created.notification_type(), NotificationType::OrderCreated);
        assert_eq!(created.subject(), "orders.created");
        assert!(created.message().contains("ORD-00000001"));
        assert!(created.message().contains("176 USD"));
    }

    #[test]
    fn test_status_change_message() {
        let event = OrderEvent::StatusChanged {
            order_id: Uuid::new_v4(),
            order_number: "ORD-00000002".into(),
            status: OrderStatus::Confirmed,
        };
        assert_eq!(event.notification_type(), NotificationType::OrderStatusUpdate);
        assert!(event.message().contains("CONFIRMED"));
    }
}
