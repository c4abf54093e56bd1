//! Payments: one settlement attempt against an order, owned by the order's
//! user. Amount is copied from the order total at creation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sqlx(rename = "CREDIT_CARD")]
    CreditCard,
    #[sqlx(rename = "DEBIT_CARD")]
    DebitCard,
    #[sqlx(rename = "BANK_TRANSFER")]
    BankTransfer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PaymentStatus { Pending, Completed, Cancelled, Refunded }

impl PaymentStatus {
    /// Only a pending payment can be cancelled.
    pub fn can_cancel(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Only a completed payment can be refunded.
    pub fn can_refund(self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_details: serde_json::Value,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_details: serde_json::Value,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentRequest {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilters {
    pub status: Option<PaymentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_only_from_pending() {
        assert!(PaymentStatus::Pending.can_cancel());
        assert!(!PaymentStatus::Completed.can_cancel());
        assert!(!PaymentStatus::Cancelled.can_cancel());
        assert!(!PaymentStatus::Refunded.can_cancel());
    }

    #[test]
    fn test_refund_only_from_completed() {
        assert!(PaymentStatus::Completed.can_refund());
        assert!(!PaymentStatus::Pending.can_refund());
        assert!(!PaymentStatus::Refunded.can_refund());
    }
}
