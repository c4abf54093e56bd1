//! Payment persistence. Settlement flips payment and order state with
//! conditional updates in one transaction, so a second attempt against the
//! same order conflicts instead of double-settling.

use sqlx::QueryBuilder;
use uuid::Uuid;

use super::{page_limits, Store};
use crate::domain::aggregates::order::OrderStatus;
use crate::domain::aggregates::payment::{Payment, PaymentFilters, PaymentStatus, ProcessPaymentRequest};
use crate::error::{Error, Result};
use crate::gateway::PaymentGateway;

impl Store {
    /// Records a PENDING payment for the caller's order, authorizes it
    /// through the gateway, then settles payment and order together. The
    /// PENDING row outlives a failed authorization so it can be cancelled.
    pub async fn process_payment(
        &self,
        user_id: Uuid,
        req: &ProcessPaymentRequest,
        gateway: &dyn PaymentGateway,
    ) -> Result<Payment> {
        let order = self.get_order(req.order_id).await?;
        if order.user_id != user_id {
            return Err(Error::Forbidden("the order does not belong to the caller".into()));
        }

        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, order_id, user_id, amount, method, status, payment_details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(user_id)
        .bind(order.total_amount)
        .bind(req.payment_method)
        .bind(PaymentStatus::Pending)
        .bind(&req.payment_details)
        .fetch_one(&self.db)
        .await?;

        let receipt = gateway
            .authorize(order.total_amount, &order.currency, &req.payment_details)
            .await?;

        let mut tx = self.db.begin().await?;
        let settled = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3",
        )
        .bind(order.id)
        .bind(OrderStatus::Paid)
        .bind(OrderStatus::Pending)
        .execute(&mut *tx)
        .await?;
        if settled.rows_affected() == 0 {
            return Err(Error::Conflict("the order has already been settled or is not payable".into()));
        }

        let completed = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, \
                    payment_details = payment_details || $3, \
                    updated_at = NOW() \
             WHERE id = $1 AND status = $4 RETURNING *",
        )
        .bind(payment.id)
        .bind(PaymentStatus::Completed)
        .bind(serde_json::json!({ "gatewayReference": receipt.reference }))
        .bind(PaymentStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Conflict("the payment is no longer pending".into()))?;

        tx.commit().await?;
        Ok(completed)
    }

    pub async fn get_payment(&self, payment_id: Uuid, user_id: Uuid) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound(format!("payment {payment_id} not found")))?;
        if payment.user_id != user_id {
            return Err(Error::Forbidden("the payment does not belong to the caller".into()));
        }
        Ok(payment)
    }

    pub async fn cancel_payment(&self, payment_id: Uuid, user_id: Uuid) -> Result<Payment> {
        let payment = self.get_payment(payment_id, user_id).await?;
        if !payment.status.can_cancel() {
            return Err(Error::Conflict("only pending payments can be cancelled".into()));
        }
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3 RETURNING *",
        )
        .bind(payment_id)
        .bind(PaymentStatus::Cancelled)
        .bind(PaymentStatus::Pending)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::Conflict("only pending payments can be cancelled".into()))
    }

    pub async fn refund_payment(&self, payment_id: Uuid, reason: &str) -> Result<Payment> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(&self.db)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("payment {payment_id} not found")));
        }
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, refund_reason = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $4 RETURNING *",
        )
        .bind(payment_id)
        .bind(PaymentStatus::Refunded)
        .bind(reason)
        .bind(PaymentStatus::Completed)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::Conflict("only completed payments can be refunded".into()))
    }

    pub async fn list_payments(&self, filters: &PaymentFilters) -> Result<(Vec<Payment>, i64, u32)> {
        let (page, limit, offset) = page_limits(filters.page, filters.per_page);

        let push_filters = |qb: &mut QueryBuilder<'_, sqlx::Postgres>| {
            if let Some(status) = filters.status {
                qb.push(" AND status = ").push_bind(status);
            }
            if let Some(from) = filters.start_date {
                qb.push(" AND created_at >= ").push_bind(from);
            }
            if let Some(to) = filters.end_date {
                qb.push(" AND created_at <= ").push_bind(to);
            }
        };

        let mut qb = QueryBuilder::new("SELECT * FROM payments WHERE TRUE");
        push_filters(&mut qb);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let payments = qb.build_query_as::<Payment>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM payments WHERE TRUE");
        push_filters(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok((payments, total, page))
    }
}
