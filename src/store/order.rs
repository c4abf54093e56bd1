//! Checkout and order queries. Order creation is all-or-nothing: the order
//! row, its item snapshots, and the cart clear share one transaction.

use sqlx::types::Json;
use sqlx::QueryBuilder;
use uuid::Uuid;

use super::{page_limits, Store};
use crate::domain::aggregates::cart::{self, CartSummary};
use crate::domain::aggregates::order::{
    generate_order_number, BillingInfo, Order, OrderAdminRow, OrderFilters, OrderItemDetail,
    OrderStatus, OrderWithDetails, UserSummary,
};
use crate::domain::aggregates::payment::Payment;
use crate::error::{Error, Result};

fn is_unique_violation(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::Database(db)) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

fn push_order_filters(qb: &mut QueryBuilder<'_, sqlx::Postgres>, filters: &OrderFilters) {
    if let Some(status) = filters.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(user_id) = filters.user_id {
        qb.push(" AND o.user_id = ").push_bind(user_id);
    }
    if let Some(from) = filters.date_from {
        qb.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(to) = filters.date_to {
        qb.push(" AND o.created_at <= ").push_bind(to);
    }
}

impl Store {
    /// Turns the caller's validated cart into a PENDING order. The cart must
    /// be re-validated immediately before this call; prices are snapshotted
    /// from the lines fetched here, and the cart is cleared in the same
    /// transaction as the inserts.
    pub async fn create_order_from_cart(&self, user_id: Uuid, billing: &BillingInfo) -> Result<Order> {
        let lines = self.cart_lines(user_id).await?;
        cart::validate_for_checkout(&lines)?;
        let summary = cart::summarize(lines);

        // Order numbers collide about never; retry a couple of times anyway.
        let mut attempts = 0;
        loop {
            attempts += 1;
            let order_number = generate_order_number();
            match self.try_create_order(user_id, &order_number, &summary, billing).await {
                Err(err) if is_unique_violation(&err) && attempts < 3 => continue,
                other => return other,
            }
        }
    }

    async fn try_create_order(
        &self,
        user_id: Uuid,
        order_number: &str,
        summary: &CartSummary,
        billing: &BillingInfo,
    ) -> Result<Order> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, order_number, user_id, status, total_amount, currency, billing_info) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order_number)
        .bind(user_id)
        .bind(OrderStatus::Pending)
        .bind(summary.total_amount)
        .bind(&summary.currency)
        .bind(Json(billing))
        .fetch_one(&mut *tx)
        .await?;

        for line in &summary.items {
            sqlx::query(
                "INSERT INTO order_items \
                    (id, order_id, product_id, package_id, quantity, unit_price, total_price) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::now_v7())
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.package_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound(format!("order {order_id} not found")))
    }

    pub async fn order_with_details(&self, order_id: Uuid) -> Result<OrderWithDetails> {
        let order = self.get_order(order_id).await?;
        self.hydrate_order(order).await
    }

    pub async fn order_by_number(&self, order_number: &str) -> Result<OrderWithDetails> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = $1")
            .bind(order_number)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound(format!("order {order_number} not found")))?;
        self.hydrate_order(order).await
    }

    async fn hydrate_order(&self, order: Order) -> Result<OrderWithDetails> {
        // No soft-delete filter: item names must resolve for historical
        // orders even after the catalog entry is gone.
        let items = sqlx::query_as::<_, OrderItemDetail>(
            "SELECT oi.id, oi.order_id, oi.product_id, oi.package_id, oi.quantity, \
                    oi.unit_price, oi.total_price, \
                    COALESCE(p.name, pk.name) AS name \
             FROM order_items oi \
             LEFT JOIN products p ON p.id = oi.product_id \
             LEFT JOIN packages pk ON pk.id = oi.package_id \
             WHERE oi.order_id = $1 \
             ORDER BY oi.created_at",
        )
        .bind(order.id)
        .fetch_all(&self.db)
        .await?;

        let user = sqlx::query_as::<_, UserSummary>(
            "SELECT id, first_name, last_name, email FROM users WHERE id = $1",
        )
        .bind(order.user_id)
        .fetch_one(&self.db)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at",
        )
        .bind(order.id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderWithDetails { order, items, user, payments })
    }

    pub async fn list_orders_for_user(
        &self,
        user_id: Uuid,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<(Vec<Order>, i64, u32)> {
        let (page, limit, offset) = page_limits(page, per_page);
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok((orders, total, page))
    }

    pub async fn list_all_orders(&self, filters: &OrderFilters) -> Result<(Vec<OrderAdminRow>, i64, u32)> {
        let (page, limit, offset) = page_limits(filters.page, filters.per_page);

        let mut qb = QueryBuilder::new(
            "SELECT o.*, u.first_name AS user_first_name, u.last_name AS user_last_name, \
                    u.email AS user_email \
             FROM orders o JOIN users u ON u.id = o.user_id WHERE TRUE",
        );
        push_order_filters(&mut qb, filters);
        qb.push(" ORDER BY o.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let orders = qb.build_query_as::<OrderAdminRow>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders o WHERE TRUE");
        push_order_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok((orders, total, page))
    }

    /// Direct status mutation; only the cancellation rule is enforced, and
    /// that lives in [`Store::cancel_order`].
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        internal_notes: Option<&str>,
    ) -> Result<Order> {
        sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, \
                    internal_notes = COALESCE($3, internal_notes), \
                    updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .bind(status)
        .bind(internal_notes)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {order_id} not found")))
    }

    pub async fn cancel_order(&self, order_id: Uuid, reason: Option<&str>) -> Result<Order> {
        let mut tx = self.db.begin().await?;
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("order {order_id} not found")))?;

        if order.status.is_terminal() {
            return Err(Error::Conflict(format!(
                "cannot cancel an order in status {}",
                order.status
            )));
        }

        let cancelled = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, \
                    internal_notes = COALESCE($3, internal_notes), \
                    updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .bind(OrderStatus::Cancelled)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(cancelled)
    }
}
