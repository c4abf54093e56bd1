//! Payment handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::payment::{
    Payment, PaymentFilters, ProcessPaymentRequest, RefundPaymentRequest,
};
use crate::domain::events::OrderEvent;
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser, PaginatedResponse};
use crate::AppState;

pub async fn process(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Payment>>)> {
    let payment = state
        .store
        .process_payment(user.id, &req, state.gateway.as_ref())
        .await?;

    let order = state.store.get_order(payment.order_id).await?;
    let notifier = state.notifier.clone();
    let event = OrderEvent::Paid { order_id: order.id, order_number: order.order_number.clone() };
    let user_id = user.id;
    tokio::spawn(async move { notifier.notify(user_id, &event).await });

    Ok((StatusCode::CREATED, ok(payment)))
}

pub async fn get_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>> {
    Ok(ok(state.store.get_payment(id, user.id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>> {
    Ok(ok(state.store.cancel_payment(id, user.id).await?))
}

pub async fn refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RefundPaymentRequest>,
) -> Result<Json<ApiResponse<Payment>>> {
    user.require_admin()?;
    req.validate()?;
    Ok(ok(state.store.refund_payment(id, &req.reason).await?))
}

pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filters): Query<PaymentFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<Payment>>>> {
    user.require_staff()?;
    let (data, total, page) = state.store.list_payments(&filters).await?;
    Ok(ok(PaginatedResponse { data, total, page }))
}
