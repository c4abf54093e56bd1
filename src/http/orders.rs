//! Checkout and order handlers. Notifications fire after the storage work
//! commits and never affect the response.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::coupon::ApplyCouponRequest;
use crate::domain::aggregates::order::{
    CancelOrderRequest, CreateOrderRequest, Order, OrderAdminRow, OrderFilters,
    OrderWithDetails, UpdateOrderStatusRequest,
};
use crate::domain::events::OrderEvent;
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser, ListParams, PaginatedResponse};
use crate::store::Notifier;
use crate::AppState;

fn dispatch(notifier: &Notifier, user_id: Uuid, event: OrderEvent) {
    let notifier = notifier.clone();
    tokio::spawn(async move { notifier.notify(user_id, &event).await });
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithDetails>>)> {
    req.validate()?;
    let order = state.store.create_order_from_cart(user.id, &req.billing_info).await?;
    let order = match req.coupon_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => state.store.apply_coupon(order.id, code).await?,
        _ => order,
    };
    let details = state.store.order_with_details(order.id).await?;

    dispatch(
        &state.notifier,
        user.id,
        OrderEvent::Created {
            order_id: details.order.id,
            order_number: details.order.order_number.clone(),
            total_amount: details.order.total_amount,
            currency: details.order.currency.clone(),
        },
    );
    Ok((StatusCode::CREATED, ok(details)))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderWithDetails>>> {
    let details = state.store.order_with_details(id).await?;
    if details.order.user_id != user.id {
        user.require_staff()?;
    }
    Ok(ok(details))
}

pub async fn get_by_number(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<OrderWithDetails>>> {
    let details = state.store.order_by_number(&order_number).await?;
    if details.order.user_id != user.id {
        user.require_staff()?;
    }
    Ok(ok(details))
}

pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let (data, total, page) = state
        .store
        .list_orders_for_user(user.id, params.page, params.per_page)
        .await?;
    Ok(ok(PaginatedResponse { data, total, page }))
}

pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderAdminRow>>>> {
    user.require_staff()?;
    let (data, total, page) = state.store.list_all_orders(&filters).await?;
    Ok(ok(PaginatedResponse { data, total, page }))
}

pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderWithDetails>>> {
    user.require_staff()?;
    let order = state
        .store
        .update_order_status(id, req.status, req.internal_notes.as_deref())
        .await?;

    dispatch(
        &state.notifier,
        order.user_id,
        OrderEvent::StatusChanged {
            order_id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
        },
    );
    Ok(ok(state.store.order_with_details(order.id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<ApiResponse<OrderWithDetails>>> {
    let existing = state.store.get_order(id).await?;
    if existing.user_id != user.id {
        user.require_staff()?;
    }
    let order = state.store.cancel_order(id, req.reason.as_deref()).await?;

    dispatch(
        &state.notifier,
        order.user_id,
        OrderEvent::Cancelled { order_id: order.id, order_number: order.order_number.clone() },
    );
    Ok(ok(state.store.order_with_details(order.id).await?))
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Json<ApiResponse<Order>>> {
    let existing = state.store.get_order(id).await?;
    if existing.user_id != user.id {
        user.require_staff()?;
    }
    Ok(ok(state.store.apply_coupon(id, &req.code).await?))
}
