//! Cart handlers: every operation is scoped to the authenticated caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::cart::{
    self, AddToCartRequest, CartLine, CartSummary, LineRef, UpdateCartItemRequest,
};
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser};
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<CartLine>>>> {
    Ok(ok(state.store.cart_lines(user.id).await?))
}

pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<CartSummary>>> {
    let lines = state.store.cart_lines(user.id).await?;
    Ok(ok(cart::summarize(lines)))
}

pub async fn add(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartLine>>)> {
    req.validate()?;
    let line_ref = LineRef::from_ids(req.product_id, req.package_id)?;
    let line = state
        .store
        .add_cart_item(user.id, line_ref, req.quantity.unwrap_or(1))
        .await?;
    Ok((StatusCode::CREATED, ok(line)))
}

pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<Option<CartLine>>>> {
    let line = state
        .store
        .update_cart_quantity(user.id, item_id, req.quantity)
        .await?;
    Ok(ok(line))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store.remove_cart_item(user.id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(State(state): State<AppState>, user: AuthUser) -> Result<StatusCode> {
    state.store.clear_cart(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
