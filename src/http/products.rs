//! Product catalog handlers. Reads are public; mutations are staff-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::product::{
    CreateProductRequest, Product, ProductFilters, UpdateProductRequest,
};
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser, PaginatedResponse};
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<Product>>>> {
    let (data, total, page) = state.store.list_products(&filters).await?;
    Ok(ok(PaginatedResponse { data, total, page }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>> {
    Ok(ok(state.store.get_product(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>)> {
    user.require_staff()?;
    req.validate()?;
    let product = state.store.create_product(&req).await?;
    Ok((StatusCode::CREATED, ok(product)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>> {
    user.require_staff()?;
    req.validate()?;
    Ok(ok(state.store.update_product(id, &req).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    user.require_staff()?;
    state.store.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
