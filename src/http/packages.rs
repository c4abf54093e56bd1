//! Package catalog handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::product::{
    CreatePackageRequest, PackageItemRequest, PackageWithItems, UpdatePackageRequest,
};
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser};
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<PackageWithItems>>>> {
    Ok(ok(state.store.list_packages().await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PackageWithItems>>> {
    Ok(ok(state.store.get_package(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreatePackageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PackageWithItems>>)> {
    user.require_staff()?;
    req.validate()?;
    let package = state.store.create_package(&req).await?;
    Ok((StatusCode::CREATED, ok(package)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePackageRequest>,
) -> Result<Json<ApiResponse<PackageWithItems>>> {
    user.require_staff()?;
    req.validate()?;
    Ok(ok(state.store.update_package(id, &req).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    user.require_staff()?;
    state.store.delete_package(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PackageItemRequest>,
) -> Result<Json<ApiResponse<PackageWithItems>>> {
    user.require_staff()?;
    req.validate()?;
    let package = state
        .store
        .add_package_item(id, req.product_id, req.quantity.unwrap_or(1))
        .await?;
    Ok(ok(package))
}

pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<PackageWithItems>>> {
    user.require_staff()?;
    Ok(ok(state.store.remove_package_item(id, product_id).await?))
}
