use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::endpoint_limit;
use crate::{
    error::{validation::validate_positive_number, AppResult},
    middleware::{ip::MaybeRemoteAddr, validation::sanitize_for_logging},
    state::AppState,
    types::{CreateUserRequest, Paging, UpdateUserRequest, UploadRequest, UploadResponse},
};

/// Registers a user; the store provisions its default favorite, seed entry and setting.
pub async fn create_user(
    State(state): State<AppState>,
    remote: MaybeRemoteAddr,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Response> {
    if let Some(limited) = endpoint_limit(&state, "/users", &headers, remote).await {
        return Ok(limited);
    }
    let user = state.store.create_user(&req).await?;
    state.metrics.inc_users_created();
    state.metrics.inc_favorites_created();
    state.metrics.add_entries_created(1);
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn list_users(State(state): State<AppState>, Query(paging): Query<Paging>) -> AppResult<Response> {
    validate_positive_number(paging.limit, "limit")?;
    Ok(Json(state.store.list_users(&paging).await?).into_response())
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.get_user(id).await?).into_response())
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Response> {
    Ok(Json(state.store.update_user(id, &req).await?).into_response())
}

pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.store.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user_setting(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.get_user_setting(id).await?).into_response())
}

/// Reserves the storage path for a new avatar of user `id`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    remote: MaybeRemoteAddr,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UploadRequest>,
) -> AppResult<Response> {
    if let Some(limited) = endpoint_limit(&state, "/uploads", &headers, remote).await {
        return Ok(limited);
    }
    let path = state.store.assign_avatar(id, &state.config.media.avatar_dir, &req.filename).await?;
    tracing::debug!("Avatar for user {} from '{}' -> {}", id, sanitize_for_logging(&req.filename), path);
    Ok((StatusCode::CREATED, Json(UploadResponse { path })).into_response())
}
