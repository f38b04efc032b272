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
    types::{CreateEntryRequest, EntryFilter, UpdateEntryRequest, UploadRequest, UploadResponse},
};

pub async fn create_entry(
    State(state): State<AppState>,
    remote: MaybeRemoteAddr,
    headers: HeaderMap,
    Json(req): Json<CreateEntryRequest>,
) -> AppResult<Response> {
    if let Some(limited) = endpoint_limit(&state, "/entries", &headers, remote).await {
        return Ok(limited);
    }
    let entry = state.store.create_entry(&req).await?;
    state.metrics.add_entries_created(1);
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

pub async fn list_entries(State(state): State<AppState>, Query(filter): Query<EntryFilter>) -> AppResult<Response> {
    validate_positive_number(filter.limit, "limit")?;
    Ok(Json(state.store.list_entries(&filter).await?).into_response())
}

pub async fn get_entry(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.get_entry(id).await?).into_response())
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEntryRequest>,
) -> AppResult<Response> {
    Ok(Json(state.store.update_entry(id, &req).await?).into_response())
}

pub async fn delete_entry(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.store.delete_entry(id).await?;
    state.metrics.add_entries_deleted(1);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_visit(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    let entry = state.store.record_visit(id).await?;
    state.metrics.inc_entry_visits();
    Ok(Json(entry).into_response())
}

/// Reserves the storage path for a new thumbnail of entry `id`.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    remote: MaybeRemoteAddr,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UploadRequest>,
) -> AppResult<Response> {
    if let Some(limited) = endpoint_limit(&state, "/uploads", &headers, remote).await {
        return Ok(limited);
    }
    let path = state.store.assign_thumbnail(id, &state.config.media.thumbnail_dir, &req.filename).await?;
    tracing::debug!("Thumbnail for entry {} from '{}' -> {}", id, sanitize_for_logging(&req.filename), path);
    Ok((StatusCode::CREATED, Json(UploadResponse { path })).into_response())
}
