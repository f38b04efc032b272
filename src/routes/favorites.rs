use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::{validation::validate_positive_number, AppResult},
    state::AppState,
    types::{CreateFavoriteRequest, FavoriteFilter, UpdateFavoriteRequest},
};

pub async fn create_favorite(
    State(state): State<AppState>,
    Json(req): Json<CreateFavoriteRequest>,
) -> AppResult<Response> {
    let favorite = state.store.create_favorite(&req).await?;
    state.metrics.inc_favorites_created();
    Ok((StatusCode::CREATED, Json(favorite)).into_response())
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Query(filter): Query<FavoriteFilter>,
) -> AppResult<Response> {
    validate_positive_number(filter.limit, "limit")?;
    Ok(Json(state.store.list_favorites(&filter).await?).into_response())
}

pub async fn get_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.get_favorite(id).await?).into_response())
}

pub async fn update_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateFavoriteRequest>,
) -> AppResult<Response> {
    Ok(Json(state.store.update_favorite(id, &req).await?).into_response())
}

pub async fn delete_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let favorite = state.store.get_favorite(id).await?;
    state.store.delete_favorite(id).await?;
    state.metrics.inc_favorites_deleted();
    state.metrics.add_entries_deleted(favorite.entries_num.max(0) as u64);
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /favorites/{id}/entries`: empties the favorite in one statement.
pub async fn purge_entries(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    let adjustment = state.store.purge_entries(id).await?;
    state.metrics.add_entries_deleted(adjustment.changed_by.unsigned_abs());
    Ok(Json(adjustment).into_response())
}

pub async fn recount_entries(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.recount_entries(id).await?).into_response())
}
