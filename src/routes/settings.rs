use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::{validation::validate_positive_number, AppResult},
    state::AppState,
    types::{Paging, UpdateSettingRequest},
};

// Settings are only created by user provisioning, so there is no create handler.

pub async fn list_settings(State(state): State<AppState>, Query(paging): Query<Paging>) -> AppResult<Response> {
    validate_positive_number(paging.limit, "limit")?;
    Ok(Json(state.store.list_settings(&paging).await?).into_response())
}

pub async fn get_setting(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.get_setting(id).await?).into_response())
}

pub async fn update_setting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSettingRequest>,
) -> AppResult<Response> {
    Ok(Json(state.store.update_setting(id, &req).await?).into_response())
}
