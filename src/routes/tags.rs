use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::{validation::validate_positive_number, AppResult},
    state::AppState,
    types::{Paging, TagRelation, TagRequest},
};

pub async fn create_tag(State(state): State<AppState>, Json(req): Json<TagRequest>) -> AppResult<Response> {
    Ok((StatusCode::CREATED, Json(state.store.create_tag(&req.name).await?)).into_response())
}

pub async fn list_tags(State(state): State<AppState>, Query(paging): Query<Paging>) -> AppResult<Response> {
    validate_positive_number(paging.limit, "limit")?;
    Ok(Json(state.store.list_tags(&paging).await?).into_response())
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    Ok(Json(state.store.get_tag(id).await?).into_response())
}

pub async fn rename_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TagRequest>,
) -> AppResult<Response> {
    Ok(Json(state.store.rename_tag(id, &req.name).await?).into_response())
}

pub async fn delete_tag(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.store.delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_relation(
    State(state): State<AppState>,
    Json(relation): Json<TagRelation>,
) -> AppResult<Response> {
    Ok((StatusCode::CREATED, Json(state.store.attach_tag(&relation).await?)).into_response())
}

pub async fn list_relations(State(state): State<AppState>, Query(paging): Query<Paging>) -> AppResult<Response> {
    validate_positive_number(paging.limit, "limit")?;
    Ok(Json(state.store.list_tag_relations(&paging).await?).into_response())
}

pub async fn delete_relation(
    State(state): State<AppState>,
    Path((entry_id, tag_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.store.detach_tag(entry_id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
