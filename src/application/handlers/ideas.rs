use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::application::state::AppState;
use crate::domain::entities::idea::{Idea, IdeaFilter, IdeaPatch, NewIdea, ReviewDecision};
use crate::domain::entities::principal::Principal;

/// API response for idea listings
#[derive(Debug, Serialize, Deserialize)]
pub struct IdeaListResponse {
    pub ideas: Vec<Idea>,
    pub count: usize,
}

/// Body of `POST /ideas/:id/review`
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_argument(rejection.body_text()))
}

/// List ideas matching `status`, `visibility` and `trader_id`
///
/// Fails as a whole if any match is unreadable by the caller; anonymous
/// clients should ask for `status=approved&visibility=public`.
pub async fn list_ideas(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    filter: Result<Query<IdeaFilter>, QueryRejection>,
) -> Result<Json<IdeaListResponse>, ApiError> {
    let Query(filter) = filter.map_err(|rejection| ApiError::invalid_argument(rejection.body_text()))?;
    let ideas = state.ideas.list(&principal, &filter).await?;
    Ok(Json(IdeaListResponse {
        count: ideas.len(),
        ideas,
    }))
}

pub async fn get_idea(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Idea>, ApiError> {
    Ok(Json(state.ideas.get(&principal, &id).await?))
}

pub async fn create_idea(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<NewIdea>, JsonRejection>,
) -> Result<(StatusCode, Json<Idea>), ApiError> {
    let new_idea = body(payload)?;
    let idea = state.ideas.create(&principal, new_idea).await?;
    Ok((StatusCode::CREATED, Json(idea)))
}

pub async fn update_idea(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<IdeaPatch>, JsonRejection>,
) -> Result<Json<Idea>, ApiError> {
    let patch = body(payload)?;
    Ok(Json(state.ideas.update(&principal, &id, patch).await?))
}

pub async fn delete_idea(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.ideas.delete(&principal, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admin approve/reject
pub async fn review_idea(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Idea>, ApiError> {
    let request = body(payload)?;
    Ok(Json(
        state.ideas.review(&principal, &id, request.decision).await?,
    ))
}
