use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};

use super::movie::find_movie;
use crate::entity::{episode, episode_progress};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::bookmark::{ProgressResponse, UpdateProgressRequest, validate_update_progress};
use crate::models::catalog::{CreateEpisodeRequest, EpisodeResponse, validate_create_episode};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/episodes",
    tag = "Episodes",
    operation_id = "listEpisodes",
    summary = "List episodes of a movie",
    description = "Returns episodes ordered by season, then episode number.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Episodes", body = Vec<EpisodeResponse>),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_episodes(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<EpisodeResponse>>, AppError> {
    find_movie(&state.db, id).await?;

    let episodes = episode::Entity::find()
        .filter(episode::Column::MovieId.eq(id))
        .order_by_asc(episode::Column::Season)
        .order_by_asc(episode::Column::EpisodeNumber)
        .all(&state.db)
        .await?;

    Ok(Json(episodes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/episodes",
    tag = "Episodes",
    operation_id = "createEpisode",
    summary = "Add an episode",
    description = "Adds an episode to a movie. Requires `movie:edit` permission. `(season, episode_number)` is unique per movie.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body = CreateEpisodeRequest,
    responses(
        (status = 201, description = "Episode created", body = EpisodeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Episode already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_episode(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateEpisodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("movie:edit")?;
    validate_create_episode(&payload)?;
    find_movie(&state.db, id).await?;

    let model = episode::ActiveModel {
        movie_id: Set(id),
        season: Set(payload.season.unwrap_or(1)),
        episode_number: Set(payload.episode_number),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        video_url: Set(payload.video_url),
        quality: Set(payload.quality.trim().to_string()),
        release_date: Set(payload.release_date),
        duration_secs: Set(payload.duration_secs),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Episode already exists for this season".into())
        }
        _ => AppError::from(e),
    })?;

    info!(
        episode_id = model.id,
        season = model.season,
        episode_number = model.episode_number,
        "Episode created"
    );
    Ok((StatusCode::CREATED, Json(EpisodeResponse::from(model))))
}

#[utoipa::path(
    put,
    path = "/{id}/progress",
    tag = "Episodes",
    operation_id = "updateEpisodeProgress",
    summary = "Record watch progress",
    description = "Stores how many minutes of the episode the current user has watched, replacing the previous value.",
    params(("id" = i32, Path, description = "Episode ID")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress stored", body = ProgressResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Episode not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_progress(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    validate_update_progress(&payload)?;

    episode::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Episode not found".into()))?;

    let row = episode_progress::ActiveModel {
        user_id: Set(auth_user.user_id),
        episode_id: Set(id),
        watched_minutes: Set(payload.watched_minutes),
        updated_at: Set(Utc::now()),
    };

    episode_progress::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                episode_progress::Column::UserId,
                episode_progress::Column::EpisodeId,
            ])
            .update_columns([
                episode_progress::Column::WatchedMinutes,
                episode_progress::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = episode_progress::Entity::find_by_id((auth_user.user_id, id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("episode_progress missing after upsert".into()))?;

    Ok(Json(saved.into()))
}
