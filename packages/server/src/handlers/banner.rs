use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::{info, instrument};

use super::movie::find_movie;
use crate::entity::{banner, movie};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::{BannerResponse, CreateBannerRequest, validate_create_banner};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Banners",
    operation_id = "listBanners",
    summary = "List banners",
    description = "Returns all banners, newest first, each with the movie it promotes.",
    responses((status = 200, description = "Banners", body = Vec<BannerResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_banners(
    State(state): State<AppState>,
) -> Result<Json<Vec<BannerResponse>>, AppError> {
    let rows = banner::Entity::find()
        .order_by_desc(banner::Column::Id)
        .find_also_related(movie::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(b, m)| BannerResponse::new(b, m))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Banners",
    operation_id = "createBanner",
    summary = "Create a banner",
    description = "Requires `banner:manage` permission.",
    request_body = CreateBannerRequest,
    responses(
        (status = 201, description = "Banner created", body = BannerResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(movie_id = payload.movie_id))]
pub async fn create_banner(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBannerRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("banner:manage")?;
    validate_create_banner(&payload)?;
    let movie = find_movie(&state.db, payload.movie_id).await?;

    let model = banner::ActiveModel {
        movie_id: Set(movie.id),
        photo_url: Set(payload.photo_url),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(banner_id = model.id, "Banner created");
    Ok((
        StatusCode::CREATED,
        Json(BannerResponse::new(model, Some(movie))),
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Banners",
    operation_id = "deleteBanner",
    summary = "Delete a banner",
    description = "Requires `banner:manage` permission.",
    params(("id" = i32, Path, description = "Banner ID")),
    responses(
        (status = 204, description = "Banner deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Banner not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_banner(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission("banner:manage")?;

    let result = banner::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Banner not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
