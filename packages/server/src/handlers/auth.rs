use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::entity::{episode_progress, role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse, UpdateMeRequest,
    UserProgress, validate_login_request, validate_register_request, validate_update_me,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates a viewer account. `email` may be an email address (used as both email and username) or a bare username.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username or email taken (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;
    let identity = payload.identity();

    let user = create_user(
        &state.db,
        identity.username,
        identity.email,
        payload.first_name.trim().to_string(),
        &payload.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

/// Insert a viewer account after checking that username and email are free.
pub(crate) async fn create_user<C: ConnectionTrait>(
    conn: &C,
    username: String,
    email: Option<String>,
    first_name: String,
    password: &str,
) -> Result<user::Model, AppError> {
    if let Some(email) = &email
        && user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(conn)
            .await?
            .is_some()
    {
        return Err(AppError::EmailTaken);
    }
    if user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(conn)
        .await?
        .is_some()
    {
        return Err(AppError::UsernameTaken);
    }

    let hash = hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let has_email = email.is_some();
    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        first_name: Set(first_name),
        password: Set(hash),
        role: Set(role::DEFAULT_ROLE.to_string()),
        is_premium: Set(false),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(conn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            debug!("Registration race condition: unique constraint caught on insert");
            if has_email {
                AppError::EmailTaken
            } else {
                AppError::UsernameTaken
            }
        }
        _ => AppError::from(e),
    })?;

    info!(user_id = user.id, "User registered");
    Ok(user)
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Exchanges username (or email) and password for a bearer token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let login = payload.username.trim();

    let user = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(login))
                .add(user::Column::Email.eq(login.to_lowercase())),
        )
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let permissions = load_permissions(&state.db, &user.role).await?;

    let token = jwt::sign(
        user.id,
        &user.username,
        &user.role,
        permissions.clone(),
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.last_login = Set(Some(Utc::now()));
    let user = active.update(&state.db).await?;

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        role: user.role,
        permissions,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Current user profile",
    description = "Returns the profile of the authenticated user with watch progress totals.",
    responses(
        (status = 200, description = "Profile", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    let progress = load_progress(&state.db, user.id).await?;
    Ok(Json(me_response(user, auth_user.permissions, progress)))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Auth",
    operation_id = "updateMe",
    summary = "Update current user profile",
    description = "Changes `first_name` and/or `username`. Usernames stay unique.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated profile", body = MeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<MeResponse>, AppError> {
    validate_update_me(&payload)?;

    let user = find_user(&state.db, auth_user.user_id).await?;
    let mut active: user::ActiveModel = user.clone().into();

    if let Some(username) = payload.username {
        let username = username.trim().to_string();
        if username != user.username {
            let taken = user::Entity::find()
                .filter(user::Column::Username.eq(username.as_str()))
                .filter(user::Column::Id.ne(user.id))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                return Err(AppError::UsernameTaken);
            }
            active.username = Set(username);
        }
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }

    let user = active.update(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;
    let progress = load_progress(&state.db, user.id).await?;
    Ok(Json(me_response(user, auth_user.permissions, progress)))
}

pub(crate) async fn load_permissions<C: ConnectionTrait>(
    conn: &C,
    role: &str,
) -> Result<Vec<String>, AppError> {
    let role_perms = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .all(conn)
        .await?;
    Ok(role_perms.into_iter().map(|rp| rp.permission).collect())
}

async fn find_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn load_progress(db: &DatabaseConnection, user_id: i32) -> Result<UserProgress, AppError> {
    let totals: Option<(i64, Option<i64>)> = episode_progress::Entity::find()
        .select_only()
        .column_as(episode_progress::Column::EpisodeId.count(), "count")
        .column_as(episode_progress::Column::WatchedMinutes.sum(), "minutes")
        .filter(episode_progress::Column::UserId.eq(user_id))
        .into_tuple()
        .one(db)
        .await?;
    let (count, minutes) = totals.unwrap_or((0, None));
    Ok(UserProgress::new(count.max(0) as u64, minutes.unwrap_or(0)))
}

fn me_response(user: user::Model, permissions: Vec<String>, progress: UserProgress) -> MeResponse {
    MeResponse {
        id: user.id,
        first_name: user.first_name,
        username: user.username,
        email: user.email,
        role: user.role,
        permissions,
        is_premium: user.is_premium,
        created_at: user.created_at,
        progress,
    }
}
