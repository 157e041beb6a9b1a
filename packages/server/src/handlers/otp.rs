use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::OtpPurpose;
use sea_orm::*;
use tracing::{info, instrument, warn};

use super::auth::create_user;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{RegisterResponse, validate_email};
use crate::models::otp::{
    OtpSentResponse, PasswordResetConfirmRequest, PasswordResetRequest, SendOtpRequest,
    VerifyOtpRequest, normalize_email, validate_password_reset_confirm, validate_verify_otp,
};
use crate::otp::store;
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    post,
    path = "/otp/send",
    tag = "Auth",
    operation_id = "sendOtp",
    summary = "Send a registration code",
    description = "Issues a 6-digit code for an unregistered email address. A new request replaces the pending code.",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code sent", body = OtpSentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendOtpRequest>,
) -> Result<Json<OtpSentResponse>, AppError> {
    validate_email(&payload.email)?;
    let email = normalize_email(&payload.email);

    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    deliver(&state, &email, OtpPurpose::Registration).await?;

    Ok(Json(OtpSentResponse {
        email,
        expires_in: state.config.auth.otp_ttl_secs,
    }))
}

#[utoipa::path(
    post,
    path = "/otp/verify",
    tag = "Auth",
    operation_id = "verifyOtp",
    summary = "Register with a code",
    description = "Creates the account when the code matches. Each wrong code counts towards the attempt limit.",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error or bad code (VALIDATION_ERROR, OTP_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_verify_otp(&payload)?;
    let email = normalize_email(&payload.email);

    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    store::verify(
        &state.db,
        &email,
        OtpPurpose::Registration,
        &payload.code,
        state.config.auth.otp_max_attempts,
    )
    .await?;

    let user = create_user(
        &state.db,
        email.clone(),
        Some(email),
        payload.first_name.trim().to_string(),
        &payload.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/password-reset/request",
    tag = "Auth",
    operation_id = "requestPasswordReset",
    summary = "Send a password reset code",
    description = "Issues a reset code when the address belongs to an account. The response is the same either way.",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Request accepted"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordResetRequest>,
) -> Result<StatusCode, AppError> {
    validate_email(&payload.email)?;
    let email = normalize_email(&payload.email);

    if find_by_email(&state.db, &email).await?.is_some() {
        deliver(&state, &email, OtpPurpose::PasswordReset).await?;
    } else {
        info!("Password reset requested for unknown email");
    }

    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    post,
    path = "/password-reset/confirm",
    tag = "Auth",
    operation_id = "confirmPasswordReset",
    summary = "Set a new password with a reset code",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error or bad code (VALIDATION_ERROR, OTP_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordResetConfirmRequest>,
) -> Result<StatusCode, AppError> {
    validate_password_reset_confirm(&payload)?;
    let email = normalize_email(&payload.email);

    store::verify(
        &state.db,
        &email,
        OtpPurpose::PasswordReset,
        &payload.code,
        state.config.auth.otp_max_attempts,
    )
    .await?;

    let user = find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::OtpInvalid)?;

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.password = Set(hash);
    active.update(&state.db).await?;

    info!(user_id, "Password reset");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Store a fresh code and hand it to the configured sender.
async fn deliver(state: &AppState, email: &str, purpose: OtpPurpose) -> Result<(), AppError> {
    let code = store::issue(&state.db, email, purpose, state.config.auth.otp_ttl_secs).await?;
    state
        .otp_sender
        .send(email, purpose, &code)
        .await
        .map_err(|e| {
            warn!(%purpose, error = %e, "Failed to deliver one-time code");
            AppError::Internal(format!("OTP delivery failed: {}", e))
        })
}
