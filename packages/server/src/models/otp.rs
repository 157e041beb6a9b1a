use serde::{Deserialize, Serialize};

use super::auth::{validate_email, validate_first_name, validate_new_password};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendOtpRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Completes an email registration with the code that was sent.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "042517")]
    pub code: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PasswordResetRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PasswordResetConfirmRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "042517")]
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OtpSentResponse {
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Seconds until the code expires.
    #[schema(example = 300)]
    pub expires_in: i64,
}

/// Lowercased, trimmed email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_code(code: &str) -> Result<(), AppError> {
    if code.trim().is_empty() {
        return Err(AppError::Validation("code: must not be empty".into()));
    }
    Ok(())
}

pub fn validate_verify_otp(req: &VerifyOtpRequest) -> Result<(), AppError> {
    validate_email(&req.email)?;
    validate_code(&req.code)?;
    validate_first_name(&req.first_name)?;
    validate_new_password(&req.password, &req.confirm_password)
}

pub fn validate_password_reset_confirm(req: &PasswordResetConfirmRequest) -> Result<(), AppError> {
    validate_email(&req.email)?;
    validate_code(&req.code)?;
    validate_new_password(&req.password, &req.confirm_password)
}
