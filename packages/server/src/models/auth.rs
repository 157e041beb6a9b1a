use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    #[schema(example = "Alice")]
    pub first_name: String,
    /// Email address or bare username. An address containing `@` becomes
    /// both the email and the username of the account.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (6-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "s3cure_P@ss!")]
    pub confirm_password: String,
}

/// Login identity derived from the `email` field of a registration.
#[derive(Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub email: Option<String>,
}

impl RegisterRequest {
    pub fn identity(&self) -> Identity {
        let value = self.email.trim();
        if value.contains('@') {
            let email = value.to_lowercase();
            Identity {
                username: email.clone(),
                email: Some(email),
            }
        } else {
            Identity {
                username: value.to_string(),
                email: None,
            }
        }
    }
}

pub fn validate_first_name(first_name: &str) -> Result<(), AppError> {
    if first_name.trim().is_empty() || first_name.trim().chars().count() > 150 {
        return Err(AppError::Validation(
            "first_name: must be 1-150 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > 150 {
        return Err(AppError::Validation(
            "username: must be 1-150 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(AppError::Validation(
            "username: may contain only letters, digits and @ . + - _".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation("email: must be a valid address".into()));
    }
    Ok(())
}

/// Password length and confirmation check.
pub fn validate_new_password(password: &str, confirm_password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(6..=128).contains(&len) {
        return Err(AppError::Validation(
            "password: must be 6-128 characters".into(),
        ));
    }
    if password != confirm_password {
        return Err(AppError::Validation(
            "password: passwords do not match".into(),
        ));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_first_name(&payload.first_name)?;
    let identity = payload.identity();
    match &identity.email {
        Some(email) => validate_email(email)?,
        None => validate_username(&identity.username)?,
    }
    validate_new_password(&payload.password, &payload.confirm_password)
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username or email of the account.
    #[schema(example = "alice@example.com")]
    pub username: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("username: must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("password: must not be empty".into()));
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    /// ID of the newly created user.
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice@example.com")]
    pub username: String,
    #[schema(example = "Alice")]
    pub first_name: String,
}

impl From<crate::entity::user::Model> for RegisterResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice@example.com")]
    pub username: String,
    #[schema(example = "viewer")]
    pub role: String,
    /// Permissions granted to the user.
    #[schema(example = json!([]))]
    pub permissions: Vec<String>,
}

/// Aggregated watch progress of a user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserProgress {
    /// Episodes with recorded progress.
    #[schema(example = 12)]
    pub watched_episodes_count: u64,
    /// Sum of watched minutes in hours, rounded to 2 decimals.
    #[schema(example = 7.25)]
    pub total_watched_hours: f64,
}

impl UserProgress {
    pub fn new(watched_episodes_count: u64, total_minutes: i64) -> Self {
        Self {
            watched_episodes_count,
            total_watched_hours: (total_minutes as f64 / 60.0 * 100.0).round() / 100.0,
        }
    }
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "alice@example.com")]
    pub username: String,
    pub email: Option<String>,
    #[schema(example = "viewer")]
    pub role: String,
    pub permissions: Vec<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub progress: UserProgress,
}

/// Request body for editing one's own profile.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    pub first_name: Option<String>,
    pub username: Option<String>,
}

pub fn validate_update_me(payload: &UpdateMeRequest) -> Result<(), AppError> {
    if let Some(first_name) = &payload.first_name {
        validate_first_name(first_name)?;
    }
    if let Some(username) = &payload.username {
        validate_username(username)?;
    }
    Ok(())
}
