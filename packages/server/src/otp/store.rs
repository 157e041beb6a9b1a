use chrono::{Duration, Utc};
use common::OtpPurpose;
use rand::Rng;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::entity::otp_code;
use crate::error::AppError;

/// Number of digits in an issued code.
pub const CODE_LENGTH: usize = 6;

/// Generate a zero-padded numeric code.
pub fn generate_code() -> String {
    let n = rand::rng().random_range(0..10u32.pow(CODE_LENGTH as u32));
    format!("{n:0width$}", width = CODE_LENGTH)
}

/// Hex SHA-256 of a code; only this is persisted.
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Issue a new code for `(email, purpose)`, replacing any pending one.
///
/// Returns the plaintext code for delivery. Expired rows of every address are
/// purged first.
#[instrument(skip(db))]
pub async fn issue(
    db: &DatabaseConnection,
    email: &str,
    purpose: OtpPurpose,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let purged = otp_code::Entity::delete_many()
        .filter(otp_code::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    if purged.rows_affected > 0 {
        debug!(purged = purged.rows_affected, "Purged expired one-time codes");
    }

    let code = generate_code();
    let model = otp_code::ActiveModel {
        email: Set(email.to_string()),
        purpose: Set(purpose),
        code_hash: Set(hash_code(&code)),
        attempts: Set(0),
        expires_at: Set(now + Duration::seconds(ttl_secs)),
        created_at: Set(now),
    };

    otp_code::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([otp_code::Column::Email, otp_code::Column::Purpose])
                .update_columns([
                    otp_code::Column::CodeHash,
                    otp_code::Column::Attempts,
                    otp_code::Column::ExpiresAt,
                    otp_code::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!(%purpose, "One-time code stored");
    Ok(code)
}

/// Check `code` against the pending code of `(email, purpose)` and consume it on success.
///
/// Wrong guesses are counted; once `max_attempts` is reached the code is
/// discarded. Expired codes are deleted on sight.
#[instrument(skip(db, code))]
pub async fn verify(
    db: &DatabaseConnection,
    email: &str,
    purpose: OtpPurpose,
    code: &str,
    max_attempts: i32,
) -> Result<(), AppError> {
    let key = (email.to_string(), purpose);
    let txn = db.begin().await?;

    let pending = otp_code::Entity::find_by_id(key.clone())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::OtpInvalid)?;

    if pending.expires_at <= Utc::now() {
        otp_code::Entity::delete_by_id(key).exec(&txn).await?;
        txn.commit().await?;
        return Err(AppError::OtpInvalid);
    }

    if pending.code_hash != hash_code(code.trim()) {
        let attempts = pending.attempts + 1;
        if attempts >= max_attempts {
            warn!(attempts, "Too many wrong codes, discarding");
            otp_code::Entity::delete_by_id(key).exec(&txn).await?;
        } else {
            let mut active: otp_code::ActiveModel = pending.into();
            active.attempts = Set(attempts);
            active.update(&txn).await?;
        }
        txn.commit().await?;
        return Err(AppError::OtpInvalid);
    }

    otp_code::Entity::delete_by_id(key).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}
