use common::OtpPurpose;
use sea_orm::entity::prelude::*;

/// A pending one-time code. Only the SHA-256 of the code is stored.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_code")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub purpose: OtpPurpose,

    pub code_hash: String,
    #[sea_orm(default_value = 0)]
    pub attempts: i32,

    #[sea_orm(indexed)]
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
