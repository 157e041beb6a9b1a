use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Recipient. `(user_id, movie_id)` is unique so a movie announcement
    /// reaches each user at most once.
    #[sea_orm(unique_key = "notification_user_movie")]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub message: String,

    #[sea_orm(unique_key = "notification_user_movie", indexed)]
    pub movie_id: Option<i32>,
    #[sea_orm(belongs_to, from = "movie_id", to = "id")]
    pub movie: Option<super::movie::Entity>,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
