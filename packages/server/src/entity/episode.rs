use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "episode")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "movie_season_episode")]
    pub movie_id: i32,
    #[sea_orm(belongs_to, from = "movie_id", to = "id")]
    pub movie: HasOne<super::movie::Entity>,

    #[sea_orm(unique_key = "movie_season_episode", default_value = 1)]
    pub season: i32,
    #[sea_orm(unique_key = "movie_season_episode")]
    pub episode_number: i32,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub quality: String,
    pub release_date: Option<Date>,
    pub duration_secs: Option<i32>,

    #[sea_orm(has_many)]
    pub progress: HasMany<super::episode_progress::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
