use common::MovieKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A film or series in the catalog.
///
/// `rating_avg` and `rating_count` are derived from the `rating` rows of the
/// movie and are written only by [`crate::rating::aggregator`].
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub kind: MovieKind,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,

    /// Mean score rounded to one decimal; 0.0 when unrated.
    #[sea_orm(default_value = 0.0)]
    pub rating_avg: f64,
    #[sea_orm(default_value = 0)]
    pub rating_count: i32,

    #[sea_orm(has_many, via = "movie_genre")]
    pub genres: HasMany<super::genre::Entity>,
    #[sea_orm(has_many)]
    pub episodes: HasMany<super::episode::Entity>,
    #[sea_orm(has_many)]
    pub ratings: HasMany<super::rating::Entity>,
    #[sea_orm(has_many)]
    pub banners: HasMany<super::banner::Entity>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
