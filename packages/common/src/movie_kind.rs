#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a catalog entry is a single film or an episodic series.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")
)]
#[serde(rename_all = "lowercase")]
pub enum MovieKind {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "movie"))]
    Movie,
    /// Has episodes grouped into seasons.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "series"))]
    Series,
}

impl MovieKind {
    pub const ALL: &'static [MovieKind] = &[Self::Movie, Self::Series];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MovieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMovieKindError {
    invalid: String,
}

impl fmt::Display for ParseMovieKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid kind '{}'. Valid values: {}",
            self.invalid,
            MovieKind::ALL
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseMovieKindError {}

impl FromStr for MovieKind {
    type Err = ParseMovieKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            _ => Err(ParseMovieKindError {
                invalid: s.to_string(),
            }),
        }
    }
}
