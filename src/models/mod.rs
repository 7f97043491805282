use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod favorite;
mod movie;
mod rating;

pub use favorite::{Favorite, FavoriteInput, FavoriteKind};
pub use movie::{Movie, MovieUpdate, NewMovie};
pub use rating::{validate_rating, RatedMovie, Rating, RatingInput, MAX_RATING, MIN_RATING};

/// Identifier of a catalog movie
pub type MovieId = i64;

/// Identifier of a user, as forwarded by the authentication layer
pub type UserId = i64;

/// Recommendation list as stored in the cache, keyed by user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedRecommendations {
    pub movies: Vec<Movie>,
    pub cached_at: DateTime<Utc>,
}

impl CachedRecommendations {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self {
            movies,
            cached_at: Utc::now(),
        }
    }

    /// Whole seconds since the list was computed, never negative
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.cached_at).num_seconds().max(0)
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}
