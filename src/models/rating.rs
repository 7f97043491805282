use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};
use crate::error::{AppError, AppResult};

/// Lowest accepted rating score
pub const MIN_RATING: i32 = 0;
/// Highest accepted rating score
pub const MAX_RATING: i32 = 5;

/// A user's rating of one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: i32,
}

/// Rating payload for create and update requests
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RatingInput {
    pub rating: i32,
}

/// A rating joined with the attributes of the rated movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct RatedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub actors: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
    pub rating: i32,
}

/// Ensures a score lies within the accepted rating range
pub fn validate_rating(score: i32) -> AppResult<i32> {
    if (MIN_RATING..=MAX_RATING).contains(&score) {
        Ok(score)
    } else {
        Err(AppError::InvalidInput(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )))
    }
}
