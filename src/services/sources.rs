//! Data sources consumed by the recommendation engine and the HTTP layer
//!
//! Each trait is the narrow interface of one collaborator. PostgreSQL and Redis
//! back them in production, `db::memory` in tests.

use crate::{
    error::AppResult,
    models::{Favorite, FavoriteKind, Movie, MovieId, MovieUpdate, NewMovie, RatedMovie, Rating, UserId},
};

/// Movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    /// Lists the whole catalog, ordered by movie id
    async fn list_all_movies(&self) -> AppResult<Vec<Movie>>;

    async fn list_movies(&self, skip: i64, limit: i64) -> AppResult<Vec<Movie>>;

    async fn get_movie(&self, id: MovieId) -> AppResult<Option<Movie>>;

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie>;

    /// Inserts a batch atomically: either every movie is stored or none is
    async fn create_movies(&self, movies: Vec<NewMovie>) -> AppResult<Vec<Movie>>;

    /// Returns `None` when the movie does not exist
    async fn update_movie(&self, id: MovieId, update: MovieUpdate) -> AppResult<Option<Movie>>;

    /// Returns whether a movie was deleted
    async fn delete_movie(&self, id: MovieId) -> AppResult<bool>;
}

/// User ratings
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Ratings of one user joined with the rated movie's attributes
    async fn list_user_ratings(&self, user_id: UserId) -> AppResult<Vec<RatedMovie>>;

    async fn list_ratings(&self, skip: i64, limit: i64) -> AppResult<Vec<Rating>>;

    async fn list_movie_ratings(&self, movie_id: MovieId) -> AppResult<Vec<Rating>>;

    async fn get_rating(&self, id: i64) -> AppResult<Option<Rating>>;

    /// Creates the user's rating of a movie, replacing any previous one
    async fn upsert_rating(&self, user_id: UserId, movie_id: MovieId, score: i32)
        -> AppResult<Rating>;

    async fn update_rating(&self, id: i64, score: i32) -> AppResult<Option<Rating>>;

    async fn delete_rating(&self, id: i64) -> AppResult<bool>;
}

/// Favorite actors and directors, scoped per user
#[async_trait::async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn list_favorites(&self, user_id: UserId, kind: FavoriteKind)
        -> AppResult<Vec<Favorite>>;

    /// Registers a favorite; registering the same name twice is a no-op
    async fn add_favorite(
        &self,
        user_id: UserId,
        kind: FavoriteKind,
        name: &str,
    ) -> AppResult<Favorite>;

    async fn list_favorite_actors(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let favorites = self.list_favorites(user_id, FavoriteKind::Actor).await?;
        Ok(favorites.into_iter().map(|f| f.name).collect())
    }

    async fn list_favorite_directors(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let favorites = self.list_favorites(user_id, FavoriteKind::Director).await?;
        Ok(favorites.into_iter().map(|f| f.name).collect())
    }
}

/// String key-value store with per-entry expiration
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;
}
