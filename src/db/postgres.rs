use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::AppResult,
    models::{
        Favorite, FavoriteKind, Movie, MovieId, MovieUpdate, NewMovie, RatedMovie, Rating, UserId,
    },
    services::sources::{FavoritesStore, MovieStore, RatingStore},
};

/// Creates a PostgreSQL connection pool and applies pending migrations
///
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

const MOVIE_COLUMNS: &str = "id, title, genres, actors, directors";

/// PostgreSQL implementation of the movie, rating and favorite stores
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MovieStore for PgStore {
    async fn list_all_movies(&self) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies ORDER BY id",
            MOVIE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn list_movies(&self, skip: i64, limit: i64) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies ORDER BY id OFFSET $1 LIMIT $2",
            MOVIE_COLUMNS
        ))
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn get_movie(&self, id: MovieId) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies WHERE id = $1",
            MOVIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            r#"
            INSERT INTO movies (title, genres, actors, directors)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        ))
        .bind(movie.title)
        .bind(movie.genres)
        .bind(movie.actors)
        .bind(movie.directors)
        .fetch_one(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn create_movies(&self, movies: Vec<NewMovie>) -> AppResult<Vec<Movie>> {
        let insert = format!(
            "INSERT INTO movies (title, genres, actors, directors) VALUES ($1, $2, $3, $4) RETURNING {}",
            MOVIE_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(movies.len());
        for movie in movies {
            let movie = sqlx::query_as::<_, Movie>(&insert)
                .bind(movie.title)
                .bind(movie.genres)
                .bind(movie.actors)
                .bind(movie.directors)
                .fetch_one(&mut *tx)
                .await?;
            created.push(movie);
        }
        tx.commit().await?;

        Ok(created)
    }

    async fn update_movie(&self, id: MovieId, update: MovieUpdate) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            r#"
            UPDATE movies
            SET title = COALESCE($2, title),
                genres = COALESCE($3, genres),
                actors = COALESCE($4, actors),
                directors = COALESCE($5, directors)
            WHERE id = $1
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.genres)
        .bind(update.actors)
        .bind(update.directors)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn delete_movie(&self, id: MovieId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RatingStore for PgStore {
    async fn list_user_ratings(&self, user_id: UserId) -> AppResult<Vec<RatedMovie>> {
        let rated = sqlx::query_as::<_, RatedMovie>(
            r#"
            SELECT m.id AS movie_id, m.title, m.genres, m.actors, m.directors, r.rating
            FROM ratings r
            JOIN movies m ON m.id = r.movie_id
            WHERE r.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rated)
    }

    async fn list_ratings(&self, skip: i64, limit: i64) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, user_id, movie_id, rating FROM ratings ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn list_movie_ratings(&self, movie_id: MovieId) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, user_id, movie_id, rating FROM ratings WHERE movie_id = $1 ORDER BY id",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn get_rating(&self, id: i64) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT id, user_id, movie_id, rating FROM ratings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rating)
    }

    async fn upsert_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> AppResult<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, movie_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET rating = EXCLUDED.rating
            RETURNING id, user_id, movie_id, rating
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        Ok(rating)
    }

    async fn update_rating(&self, id: i64, score: i32) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "UPDATE ratings SET rating = $2 WHERE id = $1 RETURNING id, user_id, movie_id, rating",
        )
        .bind(id)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rating)
    }

    async fn delete_rating(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl FavoritesStore for PgStore {
    async fn list_favorites(
        &self,
        user_id: UserId,
        kind: FavoriteKind,
    ) -> AppResult<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT id, user_id, name FROM {} WHERE user_id = $1 ORDER BY id",
            kind.table()
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }

    async fn add_favorite(
        &self,
        user_id: UserId,
        kind: FavoriteKind,
        name: &str,
    ) -> AppResult<Favorite> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            INSERT INTO {} (user_id, name)
            VALUES ($1, $2)
            ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, user_id, name
            "#,
            kind.table()
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(favorite)
    }
}
