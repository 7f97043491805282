use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{CurrentUser, RequestId},
    models::{validate_rating, Movie, MovieId, MovieUpdate, NewMovie, Page, Rating, RatingInput},
    routes::AppState,
};

fn movie_not_found(movie_id: MovieId) -> AppError {
    AppError::NotFound(format!("Movie {} not found", movie_id))
}

fn require_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }
    Ok(())
}

/// Lists catalog movies, paginated
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(page): Query<Page>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.movies.list_movies(page.skip, page.limit).await?;
    Ok(Json(movies))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<Movie>> {
    let movie = state
        .movies
        .get_movie(movie_id)
        .await?
        .ok_or_else(|| movie_not_found(movie_id))?;
    Ok(Json(movie))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Extension(request_id): Extension<RequestId>,
    Json(movie): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    require_title(&movie.title)?;

    let movie = state.movies.create_movie(movie).await?;

    tracing::info!(request_id = %request_id, movie_id = movie.id, "Movie created");

    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(movie_id): Path<MovieId>,
    Json(update): Json<MovieUpdate>,
) -> AppResult<Json<Movie>> {
    if let Some(title) = &update.title {
        require_title(title)?;
    }

    let movie = state
        .movies
        .update_movie(movie_id, update)
        .await?
        .ok_or_else(|| movie_not_found(movie_id))?;
    Ok(Json(movie))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<Value>> {
    if !state.movies.delete_movie(movie_id).await? {
        return Err(movie_not_found(movie_id));
    }
    Ok(Json(json!({ "message": "Movie deleted" })))
}

pub async fn list_ratings(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<Vec<Rating>>> {
    let ratings = state.ratings.list_movie_ratings(movie_id).await?;
    Ok(Json(ratings))
}

/// Creates or replaces the caller's rating of a movie
pub async fn rate(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Extension(request_id): Extension<RequestId>,
    Path(movie_id): Path<MovieId>,
    Json(input): Json<RatingInput>,
) -> AppResult<(StatusCode, Json<Rating>)> {
    let score = validate_rating(input.rating)?;

    if state.movies.get_movie(movie_id).await?.is_none() {
        return Err(movie_not_found(movie_id));
    }

    let rating = state.ratings.upsert_rating(user_id, movie_id, score).await?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        movie_id,
        rating = score,
        "Rating stored"
    );

    Ok((StatusCode::CREATED, Json(rating)))
}
