use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{CurrentUser, RequestId},
    models::{Favorite, FavoriteInput, FavoriteKind, Movie, RatedMovie},
    routes::AppState,
};

/// Ratings of the caller, with the rated movies' attributes
pub async fn ratings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<RatedMovie>>> {
    let ratings = state.ratings.list_user_ratings(user_id).await?;
    Ok(Json(ratings))
}

pub async fn favorite_actors(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Favorite>>> {
    list_favorites(&state, user_id, FavoriteKind::Actor).await
}

pub async fn favorite_directors(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Favorite>>> {
    list_favorites(&state, user_id, FavoriteKind::Director).await
}

pub async fn add_favorite_actor(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<FavoriteInput>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    add_favorite(&state, user_id, FavoriteKind::Actor, input).await
}

pub async fn add_favorite_director(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<FavoriteInput>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    add_favorite(&state, user_id, FavoriteKind::Director, input).await
}

async fn list_favorites(
    state: &AppState,
    user_id: i64,
    kind: FavoriteKind,
) -> AppResult<Json<Vec<Favorite>>> {
    let favorites = state.favorites.list_favorites(user_id, kind).await?;
    Ok(Json(favorites))
}

async fn add_favorite(
    state: &AppState,
    user_id: i64,
    kind: FavoriteKind,
    input: FavoriteInput,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(format!("Favorite {} name must not be empty", kind)));
    }

    let favorite = state.favorites.add_favorite(user_id, kind, name).await?;

    tracing::info!(user_id, kind = %kind, name, "Favorite added");

    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Top recommendations of the caller, served from cache when fresh
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Vec<Movie>>> {
    tracing::info!(request_id = %request_id, user_id, "Recommendations requested");

    let movies = state.recommendations.recommend(user_id).await?;
    Ok(Json(movies))
}
