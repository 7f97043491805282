use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{validate_rating, Page, Rating, RatingInput},
    routes::AppState,
};

fn rating_not_found(rating_id: i64) -> AppError {
    AppError::NotFound(format!("Rating {} not found", rating_id))
}

/// Loads a rating and checks the caller owns it
async fn owned_rating(state: &AppState, user: CurrentUser, rating_id: i64) -> AppResult<Rating> {
    let rating = state
        .ratings
        .get_rating(rating_id)
        .await?
        .ok_or_else(|| rating_not_found(rating_id))?;
    user.authorize(rating.user_id)?;
    Ok(rating)
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(page): Query<Page>,
) -> AppResult<Json<Vec<Rating>>> {
    let ratings = state.ratings.list_ratings(page.skip, page.limit).await?;
    Ok(Json(ratings))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(rating_id): Path<i64>,
    Json(input): Json<RatingInput>,
) -> AppResult<Json<Rating>> {
    let score = validate_rating(input.rating)?;
    owned_rating(&state, user, rating_id).await?;

    let rating = state
        .ratings
        .update_rating(rating_id, score)
        .await?
        .ok_or_else(|| rating_not_found(rating_id))?;

    tracing::info!(user_id = user.0, rating_id, rating = score, "Rating updated");

    Ok(Json(rating))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(rating_id): Path<i64>,
) -> AppResult<Json<Value>> {
    owned_rating(&state, user, rating_id).await?;

    if !state.ratings.delete_rating(rating_id).await? {
        return Err(rating_not_found(rating_id));
    }

    tracing::info!(user_id = user.0, rating_id, "Rating deleted");

    Ok(Json(json!({ "message": "Rating deleted" })))
}
