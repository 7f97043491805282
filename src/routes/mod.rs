use axum::{
    http::StatusCode,
    middleware,
    routing::{get, patch},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{Cache, InMemoryStore, MemoryCache},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        sources::{FavoritesStore, KeyValueCache, MovieStore, RatingStore},
        RecommendationEngine, RecommendationService,
    },
};

pub mod movies;
pub mod ratings;
pub mod users;

/// Shared handles injected into every handler
pub struct AppState {
    pub movies: Arc<dyn MovieStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub favorites: Arc<dyn FavoritesStore>,
    pub recommendations: RecommendationService,
}

impl AppState {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        favorites: Arc<dyn FavoritesStore>,
        cache: Arc<dyn KeyValueCache>,
        top_n: usize,
        ttl_secs: u64,
    ) -> Self {
        let engine =
            RecommendationEngine::new(movies.clone(), ratings.clone(), favorites.clone(), top_n);
        let recommendations = RecommendationService::new(engine, Cache::new(cache), ttl_secs);

        Self {
            movies,
            ratings,
            favorites,
            recommendations,
        }
    }

    /// State backed entirely by process-local stores
    pub fn in_memory(top_n: usize, ttl_secs: u64) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(MemoryCache::new()),
            top_n,
            ttl_secs,
        )
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            // Request id is assigned before the trace span is opened
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Movies
        .route("/movies", get(movies::list).post(movies::create))
        .route(
            "/movies/:movie_id",
            get(movies::get).patch(movies::update).delete(movies::delete),
        )
        .route(
            "/movies/:movie_id/ratings",
            get(movies::list_ratings).post(movies::rate),
        )
        // Ratings
        .route("/ratings", get(ratings::list))
        .route(
            "/ratings/:rating_id",
            patch(ratings::update).delete(ratings::delete),
        )
        // Current user
        .route("/users/ratings", get(users::ratings))
        .route(
            "/users/favorites/actors",
            get(users::favorite_actors).post(users::add_favorite_actor),
        )
        .route(
            "/users/favorites/directors",
            get(users::favorite_directors).post(users::add_favorite_director),
        )
        .route("/users/recommendations", get(users::recommendations))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
