use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::instrument;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CachedRecommendations, Movie, MovieId, UserId},
    services::{
        features::{favorite_set, EncodedCatalog},
        profile::{FeatureMatrix, TasteProfile},
        ranking,
        sources::{FavoritesStore, MovieStore, RatingStore},
    },
};

/// Number of profile features logged with each computation
const LOGGED_PROFILE_FEATURES: usize = 20;

/// Content-based recommendation pipeline over injected data sources
///
/// Every call works on its own snapshot of the catalog, the user's ratings and
/// favorites; nothing is shared between calls.
#[derive(Clone)]
pub struct RecommendationEngine {
    movies: Arc<dyn MovieStore>,
    ratings: Arc<dyn RatingStore>,
    favorites: Arc<dyn FavoritesStore>,
    top_n: usize,
}

impl RecommendationEngine {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        favorites: Arc<dyn FavoritesStore>,
        top_n: usize,
    ) -> Self {
        Self {
            movies,
            ratings,
            favorites,
            top_n,
        }
    }

    /// Computes the ranked, hydrated recommendations of a user
    ///
    /// Pipeline:
    /// 1. Encode the catalog into genre, actor and director indicators
    /// 2. Build the rating-weighted taste profile
    /// 3. Score and rank unseen movies against the profile
    /// 4. Resolve the ranked ids to movie records, in ranked order
    #[instrument(skip(self))]
    pub async fn compute(&self, user_id: UserId) -> AppResult<Vec<Movie>> {
        let start = Instant::now();

        let ratings = self.ratings.list_user_ratings(user_id).await?;
        if ratings.is_empty() {
            tracing::info!(user_id, "User has no ratings, nothing to recommend");
            return Ok(Vec::new());
        }

        let favorite_actors = favorite_set(self.favorites.list_favorite_actors(user_id).await?);
        let favorite_directors =
            favorite_set(self.favorites.list_favorite_directors(user_id).await?);
        let catalog = self.movies.list_all_movies().await?;

        let encoded = EncodedCatalog::encode(&catalog, &favorite_actors, &favorite_directors);
        let matrix = FeatureMatrix::combine(&encoded);
        let profile = TasteProfile::build(&matrix, &ratings)?;

        tracing::debug!(
            user_id,
            features = matrix.columns.len(),
            top_features = ?profile.top_features(LOGGED_PROFILE_FEATURES),
            "Built taste profile"
        );

        let rated: HashSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();
        let ranked = ranking::rank(&matrix, &profile, &rated, self.top_n)?;

        let mut recommended = Vec::with_capacity(ranked.len());
        for scored in &ranked {
            let movie = self
                .movies
                .get_movie(scored.movie_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Recommended movie {} not found", scored.movie_id))
                })?;
            recommended.push(movie);
        }

        tracing::info!(
            user_id,
            catalog_size = catalog.len(),
            rated = rated.len(),
            recommended = recommended.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations computed"
        );

        Ok(recommended)
    }
}

/// Cache-aside front of the recommendation engine
///
/// A cached list is served verbatim until its TTL expires; rating or favorite
/// changes within that window are not reflected.
#[derive(Clone)]
pub struct RecommendationService {
    engine: RecommendationEngine,
    cache: Cache,
    ttl_secs: u64,
}

impl RecommendationService {
    pub fn new(engine: RecommendationEngine, cache: Cache, ttl_secs: u64) -> Self {
        Self {
            engine,
            cache,
            ttl_secs,
        }
    }

    /// Returns the recommendations of a user, computing them on a cache miss
    #[instrument(skip(self))]
    pub async fn recommend(&self, user_id: UserId) -> AppResult<Vec<Movie>> {
        let cached: CachedRecommendations = cached!(
            self.cache,
            CacheKey::Recommendations(user_id),
            self.ttl_secs,
            async {
                let movies = self.engine.compute(user_id).await?;
                Ok::<_, AppError>(CachedRecommendations::new(movies))
            }
        )?;

        tracing::debug!(
            count = cached.movies.len(),
            age_secs = cached.age_secs(Utc::now()),
            "Serving recommendations"
        );

        Ok(cached.movies)
    }
}
