use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::{
    error::AppResult,
    models::{
        Favorite, FavoriteKind, Movie, MovieId, MovieUpdate, NewMovie, RatedMovie, Rating, UserId,
    },
    services::sources::{FavoritesStore, KeyValueCache, MovieStore, RatingStore},
};

/// Process-local implementation of the movie, rating and favorite stores
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    movies: Vec<Movie>,
    ratings: Vec<Rating>,
    favorites: Vec<(FavoriteKind, Favorite)>,
    next_movie_id: MovieId,
    next_rating_id: i64,
    next_favorite_id: i64,
}

impl StoreInner {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

fn page<T: Clone>(items: &[T], skip: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MovieStore for InMemoryStore {
    async fn list_all_movies(&self) -> AppResult<Vec<Movie>> {
        Ok(self.inner.read().await.movies.clone())
    }

    async fn list_movies(&self, skip: i64, limit: i64) -> AppResult<Vec<Movie>> {
        Ok(page(&self.inner.read().await.movies, skip, limit))
    }

    async fn get_movie(&self, id: MovieId) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;
        let id = StoreInner::next_id(&mut inner.next_movie_id);
        let movie = Movie::from_new(id, movie);
        inner.movies.push(movie.clone());
        Ok(movie)
    }

    async fn create_movies(&self, movies: Vec<NewMovie>) -> AppResult<Vec<Movie>> {
        let mut inner = self.inner.write().await;
        let created: Vec<Movie> = movies
            .into_iter()
            .map(|movie| Movie::from_new(StoreInner::next_id(&mut inner.next_movie_id), movie))
            .collect();
        inner.movies.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_movie(&self, id: MovieId, update: MovieUpdate) -> AppResult<Option<Movie>> {
        let mut inner = self.inner.write().await;
        Ok(inner.movies.iter_mut().find(|m| m.id == id).map(|movie| {
            movie.apply(update);
            movie.clone()
        }))
    }

    async fn delete_movie(&self, id: MovieId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.movies.len();
        inner.movies.retain(|m| m.id != id);
        let deleted = inner.movies.len() != before;
        if deleted {
            inner.ratings.retain(|r| r.movie_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl RatingStore for InMemoryStore {
    async fn list_user_ratings(&self, user_id: UserId) -> AppResult<Vec<RatedMovie>> {
        let inner = self.inner.read().await;
        let rated = inner
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                let movie = inner.movies.iter().find(|m| m.id == r.movie_id)?;
                Some(RatedMovie {
                    movie_id: movie.id,
                    title: movie.title.clone(),
                    genres: movie.genres.clone(),
                    actors: movie.actors.clone(),
                    directors: movie.directors.clone(),
                    rating: r.rating,
                })
            })
            .collect();
        Ok(rated)
    }

    async fn list_ratings(&self, skip: i64, limit: i64) -> AppResult<Vec<Rating>> {
        Ok(page(&self.inner.read().await.ratings, skip, limit))
    }

    async fn list_movie_ratings(&self, movie_id: MovieId) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn get_rating(&self, id: i64) -> AppResult<Option<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner.ratings.iter().find(|r| r.id == id).cloned())
    }

    async fn upsert_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
        {
            existing.rating = score;
            return Ok(existing.clone());
        }

        let rating = Rating {
            id: StoreInner::next_id(&mut inner.next_rating_id),
            user_id,
            movie_id,
            rating: score,
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn update_rating(&self, id: i64, score: i32) -> AppResult<Option<Rating>> {
        let mut inner = self.inner.write().await;
        Ok(inner.ratings.iter_mut().find(|r| r.id == id).map(|rating| {
            rating.rating = score;
            rating.clone()
        }))
    }

    async fn delete_rating(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.ratings.len();
        inner.ratings.retain(|r| r.id != id);
        Ok(inner.ratings.len() != before)
    }
}

#[async_trait::async_trait]
impl FavoritesStore for InMemoryStore {
    async fn list_favorites(
        &self,
        user_id: UserId,
        kind: FavoriteKind,
    ) -> AppResult<Vec<Favorite>> {
        let inner = self.inner.read().await;
        Ok(inner
            .favorites
            .iter()
            .filter(|(k, f)| *k == kind && f.user_id == user_id)
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn add_favorite(
        &self,
        user_id: UserId,
        kind: FavoriteKind,
        name: &str,
    ) -> AppResult<Favorite> {
        let mut inner = self.inner.write().await;
        if let Some((_, existing)) = inner
            .favorites
            .iter()
            .find(|(k, f)| *k == kind && f.user_id == user_id && f.name == name)
        {
            return Ok(existing.clone());
        }

        let favorite = Favorite {
            id: StoreInner::next_id(&mut inner.next_favorite_id),
            user_id,
            name: name.to_string(),
        };
        inner.favorites.push((kind, favorite.clone()));
        Ok(favorite)
    }
}

/// Process-local key-value cache with per-entry expiration
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires)| Instant::now() < *expires);
        entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            genres: vec!["Drama".to_string()],
            actors: None,
            directors: None,
        }
    }

    #[tokio::test]
    async fn test_movies_get_sequential_ids() {
        let store = InMemoryStore::new();
        let first = store.create_movie(new_movie("A")).await.unwrap();
        let second = store.create_movie(new_movie("B")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list_movies(1, 10).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn test_upsert_rating_replaces_previous_score() {
        let store = InMemoryStore::new();
        let movie = store.create_movie(new_movie("A")).await.unwrap();

        let first = store.upsert_rating(7, movie.id, 2).await.unwrap();
        let second = store.upsert_rating(7, movie.id, 5).await.unwrap();

        assert_eq!(first.id, second.id);
        let rated = store.list_user_ratings(7).await.unwrap();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].rating, 5);
        assert_eq!(rated[0].title, "A");
    }

    #[tokio::test]
    async fn test_one_user_may_rate_many_movies() {
        let store = InMemoryStore::new();
        let a = store.create_movie(new_movie("A")).await.unwrap();
        let b = store.create_movie(new_movie("B")).await.unwrap();

        store.upsert_rating(1, a.id, 3).await.unwrap();
        store.upsert_rating(1, b.id, 4).await.unwrap();
        store.upsert_rating(2, a.id, 1).await.unwrap();

        assert_eq!(store.list_user_ratings(1).await.unwrap().len(), 2);
        assert_eq!(store.list_movie_ratings(a.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_favorites_are_scoped_per_user() {
        let store = InMemoryStore::new();

        store.add_favorite(1, FavoriteKind::Actor, "Al Pacino").await.unwrap();
        store.add_favorite(1, FavoriteKind::Actor, "Al Pacino").await.unwrap();
        store.add_favorite(2, FavoriteKind::Actor, "Al Pacino").await.unwrap();
        store
            .add_favorite(1, FavoriteKind::Director, "Michael Mann")
            .await
            .unwrap();

        assert_eq!(store.list_favorite_actors(1).await.unwrap(), vec!["Al Pacino"]);
        assert_eq!(store.list_favorite_actors(2).await.unwrap(), vec!["Al Pacino"]);
        assert_eq!(
            store.list_favorite_directors(1).await.unwrap(),
            vec!["Michael Mann"]
        );
        assert!(store.list_favorite_directors(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_movie_removes_its_ratings() {
        let store = InMemoryStore::new();
        let movie = store.create_movie(new_movie("A")).await.unwrap();
        store.upsert_rating(1, movie.id, 4).await.unwrap();

        assert!(store.delete_movie(movie.id).await.unwrap());
        assert!(!store.delete_movie(movie.id).await.unwrap());
        assert!(store.list_movie_ratings(movie.id).await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_records_are_reported_as_absent() {
        let store = InMemoryStore::new();

        let updated = tokio_test::block_on(store.update_movie(42, MovieUpdate::default()));
        assert_eq!(tokio_test::assert_ok!(updated), None);

        let rating = tokio_test::block_on(store.update_rating(42, 3));
        assert_eq!(tokio_test::assert_ok!(rating), None);

        let deleted = tokio_test::block_on(store.delete_rating(42));
        assert!(!tokio_test::assert_ok!(deleted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_entries_expire() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("recommendations:1", "[]".to_string(), 10)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("recommendations:1").await.unwrap(), Some("[]".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("recommendations:1").await.unwrap(), None);
    }
}
