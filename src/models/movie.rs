use serde::{Deserialize, Serialize};

use super::MovieId;

/// A movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub actors: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
}

/// Payload for creating a movie
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Option<Vec<String>>,
    #[serde(default)]
    pub directors: Option<Vec<String>>,
}

/// Partial update of a movie; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub genres: Option<Vec<String>>,
    pub actors: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
}

impl Movie {
    /// Builds a movie record from a create payload and its assigned id
    pub fn from_new(id: MovieId, movie: NewMovie) -> Self {
        Self {
            id,
            title: movie.title,
            genres: movie.genres,
            actors: movie.actors,
            directors: movie.directors,
        }
    }

    /// Applies the fields present in `update`
    pub fn apply(&mut self, update: MovieUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(genres) = update.genres {
            self.genres = genres;
        }
        if let Some(actors) = update.actors {
            self.actors = Some(actors);
        }
        if let Some(directors) = update.directors {
            self.directors = Some(directors);
        }
    }
}
