use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use crate::models::{Movie, MovieId};

/// Categorical attribute of a movie that becomes one-hot columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Genre,
    Actor,
    Director,
}

impl Category {
    /// The attribute list this category reads; absent lists are empty
    pub fn values<'a>(&self, movie: &'a Movie) -> &'a [String] {
        match self {
            Category::Genre => &movie.genres,
            Category::Actor => movie.actors.as_deref().unwrap_or_default(),
            Category::Director => movie.directors.as_deref().unwrap_or_default(),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Genre => write!(f, "genre"),
            Category::Actor => write!(f, "actor"),
            Category::Director => write!(f, "director"),
        }
    }
}

/// One encoded movie: identity columns plus indicator cells
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub movie_id: MovieId,
    pub title: String,
    pub indicators: Vec<f64>,
}

/// One-hot table of a single category over the catalog
///
/// There is one column per distinct trimmed category value, in the order values
/// are first seen while walking the catalog. Rows keep the catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub category: Category,
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Indicator of `name` for the movie `movie_id`, if both exist
    pub fn indicator(&self, movie_id: MovieId, name: &str) -> Option<f64> {
        let column = self.column_index(name)?;
        self.rows
            .iter()
            .find(|row| row.movie_id == movie_id)
            .map(|row| row.indicators[column])
    }
}

/// Encodes every value of `category` as an unrestricted indicator
pub fn encode(movies: &[Movie], category: Category) -> FeatureTable {
    encode_with(movies, category, |_| true)
}

/// Encodes `category`, setting indicators only for values in `favorites`
///
/// Values not in `favorites` still get a column, filled with zeros.
pub fn encode_restricted(
    movies: &[Movie],
    category: Category,
    favorites: &HashSet<String>,
) -> FeatureTable {
    encode_with(movies, category, |value| favorites.contains(value))
}

fn encode_with<F>(movies: &[Movie], category: Category, is_set: F) -> FeatureTable
where
    F: Fn(&str) -> bool,
{
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut hits: Vec<Vec<(usize, bool)>> = Vec::with_capacity(movies.len());

    for movie in movies {
        let mut movie_hits = Vec::new();
        for raw in category.values(movie) {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            let column = match positions.get(value) {
                Some(&column) => column,
                None => {
                    columns.push(value.to_string());
                    positions.insert(value.to_string(), columns.len() - 1);
                    columns.len() - 1
                }
            };
            movie_hits.push((column, is_set(value)));
        }
        hits.push(movie_hits);
    }

    let rows = movies
        .iter()
        .zip(hits)
        .map(|(movie, movie_hits)| {
            let mut indicators = vec![0.0; columns.len()];
            for (column, set) in movie_hits {
                if set {
                    indicators[column] = 1.0;
                }
            }
            FeatureRow {
                movie_id: movie.id,
                title: movie.title.clone(),
                indicators,
            }
        })
        .collect();

    FeatureTable {
        category,
        columns,
        rows,
    }
}

/// Trimmed, non-blank favorite names
pub fn favorite_set<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// The three per-category tables of one catalog snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCatalog {
    pub genres: FeatureTable,
    pub actors: FeatureTable,
    pub directors: FeatureTable,
}

impl EncodedCatalog {
    /// Genres are encoded unrestricted, actors and directors against the user's favorites
    pub fn encode(
        movies: &[Movie],
        favorite_actors: &HashSet<String>,
        favorite_directors: &HashSet<String>,
    ) -> Self {
        Self {
            genres: encode(movies, Category::Genre),
            actors: encode_restricted(movies, Category::Actor, favorite_actors),
            directors: encode_restricted(movies, Category::Director, favorite_directors),
        }
    }

    pub fn tables(&self) -> [&FeatureTable; 3] {
        [&self.genres, &self.actors, &self.directors]
    }
}
