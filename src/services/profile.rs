use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use crate::{
    error::{AppError, AppResult},
    models::{validate_rating, MovieId, RatedMovie},
    services::features::{Category, EncodedCatalog},
};

/// A feature column qualified by its category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureColumn {
    pub category: Category,
    pub name: String,
}

impl Display for FeatureColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.name)
    }
}

/// Genre, actor and director indicators of every catalog movie, joined by movie id
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<FeatureColumn>,
    /// Catalog order is preserved
    pub rows: Vec<(MovieId, Vec<f64>)>,
}

impl FeatureMatrix {
    /// Inner-joins the three tables on movie id, dropping the identity columns
    pub fn combine(encoded: &EncodedCatalog) -> Self {
        let tables = encoded.tables();

        let columns = tables
            .iter()
            .flat_map(|table| {
                table.columns.iter().map(move |name| FeatureColumn {
                    category: table.category,
                    name: name.clone(),
                })
            })
            .collect();

        let lookups: Vec<HashMap<MovieId, &Vec<f64>>> = tables[1..]
            .iter()
            .map(|table| {
                table
                    .rows
                    .iter()
                    .map(|row| (row.movie_id, &row.indicators))
                    .collect()
            })
            .collect();

        let rows = tables[0]
            .rows
            .iter()
            .filter_map(|row| {
                let mut values = row.indicators.clone();
                for lookup in &lookups {
                    values.extend_from_slice(lookup.get(&row.movie_id)?);
                }
                Some((row.movie_id, values))
            })
            .collect();

        Self { columns, rows }
    }

    pub fn row(&self, movie_id: MovieId) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|(id, _)| *id == movie_id)
            .map(|(_, values)| values.as_slice())
    }
}

/// Rating-weighted sum of the features of the movies a user rated
#[derive(Debug, Clone, PartialEq)]
pub struct TasteProfile {
    pub columns: Vec<FeatureColumn>,
    pub weights: Vec<f64>,
}

impl TasteProfile {
    /// Builds the profile of a user from their ratings
    ///
    /// Each weight is the sum over rated movies of `indicator x rating`. Ratings
    /// outside the accepted range are rejected. Ratings of movies missing from the
    /// catalog are skipped, and a movie rated more than once counts with its last rating.
    pub fn build(matrix: &FeatureMatrix, ratings: &[RatedMovie]) -> AppResult<Self> {
        let mut by_movie: HashMap<MovieId, i32> = HashMap::new();
        for rated in ratings {
            let score = validate_rating(rated.rating).map_err(|_| {
                AppError::InvalidInput(format!(
                    "Malformed rating {} for movie {}",
                    rated.rating, rated.movie_id
                ))
            })?;
            by_movie.insert(rated.movie_id, score);
        }

        let mut weights = vec![0.0; matrix.columns.len()];
        let mut matched: HashSet<MovieId> = HashSet::new();

        for (movie_id, values) in &matrix.rows {
            let Some(&score) = by_movie.get(movie_id) else {
                continue;
            };
            matched.insert(*movie_id);
            for (weight, indicator) in weights.iter_mut().zip(values) {
                *weight += indicator * f64::from(score);
            }
        }

        let skipped = by_movie.len() - matched.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Ratings reference movies missing from the catalog");
        }

        Ok(Self {
            columns: matrix.columns.clone(),
            weights,
        })
    }

    /// Sum of all weights, the normalizer of every score
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// A profile with no positive weight cannot rank anything
    pub fn is_degenerate(&self) -> bool {
        self.total_weight() <= 0.0
    }

    pub fn weight(&self, column: &FeatureColumn) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.weights[i])
    }

    /// The `n` heaviest columns, heaviest first
    pub fn top_features(&self, n: usize) -> Vec<(String, f64)> {
        let mut features: Vec<(String, f64)> = self
            .columns
            .iter()
            .zip(&self.weights)
            .filter(|(_, w)| **w > 0.0)
            .map(|(c, w)| (c.to_string(), *w))
            .collect();
        features.sort_by(|a, b| b.1.total_cmp(&a.1));
        features.truncate(n);
        features
    }
}
