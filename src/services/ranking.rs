use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::MovieId,
    services::profile::{FeatureMatrix, TasteProfile},
};

/// Result of scoring one catalog movie against a taste profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
    /// Fraction of the profile weight the movie matches, in (0, 1]
    Match(f64),
    /// The movie shares no weighted feature with the profile
    NoOverlap,
    /// Normalization is undefined, e.g. the profile has no weight at all
    Undefined,
}

impl ScoreOutcome {
    fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            ScoreOutcome::Undefined
        } else if score == 0.0 {
            ScoreOutcome::NoOverlap
        } else {
            ScoreOutcome::Match(score)
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            ScoreOutcome::Match(score) => Some(*score),
            _ => None,
        }
    }
}

/// A recommendable movie with its normalized score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f64,
}

/// Scores every catalog row as `row . profile / sum(profile)`
///
/// Rows keep the catalog order. Fails when the matrix and the profile were not
/// built over the same columns.
pub fn score(matrix: &FeatureMatrix, profile: &TasteProfile) -> AppResult<Vec<(MovieId, ScoreOutcome)>> {
    if matrix.columns != profile.columns {
        return Err(AppError::Internal(
            "Taste profile and catalog features have different columns".to_string(),
        ));
    }

    let total = profile.total_weight();

    Ok(matrix
        .rows
        .iter()
        .map(|(movie_id, values)| {
            let raw: f64 = values
                .iter()
                .zip(&profile.weights)
                .map(|(indicator, weight)| indicator * weight)
                .sum();
            (*movie_id, ScoreOutcome::from_score(raw / total))
        })
        .collect())
}

/// Ranks unseen movies by score and keeps the best `top_n`
///
/// Already rated movies and movies without a `Match` outcome are left out. The sort
/// is stable, so equal scores keep catalog order.
pub fn rank(
    matrix: &FeatureMatrix,
    profile: &TasteProfile,
    rated: &HashSet<MovieId>,
    top_n: usize,
) -> AppResult<Vec<ScoredMovie>> {
    if profile.is_degenerate() {
        return Ok(Vec::new());
    }

    let mut excluded = 0usize;
    let mut candidates: Vec<ScoredMovie> = score(matrix, profile)?
        .into_iter()
        .filter(|(movie_id, _)| !rated.contains(movie_id))
        .filter_map(|(movie_id, outcome)| match outcome.score() {
            Some(score) => Some(ScoredMovie { movie_id, score }),
            None => {
                excluded += 1;
                None
            }
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_n);

    tracing::debug!(
        ranked = candidates.len(),
        excluded,
        "Ranked catalog against taste profile"
    );

    Ok(candidates)
}
