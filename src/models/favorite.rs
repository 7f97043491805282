use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::UserId;

/// Which kind of person a favorite refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    Actor,
    Director,
}

impl FavoriteKind {
    /// Backing table of this favorite kind
    pub fn table(&self) -> &'static str {
        match self {
            FavoriteKind::Actor => "favorite_actors",
            FavoriteKind::Director => "favorite_directors",
        }
    }
}

impl Display for FavoriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FavoriteKind::Actor => write!(f, "actor"),
            FavoriteKind::Director => write!(f, "director"),
        }
    }
}

/// A favorite actor or director of one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Favorite {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
}

/// Payload for registering a favorite
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteInput {
    pub name: String,
}
