//! Bulk catalog import from CSV
//!
//! Expected columns are `title`, `genres`, `actors` and `directors`; any other
//! column (such as an exported index) is ignored. List columns hold a bracketed,
//! quoted list, e.g. `['Action', 'Sci-Fi']`.

use std::io::Read;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{error::AppResult, models::NewMovie, services::sources::MovieStore};

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    title: String,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    actors: Option<String>,
    #[serde(default)]
    directors: Option<String>,
}

/// Splits a bracketed list literal into its raw items
///
/// Items may be single- or double-quoted, with backslash escapes inside quotes;
/// unquoted items run until the next comma.
fn parse_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut chars = raw.trim().trim_start_matches('[').trim_end_matches(']').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let mut item = String::new();
                while let Some(next) = chars.next() {
                    match next {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                item.push(escaped);
                            }
                        }
                        q if q == c => break,
                        other => item.push(other),
                    }
                }
                items.push(item);
            }
            ',' => {}
            c if c.is_whitespace() => {}
            first => {
                let mut item = first.to_string();
                while let Some(&next) = chars.peek() {
                    if next == ',' {
                        break;
                    }
                    item.push(next);
                    chars.next();
                }
                items.push(item);
            }
        }
    }

    items
}

/// Trims every value and drops blanks; `None` when nothing is left
fn clean_values(raw: Option<&str>) -> Option<Vec<String>> {
    let values: Vec<String> = parse_list(raw?)
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Reads catalog rows into create payloads
///
/// Rows with a blank title are skipped with a warning.
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<NewMovie>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut movies = Vec::new();

    for (line, result) in reader.deserialize::<CatalogRecord>().enumerate() {
        let record = result.with_context(|| format!("Failed to parse catalog row {}", line + 1))?;

        let title = record.title.trim();
        if title.is_empty() {
            tracing::warn!(row = line + 1, "Skipping catalog row without a title");
            continue;
        }

        movies.push(NewMovie {
            title: title.to_string(),
            genres: clean_values(record.genres.as_deref()).unwrap_or_default(),
            actors: clean_values(record.actors.as_deref()),
            directors: clean_values(record.directors.as_deref()),
        });
    }

    Ok(movies)
}

/// Stores movies in batches of `batch_size`, each batch atomically
///
/// Returns the number of movies stored.
pub async fn import_catalog(
    store: &dyn MovieStore,
    movies: Vec<NewMovie>,
    batch_size: usize,
) -> AppResult<usize> {
    let mut imported = 0;
    let mut remaining = movies.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<NewMovie> = remaining.by_ref().take(batch_size.max(1)).collect();
        imported += store.create_movies(batch).await?.len();
        tracing::info!(imported, "Catalog batch stored");
    }

    Ok(imported)
}
