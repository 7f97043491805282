use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use recsys_api::routes::{create_router, AppState};

fn create_test_server() -> TestServer {
    let state = Arc::new(AppState::in_memory(20, 600));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn user_header(user_id: i64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    )
}

async fn create_movie(server: &TestServer, body: Value) -> i64 {
    let (name, value) = user_header(1);
    let response = server
        .post("/api/v1/movies")
        .add_header(name, value)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

async fn rate(server: &TestServer, user_id: i64, movie_id: i64, rating: i32) -> Value {
    let (name, value) = user_header(user_id);
    let response = server
        .post(&format!("/api/v1/movies/{}/ratings", movie_id))
        .add_header(name, value)
        .json(&json!({ "rating": rating }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn seed_catalog(server: &TestServer) -> Vec<i64> {
    let mut ids = Vec::new();
    for body in [
        json!({ "title": "Heat", "genres": ["Crime", "Action"], "actors": ["Al Pacino"], "directors": ["Michael Mann"] }),
        json!({ "title": "Collateral", "genres": ["Crime", "Action"], "actors": ["Tom Cruise"], "directors": ["Michael Mann"] }),
        json!({ "title": "Scarface", "genres": ["Crime"], "actors": ["Al Pacino"], "directors": ["Brian De Palma"] }),
        json!({ "title": "Up", "genres": ["Animation"], "actors": ["Ed Asner"], "directors": ["Pete Docter"] }),
    ] {
        ids.push(create_movie(server, body).await);
    }
    ids
}

fn titles(movies: &[Value]) -> Vec<&str> {
    movies.iter().map(|m| m["title"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_response_echoes_request_id() {
    let server = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_api_requires_user_header() {
    let server = create_test_server();
    let response = server.get("/api/v1/movies").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_movie_crud() {
    let server = create_test_server();
    let id = create_movie(
        &server,
        json!({ "title": "Heat", "genres": ["Crime"], "actors": ["Al Pacino"] }),
    )
    .await;

    let (name, value) = user_header(1);
    let response = server
        .get(&format!("/api/v1/movies/{}", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let movie: Value = response.json();
    assert_eq!(movie["title"], "Heat");
    assert_eq!(movie["directors"], Value::Null);

    let response = server
        .patch(&format!("/api/v1/movies/{}", id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "directors": ["Michael Mann"] }))
        .await;
    response.assert_status_ok();
    let movie: Value = response.json();
    assert_eq!(movie["title"], "Heat");
    assert_eq!(movie["directors"], json!(["Michael Mann"]));

    let response = server
        .get("/api/v1/movies")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>().len(), 1);

    let response = server
        .delete(&format!("/api/v1/movies/{}", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Movie deleted");

    let response = server
        .get(&format!("/api/v1/movies/{}", id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_title_is_rejected_on_create_and_update() {
    let server = create_test_server();
    let id = create_movie(&server, json!({ "title": "Heat", "genres": ["Crime"] })).await;

    let (name, value) = user_header(1);
    let response = server
        .post("/api/v1/movies")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "title": " ", "genres": ["Crime"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .patch(&format!("/api/v1/movies/{}", id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "title": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get(&format!("/api/v1/movies/{}", id))
        .add_header(name, value)
        .await;
    assert_eq!(response.json::<Value>()["title"], "Heat");
}

#[tokio::test]
async fn test_movie_listing_is_paginated() {
    let server = create_test_server();
    seed_catalog(&server).await;

    let (name, value) = user_header(1);
    let response = server
        .get("/api/v1/movies")
        .add_query_param("skip", 1)
        .add_query_param("limit", 2)
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();
    assert_eq!(titles(&movies), vec!["Collateral", "Scarface"]);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let server = create_test_server();
    let id = create_movie(&server, json!({ "title": "Heat", "genres": ["Crime"] })).await;

    let (name, value) = user_header(1);
    let response = server
        .post(&format!("/api/v1/movies/{}/ratings", id))
        .add_header(name, value)
        .json(&json!({ "rating": 6 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rating_unknown_movie_is_not_found() {
    let server = create_test_server();

    let (name, value) = user_header(1);
    let response = server
        .post("/api/v1/movies/999/ratings")
        .add_header(name, value)
        .json(&json!({ "rating": 3 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rerating_replaces_previous_rating() {
    let server = create_test_server();
    let id = create_movie(&server, json!({ "title": "Heat", "genres": ["Crime"] })).await;

    rate(&server, 1, id, 2).await;
    rate(&server, 1, id, 5).await;

    let (name, value) = user_header(1);
    let response = server.get("/api/v1/users/ratings").add_header(name, value).await;
    response.assert_status_ok();
    let ratings: Vec<Value> = response.json();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["rating"], 5);
    assert_eq!(ratings[0]["title"], "Heat");
}

#[tokio::test]
async fn test_only_owner_may_change_rating() {
    let server = create_test_server();
    let movie_id = create_movie(&server, json!({ "title": "Heat", "genres": ["Crime"] })).await;
    let rating_id = rate(&server, 1, movie_id, 4).await["id"].as_i64().unwrap();

    let (name, value) = user_header(2);
    let response = server
        .patch(&format!("/api/v1/ratings/{}", rating_id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "rating": 1 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/api/v1/ratings/{}", rating_id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let (name, value) = user_header(1);
    let response = server
        .patch(&format!("/api/v1/ratings/{}", rating_id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "rating": 1 }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["rating"], 1);

    let response = server
        .delete(&format!("/api/v1/ratings/{}", rating_id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();

    let response = server
        .delete(&format!("/api/v1/ratings/{}", rating_id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorites_are_idempotent_and_trimmed() {
    let server = create_test_server();

    let (name, value) = user_header(1);
    for actor in ["Al Pacino", "  Al Pacino "] {
        let response = server
            .post("/api/v1/users/favorites/actors")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": actor }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    let response = server
        .post("/api/v1/users/favorites/directors")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "   " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/v1/users/favorites/actors")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let favorites: Vec<Value> = response.json();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["name"], "Al Pacino");

    let response = server
        .get("/api/v1/users/favorites/directors")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert!(response.json::<Vec<Value>>().is_empty());
}

#[tokio::test]
async fn test_user_without_ratings_gets_no_recommendations() {
    let server = create_test_server();
    seed_catalog(&server).await;

    let (name, value) = user_header(7);
    let response = server
        .get("/api/v1/users/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert!(response.json::<Vec<Value>>().is_empty());
}

#[tokio::test]
async fn test_recommendations_rank_unseen_overlapping_movies() {
    let server = create_test_server();
    let ids = seed_catalog(&server).await;
    rate(&server, 1, ids[0], 5).await;

    let (name, value) = user_header(1);
    let response = server
        .post("/api/v1/users/favorites/directors")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "Michael Mann" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .get("/api/v1/users/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();

    // Up shares no feature with Heat; Heat itself is already rated
    assert_eq!(titles(&movies), vec!["Collateral", "Scarface"]);
}

#[tokio::test]
async fn test_recommendations_are_served_from_cache() {
    let server = create_test_server();
    let ids = seed_catalog(&server).await;
    rate(&server, 1, ids[0], 5).await;

    let (name, value) = user_header(1);
    let first: Vec<Value> = server
        .get("/api/v1/users/recommendations")
        .add_header(name.clone(), value.clone())
        .await
        .json();

    rate(&server, 1, ids[1], 5).await;

    let second: Vec<Value> = server
        .get("/api/v1/users/recommendations")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(titles(&first), vec!["Collateral", "Scarface"]);
    assert_eq!(first, second);
}
