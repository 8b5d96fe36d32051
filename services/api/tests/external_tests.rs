//! Integration tests for the external metadata search and import endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn anime_record() -> Value {
    json!({
        "data": {
            "mal_id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "title_japanese": "鋼の錬金術師 FULLMETAL ALCHEMIST",
            "synopsis": "After a horrific alchemy experiment goes wrong...",
            "images": {
                "jpg": {
                    "image_url": "https://cdn.test/5114.jpg",
                    "large_image_url": "https://cdn.test/5114l.jpg"
                }
            },
            "genres": [{ "mal_id": 1, "name": "Action" }, { "mal_id": 2, "name": "Adventure" }],
            "airing": false,
            "score": 9.1,
            "year": 2009,
            "episodes": 64
        }
    })
}

#[tokio::test]
async fn test_search_is_passed_through() {
    let app = TestApp::new().await;
    let upstream = json!({
        "pagination": { "current_page": 2, "has_next_page": false },
        "data": [{ "mal_id": 1, "title": "Cowboy Bebop" }]
    });
    Mock::given(method("GET"))
        .and(path("/anime"))
        .and(query_param("q", "bebop"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&app.jikan)
        .await;

    let response = app
        .server()
        .get("/api/external/search")
        .add_query_param("q", "bebop")
        .add_query_param("page", 2)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), upstream);
}

#[tokio::test]
async fn test_search_upstream_failure_is_server_error() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/anime"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.jikan)
        .await;

    let response = app
        .server()
        .get("/api/external/search")
        .add_query_param("q", "bebop")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "upstream_error");
}

#[tokio::test]
async fn test_import_maps_fields_and_rejects_duplicates() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/anime/5114"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anime_record()))
        .expect(1)
        .mount(&app.jikan)
        .await;

    let response = app.server().post("/api/external/import/5114").await;
    response.assert_status_ok();
    let created: Value = response.json();
    assert_eq!(created["message"], "Title imported successfully");

    let title: Value = app
        .server()
        .get(&format!("/api/titles/{}", created["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(title["external_id"], 5114);
    assert_eq!(title["name"], "Fullmetal Alchemist: Brotherhood");
    assert_eq!(title["name_native"], "鋼の錬金術師 FULLMETAL ALCHEMIST");
    assert_eq!(title["cover_image"], "https://cdn.test/5114l.jpg");
    assert_eq!(title["banner_image"], "https://cdn.test/5114l.jpg");
    assert_eq!(title["genres"], json!(["Action", "Adventure"]));
    assert_eq!(title["status"], "completed");
    assert_eq!(title["rating"], 9.1);
    assert_eq!(title["release_year"], 2009);
    assert_eq!(title["total_episode_count"], 64);
    assert_eq!(title["episodes"], json!([]));
    assert_eq!(title["origin"], "imported");

    // The duplicate is rejected before the provider is called again.
    let duplicate = app.server().post("/api/external/import/5114").await;
    duplicate.assert_status_bad_request();
    assert_eq!(duplicate.json::<Value>()["error"], "conflict");

    let listing: Value = app.server().get("/api/titles").await.json();
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn test_airing_record_imports_as_ongoing() {
    let app = TestApp::new().await;
    let mut record = anime_record();
    record["data"]["mal_id"] = json!(52991);
    record["data"]["airing"] = json!(true);
    Mock::given(method("GET"))
        .and(path("/anime/52991"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .mount(&app.jikan)
        .await;

    let created: Value = app.server().post("/api/external/import/52991").await.json();
    let title: Value = app
        .server()
        .get(&format!("/api/titles/{}", created["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(title["status"], "ongoing");
}

#[tokio::test]
async fn test_import_of_unknown_record_is_not_found() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/anime/999999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.jikan)
        .await;

    app.server()
        .post("/api/external/import/999999")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let listing: Value = app.server().get("/api/titles").await.json();
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
async fn test_import_upstream_failure_is_server_error() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/anime/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.jikan)
        .await;

    app.server()
        .post("/api/external/import/1")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_import_with_non_numeric_id_is_bad_request() {
    let app = TestApp::new().await;

    app.server()
        .post("/api/external/import/fma")
        .await
        .assert_status_bad_request();
}
