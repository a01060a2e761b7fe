//! Route tests against an in-memory store and the real auth provider.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{TimeZone, Utc};
use sb_api::{configure_routes, AppState};
use sb_auth_simple::SimpleAuthProvider;
use sb_core::models::NewArticle;
use sb_core::traits::NewsStore;
use sb_db_sqlite::SqliteStore;
use secrecy::SecretString;
use serde_json::{json, Value};

async fn state() -> (web::Data<AppState>, SqliteStore) {
    let store = SqliteStore::new("sqlite::memory:").await.unwrap();
    let auth = SimpleAuthProvider::new(&SecretString::from("api-test-secret".to_string()));
    let data = web::Data::new(AppState {
        forum: Arc::new(store.clone()),
        users: Arc::new(store.clone()),
        news: Arc::new(store.clone()),
        auth: Arc::new(auth),
    });
    (data, store)
}

/// Sends a request and returns the status with the decoded JSON body.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let bytes = test::read_body(resp).await;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }};
}

macro_rules! app {
    ($data:expr) => {
        test::init_service(App::new().app_data($data.clone()).configure(configure_routes)).await
    };
}

fn bearer(token: &Value) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token.as_str().unwrap()))
}

#[actix_web::test]
async fn signup_login_refresh_flow() {
    let (data, _) = state().await;
    let app = app!(data);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/signup")
            .set_json(json!({"username": "amina", "password": "s3cret"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].is_string());

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/signup")
            .set_json(json!({"username": "amina", "password": "other"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"username": "amina", "password": "wrong"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"username": "amina", "password": "s3cret"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(login["user_id"].is_i64());

    // An access token cannot be used to refresh.
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/refresh")
            .insert_header(bearer(&login["access_token"]))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/refresh")
            .insert_header(bearer(&login["refresh_token"]))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
}

#[actix_web::test]
async fn signup_requires_both_fields() {
    let (data, _) = state().await;
    let app = app!(data);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/signup")
            .set_json(json!({"username": "amina"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn posts_and_comments() {
    let (data, _) = state().await;
    let app = app!(data);

    let (_, signup) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/signup")
            .set_json(json!({"username": "leila", "password": "pw"}))
    );
    let token = signup["access_token"].clone();

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "Hello", "content": "First post", "category": "support"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(json!({"title": "Hello", "content": "", "category": "support"}))
    );
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(json!({"title": "Hello", "content": "First post", "category": "support"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["post"]["author"], "leila");
    let post_id = created["post"]["id"].as_i64().unwrap();

    let (status, listed) = send!(app, test::TestRequest::get().uri("/api/posts"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(listed[0]["timestamp"].is_string());

    let (status, post) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/posts/{post_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["title"], "Hello");

    let (status, _) = send!(app, test::TestRequest::get().uri("/api/posts/9999"));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/posts/{post_id}/comments"))
            .insert_header(bearer(&token))
            .set_json(json!({"content": "  "}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/posts/9999/comments")
            .insert_header(bearer(&token))
            .set_json(json!({"content": "lost"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/posts/{post_id}/comments"))
            .insert_header(bearer(&token))
            .set_json(json!({"content": "Welcome!"}))
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, comments) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/posts/{post_id}/comments"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comments[0]["content"], "Welcome!");
    assert_eq!(comments[0]["author"], "leila");
}

#[actix_web::test]
async fn search_matches_title_or_content() {
    let (data, _) = state().await;
    let app = app!(data);

    let (_, signup) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/signup")
            .set_json(json!({"username": "noor", "password": "pw"}))
    );
    let token = signup["access_token"].clone();
    let posts = [
        ("Legal aid", "Where to find help"),
        ("Meetup", "legal clinic on Friday"),
        ("Books", "Reading list"),
    ];
    for (title, content) in posts {
        let (status, _) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(bearer(&token))
                .set_json(json!({"title": title, "content": content, "category": "general"}))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, found) = send!(app, test::TestRequest::get().uri("/api/search?q=LEGAL"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn articles_are_listed_newest_first() {
    let (data, store) = state().await;
    let fetched = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
    let mut batch = store.begin().await.unwrap();
    for (day, title) in [(1, "Equality march draws crowds"), (3, "New equality law"), (2, "Weather")] {
        batch
            .insert(NewArticle {
                title: title.to_string(),
                description: None,
                url: format!("https://news.example/{day}"),
                image: None,
                published_at: Some(Utc.with_ymd_and_hms(2024, 10, day, 9, 0, 0).unwrap()),
                fetched_at: fetched,
            })
            .await
            .unwrap();
    }
    batch.commit().await.unwrap();

    let app = app!(data);
    let (status, articles) = send!(app, test::TestRequest::get().uri("/api/articles?q=equality"));

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = articles
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["New equality law", "Equality march draws crowds"]);
}
