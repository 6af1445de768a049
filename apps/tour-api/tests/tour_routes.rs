use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use tour_api::{
    AppState,
    application::middleware::Claims,
    config::{
        Config, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_WINDOW, Environment,
    },
    create_app,
};
use tour_core::{TourStore, adapters::in_memory_store::InMemoryTourStore};

const SECRET: &str = "integration-secret";

// Helper function to set up the test application with in-memory dependencies
fn setup_test_app() -> TestServer {
    let config = Config {
        environment: Environment::Production,
        port: 0,
        jwt_secret: SECRET.to_string(),
        body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
        rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
    };
    let store: Arc<dyn TourStore> = Arc::new(InMemoryTourStore::default());
    TestServer::new(create_app(AppState::new(store, &config))).expect("Failed to create TestServer")
}

fn token() -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "guide-1".into(),
        iat: now,
        exp: now + 600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn forest_hiker() -> Value {
    json!({
        "name": "The Forest Hiker",
        "duration": 5,
        "maxGroupSize": 25,
        "difficulty": "easy",
        "price": 397,
        "summary": "Breathtaking hike through the Canadian Banff National Park",
        "imageCover": "tour-1-cover.jpg",
        "startDates": ["2021-04-25T09:00:00Z"]
    })
}

async fn create(server: &TestServer, body: &Value) -> Value {
    let response = server
        .post("/api/v1/tours")
        .authorization_bearer(token())
        .json(body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_tour_lifecycle() {
    let server = setup_test_app();

    let created = create(&server, &forest_hiker()).await;
    assert_eq!(created["status"], "success");
    let tour = &created["data"]["tour"];
    assert_eq!(tour["name"], "The Forest Hiker");
    assert_eq!(tour["ratingsAverage"], 4.5);
    let id = tour["id"].as_str().unwrap().to_string();

    let fetched = server.get(&format!("/api/v1/tours/{id}")).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.json::<Value>()["data"]["tour"]["id"], id.as_str());

    let updated = server
        .patch(&format!("/api/v1/tours/{id}"))
        .authorization_bearer(token())
        .json(&json!({"price": 497}))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(updated.json::<Value>()["data"]["tour"]["price"], 497.0);

    let deleted = server
        .delete(&format!("/api/v1/tours/{id}"))
        .authorization_bearer(token())
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = server.get(&format!("/api/v1/tours/{id}")).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        gone.json::<Value>(),
        json!({"status": "fail", "message": "No tour found with that ID"})
    );
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let server = setup_test_app();
    create(&server, &forest_hiker()).await;

    let mut sea = forest_hiker();
    sea["name"] = json!("The Sea Explorer");
    sea["duration"] = json!(7);
    sea["difficulty"] = json!("medium");
    sea["price"] = json!(497);
    create(&server, &sea).await;

    let mut snow = forest_hiker();
    snow["name"] = json!("The Snow Adventurer");
    snow["price"] = json!(997);
    create(&server, &snow).await;

    let response = server
        .get("/api/v1/tours?duration=5&difficulty=easy&sort=-price")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "success");
    assert_eq!(body["results"], 2);
    assert!(body["requestedAt"].is_string());
    let names: Vec<&str> = body["data"]["tours"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["The Snow Adventurer", "The Forest Hiker"]);

    let paged = server.get("/api/v1/tours?sort=price&page=2&limit=2").await;
    assert_eq!(paged.json::<Value>()["results"], 1);
}

#[tokio::test]
async fn test_security_headers_on_success() {
    let server = setup_test_app();
    let response = server.get("/api/v1/tours").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
}

#[tokio::test]
async fn test_operator_keys_are_stripped() {
    let server = setup_test_app();
    let mut body = forest_hiker();
    body["$where"] = json!("sleep(1000)");
    let created = create(&server, &body).await;
    assert!(created["data"]["tour"].get("$where").is_none());
}
