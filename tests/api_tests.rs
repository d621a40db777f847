use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;

use climatefit_api::{
    config::Config,
    error::{AppError, AppResult},
    models::{CityClimateProfile, ClimateRecord, SubmissionRecord, UserProfile, ANONYMOUS_EMAIL},
    routes::{create_router, AppState},
    services::{
        stores::{MemoryCatalogSource, MemoryProfileStore, ProfileStore, StaticArchiveSource},
        CatalogReader, ClimateArchive,
    },
};

const SECRET: &str = "integration-secret";

fn config() -> Config {
    Config::from_pairs(vec![
        ("JWT_SECRET".to_string(), SECRET.to_string()),
        ("STORAGE_BACKEND".to_string(), "memory".to_string()),
    ])
    .unwrap()
}

fn catalog() -> Vec<CityClimateProfile> {
    vec![
        CityClimateProfile {
            city_name: "Auckland".to_string(),
            country: "New Zealand".to_string(),
            hemisphere: "Southern".to_string(),
            avg_annual_temp: 17.0,
            summer_max_temp: 24.0,
            winter_min_temp: 10.0,
            summer_temp: 20.5,
            winter_temp: 11.2,
            temperature_range: 14.0,
            annual_precipitation: 12.0,
            driest_season: "summer".to_string(),
            wettest_season: "winter".to_string(),
            ..Default::default()
        },
        CityClimateProfile {
            city_name: "Oslo".to_string(),
            country: "Norway".to_string(),
            hemisphere: "Northern".to_string(),
            avg_annual_temp: 6.0,
            summer_max_temp: 22.0,
            winter_min_temp: -7.0,
            temperature_range: 29.0,
            annual_precipitation: 22.0,
            wettest_season: "autumn".to_string(),
            ..Default::default()
        },
        CityClimateProfile {
            city_name: "Cairo".to_string(),
            country: "Egypt".to_string(),
            avg_annual_temp: 22.0,
            summer_max_temp: 35.0,
            winter_min_temp: 9.0,
            temperature_range: 26.0,
            annual_precipitation: 1.0,
            ..Default::default()
        },
        CityClimateProfile {
            city_name: "Auckland".to_string(),
            country: "Testland".to_string(),
            avg_annual_temp: -20.0,
            ..Default::default()
        },
    ]
}

fn archive_records() -> Vec<ClimateRecord> {
    let record = |city: &str, year: i32, month: u32, quarter: &str| ClimateRecord {
        city_name: city.to_string(),
        country_code: "NZ".to_string(),
        quarter: quarter.to_string(),
        year,
        month,
        tavg: Some(15.0),
        prcp: Some(3.1),
        tmax: Some(19.0),
        tmin: Some(11.0),
        avg_lat: -36.85,
        avg_lon: 174.76,
        ..Default::default()
    };

    let mut dry = record("Wellington", 2024, 1, "2024-Q1");
    dry.prcp = None;

    vec![
        record("Auckland", 2024, 1, "2024-Q1"),
        record("Auckland", 2024, 2, "2024-Q1"),
        dry,
        record("Auckland", 2023, 12, "2023-Q4"),
    ]
}

struct TestApp {
    server: TestServer,
    store: Arc<MemoryProfileStore>,
}

fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryProfileStore::new());
    let server = create_test_server(store.clone());
    TestApp { server, store }
}

fn create_test_server(profiles: Arc<dyn ProfileStore>) -> TestServer {
    let config = config();
    let catalog = CatalogReader::new(
        Arc::new(MemoryCatalogSource::new(catalog())),
        config.store_timeout(),
    );
    let archive = ClimateArchive::new(
        Arc::new(StaticArchiveSource::new(archive_records())),
        config.archive_timeout(),
    );

    let state = Arc::new(AppState::new(config, catalog, profiles, archive));
    TestServer::new(create_router(state).unwrap()).unwrap()
}

fn token_for(claims: Value) -> String {
    let mut claims = claims;
    claims["exp"] = json!(chrono::Utc::now().timestamp() + 3600);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn jane_token() -> String {
    token_for(json!({
        "sub": "4f1c-jane",
        "email": "jane@example.com",
        "given_name": "Jane"
    }))
}

fn auckland_answers() -> Value {
    json!({
        "avgTemp": 17,
        "maxSummer": 24,
        "minWinter": 10
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app();

    let response = app
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("edge-42"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "edge-42");
}

#[tokio::test]
async fn test_anonymous_results() {
    let app = create_test_app();

    let response = app.server.post("/results").json(&auckland_answers()).await;

    response.assert_status_ok();
    let cities: Vec<Value> = response.json();
    assert_eq!(cities.len(), 3);
    assert_eq!(cities[0]["name"], "Auckland, New Zealand");
    let summary = cities[0]["summary"].as_str().unwrap();
    assert!(summary.starts_with("Hemisphere: Southern Hemisphere\n"));
    assert!(summary.contains("Summer average temperature: 20.5 °C"));
    assert!(summary.ends_with("Driest season: Summer"));

    let submissions: Vec<SubmissionRecord> = app.store.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].email, ANONYMOUS_EMAIL);
    assert_eq!(submissions[0].cities[0], "Auckland, New Zealand");
    assert!(app.store.get_profile(ANONYMOUS_EMAIL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_token_on_results_is_anonymous() {
    let app = create_test_app();

    let response = app
        .server
        .post("/results")
        .add_header(AUTHORIZATION, bearer("not-a-jwt"))
        .json(&auckland_answers())
        .await;

    response.assert_status_ok();
    let submissions = app.store.submissions().await;
    assert_eq!(submissions[0].email, ANONYMOUS_EMAIL);
}

#[tokio::test]
async fn test_results_with_no_answers_still_returns_cities() {
    let app = create_test_app();

    let response = app.server.post("/results").json(&json!({})).await;

    response.assert_status_ok();
    let cities: Vec<Value> = response.json();
    // Every score ties at zero, so catalog order wins
    assert_eq!(cities[0]["name"], "Auckland, New Zealand");
    assert_eq!(cities[1]["name"], "Oslo, Norway");
}

#[tokio::test]
async fn test_signed_in_results_update_history() {
    let app = create_test_app();

    let mut answers = auckland_answers();
    answers["save"] = json!(true);

    let response = app
        .server
        .post("/results")
        .add_header(AUTHORIZATION, bearer(&jane_token()))
        .json(&answers)
        .await;
    response.assert_status_ok();

    let profile = app
        .store
        .get_profile("jane@example.com")
        .await
        .unwrap()
        .expect("profile created on first submission");
    assert_eq!(profile.username, "Jane");
    assert_eq!(profile.history.len(), 1);
    assert_eq!(profile.history[0].cities[0], "Auckland, New Zealand");
    assert_eq!(profile.history[0].date.len(), "2025-09-07 17:10".len());
    assert_eq!(profile.preferences.unwrap().avg_temp, Some(17.0));
}

#[tokio::test]
async fn test_repeat_submission_is_deduplicated() {
    let app = create_test_app();

    for _ in 0..2 {
        app.server
            .post("/results")
            .add_header(AUTHORIZATION, bearer(&jane_token()))
            .json(&auckland_answers())
            .await
            .assert_status_ok();
    }

    let profile = app.store.get_profile("jane@example.com").await.unwrap().unwrap();
    // Two entries only when the submissions straddled a minute boundary
    assert!(
        profile.history.len() == 1 || profile.history[0].date != profile.history[1].date,
        "{:?}",
        profile.history
    );
    assert_eq!(app.store.submissions().await.len(), 2);
}

#[tokio::test]
async fn test_history_keeps_three_entries() {
    let app = create_test_app();

    let answers = [
        json!({"avgTemp": 17}),
        json!({"avgTemp": 5}),
        json!({"avgTemp": 25}),
        json!({"avgTemp": 17, "precipitation": "high"}),
    ];
    for body in &answers {
        app.server
            .post("/results")
            .add_header(AUTHORIZATION, bearer(&jane_token()))
            .json(body)
            .await
            .assert_status_ok();
    }

    let profile = app.store.get_profile("jane@example.com").await.unwrap().unwrap();
    assert_eq!(profile.history.len(), 3);
    assert_eq!(profile.history[0].cities[0], "Oslo, Norway");
    assert_eq!(profile.history[2].cities[0], "Auckland, New Zealand");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = create_test_app();

    app.server
        .get("/profile")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/profile")
        .add_header(AUTHORIZATION, bearer("not-a-jwt"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_is_created_on_first_visit() {
    let app = create_test_app();

    let response = app
        .server
        .get("/profile")
        .add_header(AUTHORIZATION, bearer(&jane_token()))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "jane@example.com");
    assert_eq!(body["username"], "Jane");
    assert!(body["preferences"].is_null());
    assert_eq!(body["history"], json!([]));
}

#[tokio::test]
async fn test_update_preferences() {
    let app = create_test_app();

    app.server
        .put("/profile/preferences")
        .add_header(AUTHORIZATION, bearer(&jane_token()))
        .json(&json!({"avgTemp": 21}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.store
        .create_profile(&UserProfile::new("jane@example.com"))
        .await
        .unwrap();

    let response = app
        .server
        .put("/profile/preferences")
        .add_header(AUTHORIZATION, bearer(&jane_token()))
        .json(&json!({"avgTemp": 21, "precipitation": "low"}))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"message": "Preferences updated successfully"}));

    let profile: Value = app
        .server
        .get("/profile")
        .add_header(AUTHORIZATION, bearer(&jane_token()))
        .await
        .json();
    assert_eq!(profile["preferences"]["avgTemp"], 21.0);
    assert_eq!(profile["preferences"]["precipitation"], "low");
}

#[tokio::test]
async fn test_city_list_is_distinct_and_sorted() {
    let app = create_test_app();

    let response = app.server.get("/api/cities").await;

    response.assert_status_ok();
    response.assert_json(&json!(["Auckland", "Cairo", "Oslo"]));
}

#[tokio::test]
async fn test_climate_months_and_quarters() {
    let app = create_test_app();

    app.server
        .get("/api/climate/months")
        .await
        .assert_json(&json!(["2023-12", "2024-01", "2024-02"]));

    app.server
        .get("/api/climate/quarters")
        .await
        .assert_json(&json!(["2023-Q4", "2024-Q1"]));
}

#[tokio::test]
async fn test_climate_month_markers() {
    let app = create_test_app();

    let response = app.server.get("/api/climate/month/2024-01").await;

    response.assert_status_ok();
    let cities: Vec<Value> = response.json();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0]["cityName"], "Auckland");
    assert_eq!(cities[0]["countryCode"], "NZ");
    assert_eq!(cities[0]["quarter"], "2024-01");
    assert_eq!(cities[0]["temperature"], 15.0);
}

#[tokio::test]
async fn test_invalid_month_key_is_bad_request() {
    let app = create_test_app();

    let response = app.server.get("/api/climate/month/January").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("January"));
}

#[tokio::test]
async fn test_climate_quarter_markers() {
    let app = create_test_app();

    let cities: Vec<Value> = app.server.get("/api/climate/2024-Q1").await.json();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0]["quarter"], "2024-Q1");

    let cities: Vec<Value> = app.server.get("/api/climate/1999-Q1").await.json();
    assert!(cities.is_empty());
}

struct UnavailableStore;

#[async_trait::async_trait]
impl ProfileStore for UnavailableStore {
    async fn get_profile(&self, _email: &str) -> AppResult<Option<UserProfile>> {
        Err(AppError::Internal("profile table unreachable".to_string()))
    }

    async fn create_profile(&self, _profile: &UserProfile) -> AppResult<()> {
        Err(AppError::Internal("profile table unreachable".to_string()))
    }

    async fn update_profile(&self, _profile: &UserProfile) -> AppResult<()> {
        Err(AppError::Internal("profile table unreachable".to_string()))
    }

    async fn append_submission(&self, _record: &SubmissionRecord) -> AppResult<()> {
        Err(AppError::Internal("submission table unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_store_failure_returns_generic_error() {
    let server = create_test_server(Arc::new(UnavailableStore));

    let response = server.post("/results").json(&auckland_answers()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Something went wrong. Please try again later.");
    assert!(!response.text().contains("unreachable"));
}
