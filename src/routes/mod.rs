use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::JwtVerifier,
    config::Config,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{stores::ProfileStore, CatalogReader, ClimateArchive},
};

pub mod climate;
pub mod profile;
pub mod results;

/// Shared handles available to every handler
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogReader>,
    pub profiles: Arc<dyn ProfileStore>,
    pub archive: Arc<ClimateArchive>,
    pub jwt: JwtVerifier,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: CatalogReader,
        profiles: Arc<dyn ProfileStore>,
        archive: ClimateArchive,
    ) -> Self {
        let jwt = JwtVerifier::new(&config.jwt_secret);
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            profiles,
            archive: Arc::new(archive),
            jwt,
        }
    }
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = build_cors_layer(&state.config.frontend_origin)?;

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/results", post(results::submit))
        .route("/profile", get(profile::get_profile))
        .route("/profile/preferences", put(profile::update_preferences))
        .nest("/api", api_routes())
        // Outermost first: CORS, then request ids, then the span that logs them
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state);

    Ok(router)
}

/// Public catalog and climate map routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cities", get(climate::list_cities))
        .route("/climate/months", get(climate::list_months))
        .route("/climate/month/:month_key", get(climate::cities_for_month))
        .route("/climate/quarters", get(climate::list_quarters))
        .route("/climate/:quarter", get(climate::cities_for_quarter))
}

/// Allows the configured frontend origin to call with credentials
fn build_cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true, "time": chrono::Utc::now() }))
}
