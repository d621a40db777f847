use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{error::AppResult, models::CityClimateSnapshot, routes::AppState};

/// Distinct catalog city names, sorted
pub async fn list_cities(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let cities = state.catalog.cities().await;
    let names: BTreeSet<&str> = cities.iter().map(|c| c.city_name.as_str()).collect();
    Json(names.into_iter().map(str::to_string).collect())
}

pub async fn list_months(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.archive.available_months().await)
}

pub async fn list_quarters(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.archive.available_quarters().await)
}

/// Map markers for one `YYYY-MM` month
pub async fn cities_for_month(
    State(state): State<Arc<AppState>>,
    Path(month_key): Path<String>,
) -> AppResult<Json<Vec<CityClimateSnapshot>>> {
    let cities = state.archive.cities_for_month(&month_key).await?;
    tracing::debug!(month = %month_key, cities = cities.len(), "Served monthly climate markers");
    Ok(Json(cities))
}

/// Map markers for one quarter label
pub async fn cities_for_quarter(
    State(state): State<Arc<AppState>>,
    Path(quarter): Path<String>,
) -> Json<Vec<CityClimateSnapshot>> {
    Json(state.archive.cities_for_quarter(&quarter).await)
}
