use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    error::AppResult,
    middleware::RequestId,
    models::{ProfileResponse, UserPreferences},
    routes::AppState,
    services::profiles,
};

/// Returns the caller's profile, creating it on first visit
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    tracing::debug!(request_id = %request_id, email = %user.email, "Loading profile");

    let profile = profiles::load_or_create_profile(
        state.profiles.as_ref(),
        state.config.store_timeout(),
        &user.email,
        &user.username,
    )
    .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    Json(preferences): Json<UserPreferences>,
) -> AppResult<Json<Value>> {
    tracing::info!(request_id = %request_id, email = %user.email, "Replacing saved preferences");

    profiles::replace_preferences(
        state.profiles.as_ref(),
        state.config.store_timeout(),
        &user.email,
        preferences,
    )
    .await?;

    Ok(Json(json!({ "message": "Preferences updated successfully" })))
}
