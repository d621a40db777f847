use axum::{extract::State, Extension, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    auth::MaybeAuthUser,
    error::AppResult,
    middleware::RequestId,
    models::{
        RecommendedCity, SubmissionIdentity, SubmissionRecord, SubmissionStamp, UserPreferences,
        ANONYMOUS_EMAIL,
    },
    routes::AppState,
    services::{bounded, history, recommendations},
};

/// Handler for onboarding submissions
///
/// Anyone may submit. Every submission is logged; signed-in users also get
/// the result added to their profile history.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(preferences): Json<UserPreferences>,
) -> AppResult<Json<Vec<RecommendedCity>>> {
    let email = user
        .as_ref()
        .map(|u| u.email.as_str())
        .unwrap_or(ANONYMOUS_EMAIL);

    tracing::info!(
        request_id = %request_id,
        email = %email,
        save = preferences.wants_save(),
        "Processing onboarding submission"
    );

    let ranked = recommendations::get_recommendations(
        &state.catalog,
        &preferences,
        state.config.recommendation_limit,
    )
    .await;

    let cities: Vec<RecommendedCity> = ranked.iter().map(RecommendedCity::from).collect();
    let names: Vec<String> = cities.iter().map(|c| c.name.clone()).collect();

    let submitted_at = Utc::now();
    let record = SubmissionRecord::new(email, preferences.clone(), names.clone(), submitted_at);
    bounded(
        state.config.store_timeout(),
        "submission append",
        state.profiles.append_submission(&record),
    )
    .await?;

    if let Some(user) = &user {
        let submission = SubmissionIdentity::new(names, SubmissionStamp::new(submitted_at));
        history::record_submission(
            state.profiles.as_ref(),
            state.config.store_timeout(),
            &user.email,
            &user.username,
            &submission,
            &preferences,
        )
        .await?;
    }

    tracing::info!(
        request_id = %request_id,
        returned = cities.len(),
        "Onboarding submission completed"
    );

    Ok(Json(cities))
}
