use super::{scoring, CatalogReader};
use crate::models::{CityRecommendation, UserPreferences};

/// Best matching catalog cities for a set of onboarding answers
///
/// Reads the cached catalog snapshot and ranks it with the scoring engine.
/// An unavailable catalog yields an empty list rather than an error.
pub async fn get_recommendations(
    catalog: &CatalogReader,
    preferences: &UserPreferences,
    limit: usize,
) -> Vec<CityRecommendation> {
    let cities = catalog.cities().await;

    if cities.is_empty() {
        tracing::warn!("No catalog cities available for recommendations");
        return Vec::new();
    }

    let recommendations = scoring::recommend(preferences, &cities, limit);

    tracing::debug!(
        candidates = cities.len(),
        returned = recommendations.len(),
        top_score = recommendations.first().map(|r| r.score),
        "Ranked catalog cities"
    );

    recommendations
}
