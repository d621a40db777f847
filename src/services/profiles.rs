use std::time::Duration;

use super::bounded;
use super::stores::ProfileStore;
use crate::{
    error::{AppError, AppResult},
    models::{UserPreferences, UserProfile},
};

/// Returns the user's profile, creating an empty one on first visit
pub async fn load_or_create_profile(
    store: &dyn ProfileStore,
    timeout: Duration,
    email: &str,
    username: &str,
) -> AppResult<UserProfile> {
    if let Some(profile) = bounded(timeout, "profile read", store.get_profile(email)).await? {
        return Ok(profile);
    }

    let profile = UserProfile::new(email).with_username(username);
    bounded(timeout, "profile create", store.create_profile(&profile)).await?;

    tracing::info!(email = %email, "Created profile on first visit");

    // Re-read so a profile created concurrently by another request wins
    let stored = bounded(timeout, "profile read", store.get_profile(email)).await?;
    Ok(stored.unwrap_or(profile))
}

/// Replaces the saved onboarding answers of an existing profile
pub async fn replace_preferences(
    store: &dyn ProfileStore,
    timeout: Duration,
    email: &str,
    preferences: UserPreferences,
) -> AppResult<UserProfile> {
    let mut profile = bounded(timeout, "profile read", store.get_profile(email))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    profile.preferences = Some(preferences);
    bounded(timeout, "profile update", store.update_profile(&profile)).await?;

    tracing::info!(email = %email, "Saved preferences replaced");

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stores::{MemoryProfileStore, MockProfileStore};

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_first_visit_creates_profile() {
        let store = MemoryProfileStore::new();

        let profile = load_or_create_profile(&store, TIMEOUT, "jane@example.com", "Jane")
            .await
            .unwrap();

        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.username, "Jane");
        assert!(profile.history.is_empty());
        assert!(store.get_profile("jane@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_existing_profile_is_returned_unchanged() {
        let store = MemoryProfileStore::new();
        let mut existing = UserProfile::new("jane@example.com").with_username("jd");
        existing.preferences = Some(UserPreferences {
            avg_temp: Some(21.0),
            ..Default::default()
        });
        store.create_profile(&existing).await.unwrap();

        let profile = load_or_create_profile(&store, TIMEOUT, "jane@example.com", "Jane")
            .await
            .unwrap();

        assert_eq!(profile.username, "jd");
        assert_eq!(profile.preferences, existing.preferences);
    }

    #[tokio::test]
    async fn test_replace_requires_profile() {
        let store = MemoryProfileStore::new();

        let result =
            replace_preferences(&store, TIMEOUT, "ghost@example.com", UserPreferences::default())
                .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_overwrites_preferences() {
        let store = MemoryProfileStore::new();
        store
            .create_profile(&UserProfile::new("jane@example.com"))
            .await
            .unwrap();

        let prefs = UserPreferences {
            precipitation: Some("low".to_string()),
            ..Default::default()
        };
        tokio_test::assert_ok!(
            replace_preferences(&store, TIMEOUT, "jane@example.com", prefs.clone()).await
        );

        let stored = store.get_profile("jane@example.com").await.unwrap().unwrap();
        assert_eq!(stored.preferences, Some(prefs));
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));
        store.expect_create_profile().never();

        let result = load_or_create_profile(&store, TIMEOUT, "a@b.com", "a").await;
        tokio_test::assert_err!(result);
    }
}
