use std::time::Duration;

use super::bounded;
use super::profiles::load_or_create_profile;
use super::stores::ProfileStore;
use crate::{
    error::AppResult,
    models::{SubmissionIdentity, UserPreferences, UserProfile, HISTORY_LIMIT},
};

/// Applies one recommendation submission to a profile
///
/// Saved answers are replaced when `save` is set. The submission is appended
/// to the history unless it repeats the latest entry, and only the newest
/// [`HISTORY_LIMIT`] entries are kept.
pub fn apply_submission(
    mut profile: UserProfile,
    submission: &SubmissionIdentity,
    save: bool,
    preferences: &UserPreferences,
) -> UserProfile {
    if save {
        profile.preferences = Some(preferences.clone());
    }

    let repeated = profile
        .history
        .last()
        .is_some_and(|last| submission.matches(last));

    if !repeated {
        profile.history.push(submission.to_history_item());
    }

    if profile.history.len() > HISTORY_LIMIT {
        let excess = profile.history.len() - HISTORY_LIMIT;
        profile.history.drain(..excess);
    }

    profile
}

/// Records a submission on the user's profile, creating the profile first
///
/// Creation goes through [`load_or_create_profile`], so a profile written
/// by a concurrent first request is the one that gets updated. Read, modify
/// and write are separate store calls, so two concurrent
/// submissions for the same user may overwrite each other.
pub async fn record_submission(
    store: &dyn ProfileStore,
    timeout: Duration,
    email: &str,
    username: &str,
    submission: &SubmissionIdentity,
    preferences: &UserPreferences,
) -> AppResult<UserProfile> {
    let profile = load_or_create_profile(store, timeout, email, username).await?;

    let updated = apply_submission(profile, submission, preferences.wants_save(), preferences);

    bounded(timeout, "profile update", store.update_profile(&updated)).await?;

    tracing::debug!(
        email = %email,
        history = updated.history.len(),
        saved = preferences.wants_save(),
        "Recorded submission in profile history"
    );

    Ok(updated)
}
