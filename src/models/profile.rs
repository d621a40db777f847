use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use super::UserPreferences;

/// Email recorded on submissions made without a verified identity
pub const ANONYMOUS_EMAIL: &str = "anonymous@local";

/// Number of past results kept on a profile
pub const HISTORY_LIMIT: usize = 3;

/// Format of `HistoryItem::date`
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Stored account data for an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    /// Last answers submitted with `save: true`
    pub preferences: Option<UserPreferences>,
    /// Oldest first, at most [`HISTORY_LIMIT`] entries
    pub history: Vec<HistoryItem>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates an empty profile; the username is the email's local part
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        let username = email.split('@').next().unwrap_or_default().to_string();
        Self {
            email,
            username,
            preferences: None,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}

/// One past set of recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryItem {
    pub cities: Vec<String>,
    /// UTC, minute precision, see [`HISTORY_DATE_FORMAT`]
    pub date: String,
}

/// Submission time truncated to the minute
///
/// History entries compare dates at this granularity, so two submissions
/// within the same UTC minute share a stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionStamp(DateTime<Utc>);

impl SubmissionStamp {
    pub fn new(at: DateTime<Utc>) -> Self {
        let truncated = at
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(at);
        Self(truncated)
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Display for SubmissionStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(HISTORY_DATE_FORMAT))
    }
}

/// The recommended cities together with the minute they were produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionIdentity {
    pub cities: Vec<String>,
    pub stamp: SubmissionStamp,
}

impl SubmissionIdentity {
    pub fn new(cities: Vec<String>, stamp: SubmissionStamp) -> Self {
        Self { cities, stamp }
    }

    /// Same cities in the same order, recorded in the same minute
    pub fn matches(&self, item: &HistoryItem) -> bool {
        self.cities == item.cities && self.stamp.to_string() == item.date
    }

    pub fn to_history_item(&self) -> HistoryItem {
        HistoryItem {
            cities: self.cities.clone(),
            date: self.stamp.to_string(),
        }
    }
}

/// Append-only audit entry for every `/results` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub time: DateTime<Utc>,
    pub email: String,
    pub onboarding: UserPreferences,
    pub cities: Vec<String>,
}

impl SubmissionRecord {
    pub fn new(
        email: impl Into<String>,
        onboarding: UserPreferences,
        cities: Vec<String>,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            email: email.into(),
            onboarding,
            cities,
        }
    }
}

/// Body of `GET /profile`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub email: String,
    pub username: String,
    pub preferences: Option<UserPreferences>,
    pub history: Vec<HistoryItem>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: profile.email,
            username: profile.username,
            preferences: profile.preferences,
            history: profile.history,
        }
    }
}
