/// Process-local stores for development and tests
///
/// Nothing here survives a restart.
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

use super::{ArchiveSource, CatalogPage, CatalogSource, PageToken, ProfileStore};
use crate::{
    error::{AppError, AppResult},
    models::{CityClimateProfile, ClimateRecord, SubmissionRecord, UserProfile},
};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Serves a fixed list of cities in pages
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogSource {
    cities: Vec<CityClimateProfile>,
    page_size: usize,
}

impl MemoryCatalogSource {
    pub fn new(cities: Vec<CityClimateProfile>) -> Self {
        Self {
            cities,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Loads a JSON array of catalog entries from disk
    pub async fn from_seed_file(path: &str) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let cities: Vec<CityClimateProfile> = serde_json::from_str(&contents)?;
        tracing::info!(path = %path, cities = cities.len(), "Loaded catalog seed file");
        Ok(Self::new(cities))
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalogSource {
    async fn fetch_page(&self, continuation: Option<PageToken>) -> AppResult<CatalogPage> {
        let start = continuation.map(|token| token.0.max(0) as usize).unwrap_or(0);
        let end = (start + self.page_size).min(self.cities.len());
        let cities = self.cities.get(start..end).unwrap_or_default().to_vec();
        let next = (end < self.cities.len()).then_some(PageToken(end as i64));

        Ok(CatalogPage { cities, next })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Profiles keyed by email plus the submission log
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    submissions: Mutex<Vec<SubmissionRecord>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the submission log in append order
    pub async fn submissions(&self) -> Vec<SubmissionRecord> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, email: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(email).cloned())
    }

    async fn create_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .entry(profile.email.clone())
            .or_insert_with(|| profile.clone());
        Ok(())
    }

    async fn update_profile(&self, profile: &UserProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        let stored = profiles.get_mut(&profile.email).ok_or_else(|| {
            AppError::NotFound(format!("Profile {} does not exist", profile.email))
        })?;

        stored.username = profile.username.clone();
        stored.preferences = profile.preferences.clone();
        stored.history = profile.history.clone();
        Ok(())
    }

    async fn append_submission(&self, record: &SubmissionRecord) -> AppResult<()> {
        self.submissions.lock().await.push(record.clone());
        Ok(())
    }
}

/// Archive backed by records supplied up front
#[derive(Debug, Clone, Default)]
pub struct StaticArchiveSource {
    records: Vec<ClimateRecord>,
}

impl StaticArchiveSource {
    pub fn new(records: Vec<ClimateRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ArchiveSource for StaticArchiveSource {
    async fn fetch_records(&self) -> AppResult<Vec<ClimateRecord>> {
        Ok(self.records.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
