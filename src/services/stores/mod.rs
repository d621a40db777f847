/// Persistence boundaries consumed by the services
///
/// Each trait describes a contract with an externally owned store. The
/// services own all policy; implementations only move data.
use crate::{
    error::AppResult,
    models::{CityClimateProfile, ClimateRecord, SubmissionRecord, UserProfile},
};

pub mod http_archive;
pub mod memory;
pub mod postgres;

pub use http_archive::HttpArchiveSource;
pub use memory::{MemoryCatalogSource, MemoryProfileStore, StaticArchiveSource};
pub use postgres::{PgCatalogSource, PgProfileStore};

/// Opaque position from which the next catalog page continues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageToken(pub i64);

/// One page of catalog rows
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub cities: Vec<CityClimateProfile>,
    /// `None` once the catalog is exhausted
    pub next: Option<PageToken>,
}

/// Bulk reader for the reference city catalog
///
/// Backing stores may cap response size, so reads are paged. Callers keep
/// requesting with the returned token until `next` is `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, continuation: Option<PageToken>) -> AppResult<CatalogPage>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// User profile and submission log storage
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, email: &str) -> AppResult<Option<UserProfile>>;

    async fn create_profile(&self, profile: &UserProfile) -> AppResult<()>;

    /// Overwrites username, preferences and history of an existing profile
    async fn update_profile(&self, profile: &UserProfile) -> AppResult<()>;

    /// Appends to the write-once submission log
    async fn append_submission(&self, record: &SubmissionRecord) -> AppResult<()>;
}

/// Provider of the monthly climate archive
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn fetch_records(&self) -> AppResult<Vec<ClimateRecord>>;

    fn name(&self) -> &'static str;
}
