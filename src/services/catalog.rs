use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::bounded;
use super::stores::CatalogSource;
use crate::{
    error::{AppError, AppResult},
    models::CityClimateProfile,
};

/// Read-through holder for the reference city catalog
///
/// The first caller drains the source while concurrent callers wait on the
/// same initialization; afterwards every read clones the shared snapshot.
/// The snapshot is never refreshed. A failed or timed-out load is not
/// cached, so the next request tries again.
pub struct CatalogReader {
    source: Arc<dyn CatalogSource>,
    timeout: Duration,
    snapshot: OnceCell<Arc<[CityClimateProfile]>>,
}

impl CatalogReader {
    pub fn new(source: Arc<dyn CatalogSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            snapshot: OnceCell::new(),
        }
    }

    /// All catalog cities in source order; empty when the source is unavailable
    pub async fn cities(&self) -> Arc<[CityClimateProfile]> {
        let loaded = self
            .snapshot
            .get_or_try_init(|| bounded(self.timeout, "catalog load", self.load()))
            .await;

        match loaded {
            Ok(cities) => cities.clone(),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = self.source.name(),
                    "Failed to load city catalog, continuing with an empty catalog"
                );
                Arc::from(Vec::new())
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.initialized()
    }

    async fn load(&self) -> AppResult<Arc<[CityClimateProfile]>> {
        let mut cities = Vec::new();
        let mut continuation = None;
        let mut seen = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self.source.fetch_page(continuation).await?;
            pages += 1;
            cities.extend(page.cities);

            match page.next {
                Some(next) if !seen.insert(next) => {
                    return Err(AppError::Internal(format!(
                        "Catalog source {} repeated continuation token {:?}",
                        self.source.name(),
                        next
                    )));
                }
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        tracing::info!(
            source = self.source.name(),
            cities = cities.len(),
            pages,
            "City catalog loaded"
        );

        Ok(Arc::from(cities))
    }
}
