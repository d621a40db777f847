/// Monthly climate archive published as a single JSON document
///
/// The archive is one large array exported by the data pipeline. Decoded
/// records are kept in Redis so new instances skip the download.
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;

use super::ArchiveSource;
use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::ClimateRecord,
};

#[derive(Clone)]
pub struct HttpArchiveSource {
    http_client: HttpClient,
    url: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl HttpArchiveSource {
    pub fn new(url: String, request_timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http_client,
            url,
            cache: None,
            cache_ttl: 0,
        })
    }

    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    async fn download(&self) -> AppResult<Vec<ClimateRecord>> {
        tracing::info!(url = %self.url, "Downloading climate archive");

        let response = self.http_client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                url = %self.url,
                status = %status,
                body = %body,
                "Climate archive download failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Archive host returned status {}",
                status
            )));
        }

        let records: Vec<ClimateRecord> = response.json().await?;

        tracing::info!(records = records.len(), "Climate archive downloaded");

        Ok(records)
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    async fn fetch_records(&self) -> AppResult<Vec<ClimateRecord>> {
        let key = CacheKey::ClimateArchive(self.url.clone());

        if let Some(cache) = &self.cache {
            if let Some(records) = cache.get_or_miss::<Vec<ClimateRecord>>(&key).await {
                tracing::debug!(records = records.len(), "Climate archive cache hit");
                return Ok(records);
            }
            tracing::debug!("Climate archive cache miss");
        }

        let records = self.download().await?;

        if let Some(cache) = &self.cache {
            cache.set_in_background(&key, &records, self.cache_ttl);
        }

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
