use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub mod archive;
pub mod catalog;
pub mod history;
pub mod profiles;
pub mod recommendations;
pub mod scoring;
pub mod stores;

pub use archive::ClimateArchive;
pub use catalog::CatalogReader;

/// Runs a store call with an upper bound on its duration
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} exceeded {}ms",
            operation,
            limit.as_millis()
        ))),
    }
}
