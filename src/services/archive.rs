use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::bounded;
use super::stores::ArchiveSource;
use crate::{
    error::{AppError, AppResult},
    models::{CityClimateSnapshot, ClimateRecord},
};

/// Year and month parsed from a `YYYY-MM` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn parse(key: &str) -> AppResult<Self> {
        let invalid =
            || AppError::InvalidInput(format!("Invalid month key '{}', expected YYYY-MM", key));

        let (year, month) = key.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }

    fn covers(&self, record: &ClimateRecord) -> bool {
        record.year == self.year && record.month == self.month
    }
}

/// Keeps the first record for every distinct key, in first-seen order
fn first_per_key<'a, K, F>(
    records: impl Iterator<Item = &'a ClimateRecord>,
    key: F,
) -> Vec<&'a ClimateRecord>
where
    K: Eq + Hash,
    F: Fn(&ClimateRecord) -> K,
{
    let mut seen = HashSet::new();
    records.filter(|record| seen.insert(key(*record))).collect()
}

fn plottable_snapshots(records: Vec<&ClimateRecord>, period: &str) -> Vec<CityClimateSnapshot> {
    records
        .into_iter()
        .map(|record| CityClimateSnapshot::from_record(record, period))
        .filter(CityClimateSnapshot::is_plottable)
        .collect()
}

/// Month and quarter views over the historical climate archive
///
/// Records are fetched once and shared by every request. A failed fetch
/// leaves the archive empty for that request and is retried on the next one.
pub struct ClimateArchive {
    source: Arc<dyn ArchiveSource>,
    timeout: Duration,
    records: OnceCell<Arc<[ClimateRecord]>>,
}

impl ClimateArchive {
    pub fn new(source: Arc<dyn ArchiveSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            records: OnceCell::new(),
        }
    }

    async fn records(&self) -> Arc<[ClimateRecord]> {
        let loaded = self
            .records
            .get_or_try_init(|| async {
                let records =
                    bounded(self.timeout, "archive load", self.source.fetch_records()).await?;
                tracing::info!(
                    source = self.source.name(),
                    records = records.len(),
                    "Climate archive loaded"
                );
                Ok::<_, AppError>(Arc::from(records))
            })
            .await;

        match loaded {
            Ok(records) => records.clone(),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = self.source.name(),
                    "Failed to load climate archive, continuing with no records"
                );
                Arc::from(Vec::new())
            }
        }
    }

    /// Distinct `YYYY-MM` keys, ascending
    pub async fn available_months(&self) -> Vec<String> {
        let records = self.records().await;
        records
            .iter()
            .map(ClimateRecord::month_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct quarter labels, ascending
    pub async fn available_quarters(&self) -> Vec<String> {
        let records = self.records().await;
        records
            .iter()
            .map(|record| record.quarter.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One snapshot per city name for the given `YYYY-MM` month
    pub async fn cities_for_month(&self, month_key: &str) -> AppResult<Vec<CityClimateSnapshot>> {
        let month = MonthKey::parse(month_key)?;
        let records = self.records().await;

        let firsts = first_per_key(records.iter().filter(|r| month.covers(r)), |r| {
            r.city_name.clone()
        });

        Ok(plottable_snapshots(firsts, month_key))
    }

    /// One snapshot per city location for the given quarter label
    pub async fn cities_for_quarter(&self, quarter: &str) -> Vec<CityClimateSnapshot> {
        let records = self.records().await;

        let firsts = first_per_key(records.iter().filter(|r| r.quarter == quarter), |r| {
            (
                r.city_name.clone(),
                r.country_code.clone(),
                r.avg_lat.to_bits(),
                r.avg_lon.to_bits(),
            )
        });

        plottable_snapshots(firsts, quarter)
    }
}
