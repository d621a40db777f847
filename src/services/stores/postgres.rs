use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use super::{CatalogPage, CatalogSource, PageToken, ProfileStore};
use crate::{
    error::{AppError, AppResult},
    models::{CityClimateProfile, HistoryItem, SubmissionRecord, UserPreferences, UserProfile},
};

const CATALOG_PAGE_SIZE: i64 = 500;

/// Catalog rows as stored; ingestion leaves gaps as NULL
#[derive(Debug, FromRow)]
struct CityClimateRow {
    id: i64,
    city_name: String,
    country: String,
    climate_type: Option<String>,
    hemisphere: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    avg_annual_temp: Option<f64>,
    summer_max_temp: Option<f64>,
    winter_min_temp: Option<f64>,
    summer_temp: Option<f64>,
    winter_temp: Option<f64>,
    spring_temp: Option<f64>,
    autumn_temp: Option<f64>,
    temperature_range: Option<f64>,
    annual_precipitation: Option<f64>,
    spring_precipitation: Option<f64>,
    summer_precipitation: Option<f64>,
    autumn_precipitation: Option<f64>,
    winter_precipitation: Option<f64>,
    driest_season: Option<String>,
    wettest_season: Option<String>,
    data_years: Option<i32>,
    total_records: Option<i32>,
}

impl From<CityClimateRow> for CityClimateProfile {
    fn from(row: CityClimateRow) -> Self {
        Self {
            city_name: row.city_name,
            country: row.country,
            climate_type: row.climate_type.unwrap_or_default(),
            hemisphere: row.hemisphere.unwrap_or_default(),
            latitude: row.latitude.unwrap_or_default(),
            longitude: row.longitude.unwrap_or_default(),
            avg_annual_temp: row.avg_annual_temp.unwrap_or_default(),
            summer_max_temp: row.summer_max_temp.unwrap_or_default(),
            winter_min_temp: row.winter_min_temp.unwrap_or_default(),
            summer_temp: row.summer_temp.unwrap_or_default(),
            winter_temp: row.winter_temp.unwrap_or_default(),
            spring_temp: row.spring_temp.unwrap_or_default(),
            autumn_temp: row.autumn_temp.unwrap_or_default(),
            temperature_range: row.temperature_range.unwrap_or_default(),
            annual_precipitation: row.annual_precipitation.unwrap_or_default(),
            spring_precipitation: row.spring_precipitation.unwrap_or_default(),
            summer_precipitation: row.summer_precipitation.unwrap_or_default(),
            autumn_precipitation: row.autumn_precipitation.unwrap_or_default(),
            winter_precipitation: row.winter_precipitation.unwrap_or_default(),
            driest_season: row.driest_season.unwrap_or_default(),
            wettest_season: row.wettest_season.unwrap_or_default(),
            data_years: row.data_years.unwrap_or_default(),
            total_records: row.total_records.unwrap_or_default(),
        }
    }
}

/// Reads the catalog table in id order using keyset pagination
#[derive(Clone)]
pub struct PgCatalogSource {
    pool: PgPool,
}

impl PgCatalogSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for PgCatalogSource {
    async fn fetch_page(&self, continuation: Option<PageToken>) -> AppResult<CatalogPage> {
        let after_id = continuation.map(|token| token.0).unwrap_or(0);

        let rows: Vec<CityClimateRow> = sqlx::query_as(
            r#"
            SELECT id, city_name, country, climate_type, hemisphere, latitude, longitude,
                   avg_annual_temp, summer_max_temp, winter_min_temp,
                   summer_temp, winter_temp, spring_temp, autumn_temp, temperature_range,
                   annual_precipitation, spring_precipitation, summer_precipitation,
                   autumn_precipitation, winter_precipitation,
                   driest_season, wettest_season, data_years, total_records
            FROM city_climates
            WHERE id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after_id)
        .bind(CATALOG_PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        let next = if rows.len() as i64 == CATALOG_PAGE_SIZE {
            rows.last().map(|row| PageToken(row.id))
        } else {
            None
        };

        tracing::debug!(after_id, rows = rows.len(), "Fetched catalog page");

        Ok(CatalogPage {
            cities: rows.into_iter().map(CityClimateProfile::from).collect(),
            next,
        })
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[derive(Debug, FromRow)]
struct UserProfileRow {
    email: String,
    username: String,
    preferences: Option<Json<UserPreferences>>,
    history: Json<Vec<HistoryItem>>,
    created_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        Self {
            email: row.email,
            username: row.username,
            preferences: row.preferences.map(|Json(preferences)| preferences),
            history: row.history.0,
            created_at: row.created_at,
        }
    }
}

/// Profiles and submissions in PostgreSQL
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, email: &str) -> AppResult<Option<UserProfile>> {
        let row: Option<UserProfileRow> = sqlx::query_as(
            r#"
            SELECT email, username, preferences, history, created_at
            FROM user_profiles
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserProfile::from))
    }

    async fn create_profile(&self, profile: &UserProfile) -> AppResult<()> {
        // A concurrent first request may have created the row already
        sqlx::query(
            r#"
            INSERT INTO user_profiles (email, username, preferences, history, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(profile.preferences.as_ref().map(Json))
        .bind(Json(&profile.history))
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_profile(&self, profile: &UserProfile) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_profiles
            SET username = $2, preferences = $3, history = $4
            WHERE email = $1
            "#,
        )
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(profile.preferences.as_ref().map(Json))
        .bind(Json(&profile.history))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Profile {} does not exist",
                profile.email
            )));
        }

        Ok(())
    }

    async fn append_submission(&self, record: &SubmissionRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, time, email, onboarding, cities)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.time)
        .bind(&record.email)
        .bind(Json(&record.onboarding))
        .bind(Json(&record.cities))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
