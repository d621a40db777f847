use serde::{Deserialize, Serialize};

/// Precomputed climate statistics for one reference city
///
/// Numeric fields are `0.0` when the source row had no value for them.
/// Scoring treats that like any other reading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CityClimateProfile {
    pub city_name: String,
    pub country: String,
    pub climate_type: String,
    pub hemisphere: String,
    pub latitude: f64,
    pub longitude: f64,

    pub avg_annual_temp: f64,
    pub summer_max_temp: f64,
    pub winter_min_temp: f64,
    pub summer_temp: f64,
    pub winter_temp: f64,
    pub spring_temp: f64,
    pub autumn_temp: f64,
    pub temperature_range: f64,

    pub annual_precipitation: f64,
    pub spring_precipitation: f64,
    pub summer_precipitation: f64,
    pub autumn_precipitation: f64,
    pub winter_precipitation: f64,

    /// Lowercase season name, empty when unknown
    pub driest_season: String,
    /// Lowercase season name, empty when unknown
    pub wettest_season: String,

    pub data_years: i32,
    pub total_records: i32,
}

impl CityClimateProfile {
    /// Display name used in responses and persisted history: `"<city>, <country>"`
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.city_name, self.country)
    }
}

/// A scored catalog entry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityRecommendation {
    pub city_name: String,
    pub country: String,
    /// Normalized match score in `0.0..=100.0`
    pub score: f64,
    /// Newline-separated `Label: value` lines
    pub summary: String,
    pub climate_data: CityClimateProfile,
}

impl CityRecommendation {
    pub fn display_name(&self) -> String {
        self.climate_data.display_name()
    }
}

/// Entry in the `/results` response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedCity {
    pub name: String,
    pub summary: String,
}

impl From<&CityRecommendation> for RecommendedCity {
    fn from(recommendation: &CityRecommendation) -> Self {
        Self {
            name: recommendation.display_name(),
            summary: recommendation.summary.clone(),
        }
    }
}
