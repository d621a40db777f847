use serde::{Deserialize, Serialize};

/// One city-month row of the historical climate archive
///
/// Field names follow the archive's JSON export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClimateRecord {
    pub city_name: String,
    pub country_code: String,
    pub country_full: String,
    #[serde(rename = "QUARTER")]
    pub quarter: String,
    #[serde(rename = "ADJUSTED_QUARTER")]
    pub adjusted_quarter: String,
    #[serde(rename = "MONTH")]
    pub month: u32,
    #[serde(rename = "MONTH_NAME")]
    pub month_name: String,
    #[serde(rename = "ADJUSTED_MONTH")]
    pub adjusted_month: u32,
    #[serde(rename = "SEASON")]
    pub season: String,
    #[serde(rename = "YEAR")]
    pub year: i32,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "PRCP")]
    pub prcp: Option<f64>,
    pub station_count: u32,
    pub avg_distance: f64,
    pub avg_lat: f64,
    pub avg_lon: f64,
    pub hemisphere: String,
}

impl ClimateRecord {
    /// `YYYY-MM` key of the month this row covers
    pub fn month_key(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

/// Map marker data for one city in one period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityClimateSnapshot {
    pub city_name: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// The month or quarter key that was requested
    pub quarter: String,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
}

impl CityClimateSnapshot {
    pub fn from_record(record: &ClimateRecord, period: &str) -> Self {
        Self {
            city_name: record.city_name.clone(),
            country_code: record.country_code.clone(),
            latitude: record.avg_lat,
            longitude: record.avg_lon,
            quarter: period.to_string(),
            temperature: record.tavg,
            precipitation: record.prcp,
            max_temp: record.tmax,
            min_temp: record.tmin,
        }
    }

    /// Markers need both a temperature and a precipitation reading
    pub fn is_plottable(&self) -> bool {
        self.temperature.is_some() && self.precipitation.is_some()
    }
}
