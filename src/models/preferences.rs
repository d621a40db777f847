use serde::{Deserialize, Serialize};

/// Answers from the onboarding questionnaire
///
/// Every field is optional. A missing field drops that dimension from
/// scoring instead of contributing a neutral value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Preferred average annual temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_temp: Option<f64>,
    /// Preferred summer maximum temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_summer: Option<f64>,
    /// Preferred winter minimum temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_winter: Option<f64>,
    /// Appetite for seasonal swings on a 0-10 slider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_variation: Option<f64>,
    /// "low", "moderate", "high" or free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<String>,
    /// Accepted and stored, not scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_cities: Option<Vec<String>>,
    /// Persist these answers as the user's saved preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save: Option<bool>,
}

/// Precipitation answer as understood by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipitationLevel {
    Low,
    Moderate,
    High,
    /// Any other non-empty answer
    Unspecified,
}

impl PrecipitationLevel {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "low" => PrecipitationLevel::Low,
            "moderate" => PrecipitationLevel::Moderate,
            "high" => PrecipitationLevel::High,
            _ => PrecipitationLevel::Unspecified,
        }
    }
}

/// Where a `tempVariation` answer falls on the slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationBand {
    Small,
    Any,
    Large,
}

impl VariationBand {
    pub fn from_slider(value: f64) -> Self {
        if value <= 2.0 {
            VariationBand::Small
        } else if value >= 8.0 {
            VariationBand::Large
        } else {
            VariationBand::Any
        }
    }
}

impl UserPreferences {
    /// Parsed precipitation answer; an empty string counts as unanswered
    pub fn precipitation_level(&self) -> Option<PrecipitationLevel> {
        self.precipitation
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(PrecipitationLevel::parse)
    }

    pub fn variation_band(&self) -> Option<VariationBand> {
        self.temp_variation.map(VariationBand::from_slider)
    }

    /// True when `name` matches a favorite city or country, ignoring case
    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorite_cities
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|favorite| favorite.to_lowercase() == name.to_lowercase())
    }

    pub fn wants_save(&self) -> bool {
        self.save.unwrap_or(false)
    }
}
