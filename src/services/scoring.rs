//! Climate match scoring
//!
//! Each answered question contributes `sub_score * weight` to the achieved
//! total and `100 * weight` to the achievable total. The final score is the
//! achieved share of the achievable total on a 0-100 scale, so unanswered
//! questions neither help nor hurt a city.

use crate::models::{
    CityClimateProfile, CityRecommendation, PrecipitationLevel, UserPreferences, VariationBand,
};

const AVG_TEMP_WEIGHT: f64 = 0.4;
const SUMMER_MAX_WEIGHT: f64 = 0.2;
const WINTER_MIN_WEIGHT: f64 = 0.2;
const VARIATION_WEIGHT: f64 = 0.1;
const PRECIPITATION_WEIGHT: f64 = 0.1;

/// Points lost per °C away from the preferred average temperature
const AVG_TEMP_PENALTY: f64 = 5.0;
/// Points lost per °C away from the preferred summer maximum or winter minimum
const EXTREME_TEMP_PENALTY: f64 = 3.0;

/// Flat bonus for a favorite city or country, added after weighting
const FAVORITE_BONUS: f64 = 20.0;

/// Sub-score for answers that express no real preference
const INDIFFERENT_SCORE: f64 = 80.0;

const MAX_SCORE: f64 = 100.0;

/// Running weighted total for one city
#[derive(Debug, Default, Clone, Copy)]
struct WeightedScore {
    achieved: f64,
    achievable: f64,
}

impl WeightedScore {
    fn add(&mut self, sub_score: f64, weight: f64) {
        self.achieved += sub_score * weight;
        self.achievable += MAX_SCORE * weight;
    }

    fn add_bonus(&mut self, points: f64) {
        self.achieved += points;
    }

    fn normalized(&self) -> f64 {
        if self.achievable > 0.0 {
            (self.achieved / self.achievable * MAX_SCORE).min(MAX_SCORE)
        } else {
            0.0
        }
    }
}

/// `100` minus `penalty` per unit of distance, floored at zero
fn proximity(actual: f64, preferred: f64, penalty: f64) -> f64 {
    (MAX_SCORE - (actual - preferred).abs() * penalty).max(0.0)
}

fn variation_score(band: VariationBand, temperature_range: f64) -> f64 {
    match band {
        VariationBand::Small if temperature_range <= 20.0 => MAX_SCORE,
        VariationBand::Small => (MAX_SCORE - (temperature_range - 20.0) * 2.0).max(0.0),
        VariationBand::Large if temperature_range >= 40.0 => MAX_SCORE,
        VariationBand::Large => (MAX_SCORE - (40.0 - temperature_range) * 2.0).max(0.0),
        VariationBand::Any => INDIFFERENT_SCORE,
    }
}

fn precipitation_score(level: PrecipitationLevel, annual_precipitation: f64) -> f64 {
    match level {
        PrecipitationLevel::Low if annual_precipitation <= 10.0 => MAX_SCORE,
        PrecipitationLevel::Low => (MAX_SCORE - (annual_precipitation - 10.0) * 3.0).max(0.0),
        PrecipitationLevel::High if annual_precipitation >= 20.0 => MAX_SCORE,
        PrecipitationLevel::High => (MAX_SCORE - (20.0 - annual_precipitation) * 3.0).max(0.0),
        PrecipitationLevel::Moderate => {
            let distance = (annual_precipitation - 15.0).abs();
            if distance <= 5.0 {
                MAX_SCORE
            } else {
                (MAX_SCORE - distance * 5.0).max(0.0)
            }
        }
        PrecipitationLevel::Unspecified => INDIFFERENT_SCORE,
    }
}

/// Normalized 0-100 match between one city and the user's answers
///
/// Returns `0.0` when no scored question was answered.
pub fn score_city(city: &CityClimateProfile, preferences: &UserPreferences) -> f64 {
    let mut score = WeightedScore::default();

    if let Some(avg_temp) = preferences.avg_temp {
        score.add(
            proximity(city.avg_annual_temp, avg_temp, AVG_TEMP_PENALTY),
            AVG_TEMP_WEIGHT,
        );
    }

    if let Some(max_summer) = preferences.max_summer {
        score.add(
            proximity(city.summer_max_temp, max_summer, EXTREME_TEMP_PENALTY),
            SUMMER_MAX_WEIGHT,
        );
    }

    if let Some(min_winter) = preferences.min_winter {
        score.add(
            proximity(city.winter_min_temp, min_winter, EXTREME_TEMP_PENALTY),
            WINTER_MIN_WEIGHT,
        );
    }

    if let Some(band) = preferences.variation_band() {
        score.add(
            variation_score(band, city.temperature_range),
            VARIATION_WEIGHT,
        );
    }

    if let Some(level) = preferences.precipitation_level() {
        score.add(
            precipitation_score(level, city.annual_precipitation),
            PRECIPITATION_WEIGHT,
        );
    }

    if preferences.is_favorite(&city.city_name) || preferences.is_favorite(&city.country) {
        score.add_bonus(FAVORITE_BONUS);
    }

    score.normalized()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable climate description, one `Label: value` per line
///
/// The UI splits on `"\n"` and `": "`, so the labels and line order are fixed.
pub fn summarize(city: &CityClimateProfile) -> String {
    let mut lines = Vec::new();

    if !city.hemisphere.is_empty() {
        lines.push(format!("Hemisphere: {} Hemisphere", city.hemisphere));
    }

    let variation = if city.temperature_range < 20.0 {
        "Small"
    } else if city.temperature_range > 40.0 {
        "Large"
    } else {
        "Moderate"
    };
    lines.push(format!("Seasonal temperature differences: {}", variation));

    lines.push(format!(
        "Summer average temperature: {:.1} °C",
        city.summer_temp
    ));
    lines.push(format!(
        "Winter average temperature: {:.1} °C",
        city.winter_temp
    ));

    let precipitation = if city.annual_precipitation < 8.0 {
        "Low"
    } else if city.annual_precipitation > 20.0 {
        "High"
    } else {
        "Moderate"
    };
    lines.push(format!("Precipitation: {} overall", precipitation));

    if city.annual_precipitation < 15.0 {
        if !city.driest_season.is_empty() {
            lines.push(format!("Driest season: {}", capitalize(&city.driest_season)));
        }
    } else if !city.wettest_season.is_empty() {
        lines.push(format!(
            "Wettest season: {}",
            capitalize(&city.wettest_season)
        ));
    }

    lines.join("\n")
}

/// Scores every city and returns the best `top_k`, best first
///
/// Equal scores keep catalog order.
pub fn recommend(
    preferences: &UserPreferences,
    catalog: &[CityClimateProfile],
    top_k: usize,
) -> Vec<CityRecommendation> {
    let mut scored: Vec<(f64, &CityClimateProfile)> = catalog
        .iter()
        .map(|city| (score_city(city, preferences), city))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(top_k)
        .map(|(score, city)| CityRecommendation {
            city_name: city.city_name.clone(),
            country: city.country.clone(),
            score,
            summary: summarize(city),
            climate_data: city.clone(),
        })
        .collect()
}
