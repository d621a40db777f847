pub mod archive;
pub mod climate;
pub mod preferences;
pub mod profile;

pub use archive::{CityClimateSnapshot, ClimateRecord};
pub use climate::{CityClimateProfile, CityRecommendation, RecommendedCity};
pub use preferences::{PrecipitationLevel, UserPreferences, VariationBand};
pub use profile::{
    HistoryItem, ProfileResponse, SubmissionIdentity, SubmissionRecord, SubmissionStamp,
    UserProfile, ANONYMOUS_EMAIL, HISTORY_LIMIT,
};
