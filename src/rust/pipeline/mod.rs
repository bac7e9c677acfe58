mod builder;
mod decode;
mod diagnostic;
mod encoding;
mod error;
mod features;
pub mod fields;
mod handle;
mod inference;
mod predictor;
mod standardize;

pub use builder::PredictorBuilder;
pub use decode::{argmax, softmax, Decision, DecisionDecoder};
pub use diagnostic::{CategoryGroup, Diagnostic};
pub use encoding::{encode, CategoryEncoder, Vocabulary};
pub use error::{ConfigError, PipelineError};
pub use features::{assemble, feature_name, FeatureVector, RawInput, LEASE_YEAR_RANGE};
pub use handle::{LoadOutcome, ModelHandle, ModelState};
pub use inference::{logits_from_slice, InferenceRuntime, OnnxRuntime};
pub use predictor::{PredictionResult, PreparedFeatures, PricePredictor, UNKNOWN_NUMERIC_DEFAULT};
pub use standardize::Standardizer;

/// Standardized numeric features at the head of the vector
pub const NUMERIC_FEATURES: usize = 5;
pub const TOWN_SLOTS: usize = 26;
pub const FLAT_TYPE_SLOTS: usize = 7;
pub const FLAT_MODEL_SLOTS: usize = 21;
/// Total model input width
pub const FEATURE_LEN: usize = NUMERIC_FEATURES + TOWN_SLOTS + FLAT_TYPE_SLOTS + FLAT_MODEL_SLOTS;
/// Number of price-range classes the model scores
pub const NUM_CLASSES: usize = 5;

/// Numeric feature names, in vector order
pub const NUMERIC_FEATURE_NAMES: [&str; NUMERIC_FEATURES] = [
    "floor_area_sqm",
    "reference_year",
    "flat_age",
    "storey_midpoint",
    "remaining_lease_years",
];

const _: () = assert!(FEATURE_LEN == 59);

/// Information about a predictor's model configuration
#[derive(Debug, Clone)]
pub struct PredictorInfo {
    /// Version tag of the model/config pair
    pub version: String,
    /// Price-range labels in class order
    pub labels: Vec<String>,
    /// Width of the model input
    pub feature_len: usize,
    /// Year used as "now" for flat age
    pub reference_year_anchor: i32,
}

impl PricePredictor {
    /// Returns information about the predictor's configuration
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            version: self.config.version.clone(),
            labels: self.decoder.labels().to_vec(),
            feature_len: FEATURE_LEN,
            reference_year_anchor: self.config.reference_year_anchor,
        }
    }
}
