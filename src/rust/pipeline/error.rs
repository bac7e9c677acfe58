use std::io;

use crate::model_manager::ModelError;

/// Errors surfaced to callers of the prediction pipeline.
///
/// Soft-parse misses and unknown categories are not errors; they are
/// reported through [`Diagnostic`](super::Diagnostic) on the result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A raw field could not be read before any feature engineering
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },
    /// The assembled feature vector holds an undefined value
    #[error("Feature {index} ({feature}) is not a finite number")]
    InvalidFeatures { index: usize, feature: String },
    /// The model has not finished loading, or has been released
    #[error("Model is not ready; retry once loading has completed")]
    NotReady,
    /// The inference engine failed or returned malformed output
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// An internal invariant was broken (vector length, class index)
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    /// The predictor could not be assembled from its parts
    #[error("Build error: {0}")]
    Build(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Startup errors for the preprocessing configuration shipped with a model.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Vocabulary '{group}' must have {expected} entries, found {actual}")]
    VocabularySize {
        group: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Vocabulary '{group}' has an invalid entry '{entry}': {reason}")]
    VocabularyEntry {
        group: &'static str,
        entry: String,
        reason: &'static str,
    },
    #[error("Expected {expected} price-range labels, found {actual}")]
    LabelCount { expected: usize, actual: usize },
    #[error("Expected {expected} numeric feature statistics, found {actual}")]
    StatsCount { expected: usize, actual: usize },
    #[error("Numeric statistic {position} must describe '{expected}', found '{found}'")]
    StatsOrder {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("Feature '{feature}' has an unusable standard deviation {std}")]
    InvalidStd { feature: String, std: f32 },
    #[error("Feature '{feature}' has a non-finite mean")]
    InvalidMean { feature: String },
    #[error("'{field}' year {year} is outside {min}..={max}")]
    InvalidYear {
        field: &'static str,
        year: i32,
        min: i32,
        max: i32,
    },
    #[error("Missing {0} tensor name")]
    TensorName(&'static str),
}
