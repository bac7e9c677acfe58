use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::pipeline::{
    ConfigError, Standardizer, FLAT_MODEL_SLOTS, FLAT_TYPE_SLOTS, NUMERIC_FEATURES,
    NUMERIC_FEATURE_NAMES, NUM_CLASSES, TOWN_SLOTS,
};

/// The preprocessing configuration compiled into the crate. It matches the
/// `preprocessing.json` shipped next to the reference model.
const BUILTIN_CONFIG: &str = include_str!("../../config/preprocessing.json");

/// Plausible range for the anchor and fallback years
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1960..=2100;

/// Training-time statistics for one numeric feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub mean: f32,
    pub std: f32,
}

/// Preprocessing data versioned together with a classifier artifact.
///
/// Vocabularies, normalization statistics and tensor names all describe the
/// model the configuration ships with; changing one without the other
/// misaligns the feature vector. [`ModelConfig::validate`] catches the
/// structural mismatches at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Version tag of the model/config pair
    pub version: String,
    /// Name of the single `[1, 59]` input tensor
    #[serde(default = "default_input_name")]
    pub input_name: String,
    /// Name of the logits output tensor
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// The "current year" the flat age was computed against during training
    pub reference_year_anchor: i32,
    /// Year substituted when a reference month cannot be parsed
    pub fallback_year: i32,
    /// Mean/std pairs in feature order
    pub numeric: Vec<FeatureStats>,
    pub towns: Vec<String>,
    pub flat_types: Vec<String>,
    pub flat_models: Vec<String>,
    /// Price-range labels in the classifier's output order
    pub labels: Vec<String>,
    /// Optional SHA-256 of the `model.onnx` this configuration belongs to
    #[serde(default)]
    pub model_sha256: Option<String>,
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_output_name() -> String {
    "output".to_string()
}

impl ModelConfig {
    /// Returns the configuration compiled into the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_CONFIG)
    }

    /// Parses and validates a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a `preprocessing.json` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading preprocessing configuration from {:?}", path);
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("Configuration version {} validated", config.version);
        Ok(config)
    }

    /// Checks that the configuration can drive a 59-slot feature vector and
    /// a 5-class decoder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_name.trim().is_empty() {
            return Err(ConfigError::TensorName("input"));
        }
        if self.output_name.trim().is_empty() {
            return Err(ConfigError::TensorName("output"));
        }

        validate_year("reference_year_anchor", self.reference_year_anchor)?;
        validate_year("fallback_year", self.fallback_year)?;

        if self.numeric.len() != NUMERIC_FEATURES {
            return Err(ConfigError::StatsCount {
                expected: NUMERIC_FEATURES,
                actual: self.numeric.len(),
            });
        }
        for (position, (stats, expected)) in self.numeric.iter().zip(NUMERIC_FEATURE_NAMES).enumerate() {
            if stats.name != expected {
                return Err(ConfigError::StatsOrder {
                    position,
                    expected,
                    found: stats.name.clone(),
                });
            }
        }
        Standardizer::new(&self.numeric)?;

        validate_vocabulary("town", &self.towns, TOWN_SLOTS)?;
        validate_vocabulary("flat_type", &self.flat_types, FLAT_TYPE_SLOTS)?;
        validate_vocabulary("flat_model", &self.flat_models, FLAT_MODEL_SLOTS)?;

        if self.labels.len() != NUM_CLASSES {
            return Err(ConfigError::LabelCount {
                expected: NUM_CLASSES,
                actual: self.labels.len(),
            });
        }
        validate_vocabulary_entries("label", &self.labels, false)?;

        Ok(())
    }
}

fn validate_year(field: &'static str, year: i32) -> Result<(), ConfigError> {
    if YEAR_RANGE.contains(&year) {
        Ok(())
    } else {
        Err(ConfigError::InvalidYear {
            field,
            year,
            min: *YEAR_RANGE.start(),
            max: *YEAR_RANGE.end(),
        })
    }
}

fn validate_vocabulary(
    group: &'static str,
    entries: &[String],
    expected: usize,
) -> Result<(), ConfigError> {
    if entries.len() != expected {
        return Err(ConfigError::VocabularySize {
            group,
            expected,
            actual: entries.len(),
        });
    }
    validate_vocabulary_entries(group, entries, true)
}

fn validate_vocabulary_entries(
    group: &'static str,
    entries: &[String],
    uppercase: bool,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        let invalid = |reason| ConfigError::VocabularyEntry {
            group,
            entry: entry.clone(),
            reason,
        };
        if entry.trim().is_empty() {
            return Err(invalid("empty entry"));
        }
        if entry.trim() != entry {
            return Err(invalid("surrounding whitespace"));
        }
        if uppercase && entry.to_uppercase() != *entry {
            return Err(invalid("entries must be uppercase"));
        }
        if !seen.insert(entry.as_str()) {
            return Err(invalid("duplicate entry"));
        }
    }
    Ok(())
}
