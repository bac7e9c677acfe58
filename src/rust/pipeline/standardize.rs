use crate::config::FeatureStats;

use super::error::ConfigError;
use super::NUMERIC_FEATURES;

/// Z-score normalization with the training-time statistics of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    means: [f32; NUMERIC_FEATURES],
    stds: [f32; NUMERIC_FEATURES],
}

impl Standardizer {
    /// Builds a standardizer from exactly five `(mean, std)` pairs.
    ///
    /// A zero, negative or non-finite std is a configuration error.
    pub fn new(stats: &[FeatureStats]) -> Result<Self, ConfigError> {
        if stats.len() != NUMERIC_FEATURES {
            return Err(ConfigError::StatsCount {
                expected: NUMERIC_FEATURES,
                actual: stats.len(),
            });
        }

        let mut means = [0.0; NUMERIC_FEATURES];
        let mut stds = [1.0; NUMERIC_FEATURES];
        for (i, feature) in stats.iter().enumerate() {
            if !feature.mean.is_finite() {
                return Err(ConfigError::InvalidMean {
                    feature: feature.name.clone(),
                });
            }
            if !feature.std.is_finite() || feature.std <= 0.0 {
                return Err(ConfigError::InvalidStd {
                    feature: feature.name.clone(),
                    std: feature.std,
                });
            }
            means[i] = feature.mean;
            stds[i] = feature.std;
        }

        Ok(Self { means, stds })
    }

    pub fn standardize(&self, index: usize, value: f32) -> f32 {
        (value - self.means[index]) / self.stds[index]
    }

    /// Standardizes the five numeric features in their fixed order
    pub fn transform(&self, raw: [f32; NUMERIC_FEATURES]) -> [f32; NUMERIC_FEATURES] {
        let mut out = [0.0; NUMERIC_FEATURES];
        for (i, value) in raw.into_iter().enumerate() {
            out[i] = self.standardize(i, value);
        }
        out
    }
}
