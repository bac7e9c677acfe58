use std::ops::RangeInclusive;

use serde::Deserialize;

use super::error::PipelineError;
use super::{
    FEATURE_LEN, FLAT_MODEL_SLOTS, FLAT_TYPE_SLOTS, NUMERIC_FEATURES, NUMERIC_FEATURE_NAMES,
    TOWN_SLOTS,
};

/// Lease-commencement years a listing can plausibly carry
pub const LEASE_YEAR_RANGE: RangeInclusive<i32> = 1900..=2100;

/// Attributes of a flat as a user enters them.
///
/// Every field is text: the pipeline owns parsing so that malformed numbers
/// become [`PipelineError::InvalidInput`] and malformed free-form fields
/// become diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawInput {
    /// Floor area in square metres
    pub floor_area_sqm: String,
    pub town: String,
    pub flat_type: String,
    pub flat_model: String,
    /// Storey range, e.g. `"07 TO 09"`
    pub storey_range: String,
    /// Remaining lease, e.g. `"75 years 00 months"` or `"75.5"`
    pub remaining_lease: String,
    /// Reference month, `"YYYY-MM"`
    pub month: String,
    /// Lease commencement year, e.g. `"1990"`
    pub lease_commence_date: String,
}

impl RawInput {
    /// Reads the two strictly numeric fields.
    ///
    /// # Errors
    /// - `InvalidInput` naming `floor_area_sqm` if it is not a number
    /// - `InvalidInput` naming `lease_commence_date` if it is not an integer
    ///   or lies outside [`LEASE_YEAR_RANGE`]
    pub fn numeric_fields(&self) -> Result<(f32, i32), PipelineError> {
        let floor_area = self
            .floor_area_sqm
            .trim()
            .parse::<f32>()
            .map_err(|e| PipelineError::InvalidInput {
                field: "floor_area_sqm",
                reason: format!("'{}' is not a number ({})", self.floor_area_sqm, e),
            })?;
        let lease_commence = self
            .lease_commence_date
            .trim()
            .parse::<i32>()
            .map_err(|e| PipelineError::InvalidInput {
                field: "lease_commence_date",
                reason: format!("'{}' is not an integer year ({})", self.lease_commence_date, e),
            })?;
        if !LEASE_YEAR_RANGE.contains(&lease_commence) {
            return Err(PipelineError::InvalidInput {
                field: "lease_commence_date",
                reason: format!(
                    "year {} is outside {}..={}",
                    lease_commence,
                    LEASE_YEAR_RANGE.start(),
                    LEASE_YEAR_RANGE.end()
                ),
            });
        }
        Ok((floor_area, lease_commence))
    }
}

/// The 59-slot model input: 5 standardized numerics followed by the town,
/// flat-type and flat-model one-hot blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    pub const TOWN_OFFSET: usize = NUMERIC_FEATURES;
    pub const FLAT_TYPE_OFFSET: usize = Self::TOWN_OFFSET + TOWN_SLOTS;
    pub const FLAT_MODEL_OFFSET: usize = Self::FLAT_TYPE_OFFSET + FLAT_TYPE_SLOTS;

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn numeric(&self) -> &[f32] {
        &self.0[..Self::TOWN_OFFSET]
    }

    pub fn town(&self) -> &[f32] {
        &self.0[Self::TOWN_OFFSET..Self::FLAT_TYPE_OFFSET]
    }

    pub fn flat_type(&self) -> &[f32] {
        &self.0[Self::FLAT_TYPE_OFFSET..Self::FLAT_MODEL_OFFSET]
    }

    pub fn flat_model(&self) -> &[f32] {
        &self.0[Self::FLAT_MODEL_OFFSET..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

/// Human-readable name of a feature slot, used in error messages
pub fn feature_name(index: usize) -> String {
    match index {
        i if i < FeatureVector::TOWN_OFFSET => NUMERIC_FEATURE_NAMES[i].to_string(),
        i if i < FeatureVector::FLAT_TYPE_OFFSET => format!("town[{}]", i - FeatureVector::TOWN_OFFSET),
        i if i < FeatureVector::FLAT_MODEL_OFFSET => {
            format!("flat_type[{}]", i - FeatureVector::FLAT_TYPE_OFFSET)
        }
        i => format!("flat_model[{}]", i - FeatureVector::FLAT_MODEL_OFFSET),
    }
}

/// Concatenates the numeric and one-hot blocks into a [`FeatureVector`].
///
/// # Errors
/// - `Invariant` if the blocks do not add up to exactly 59 values
/// - `InvalidFeatures` if any slot is NaN or infinite
pub fn assemble(
    numeric: [f32; NUMERIC_FEATURES],
    town: Vec<f32>,
    flat_type: Vec<f32>,
    flat_model: Vec<f32>,
) -> Result<FeatureVector, PipelineError> {
    let total = numeric.len() + town.len() + flat_type.len() + flat_model.len();
    if town.len() != TOWN_SLOTS || flat_type.len() != FLAT_TYPE_SLOTS || flat_model.len() != FLAT_MODEL_SLOTS {
        return Err(PipelineError::Invariant(format!(
            "feature blocks have lengths {}/{}/{}/{} (total {}), expected {}/{}/{}/{} (total {})",
            numeric.len(),
            town.len(),
            flat_type.len(),
            flat_model.len(),
            total,
            NUMERIC_FEATURES,
            TOWN_SLOTS,
            FLAT_TYPE_SLOTS,
            FLAT_MODEL_SLOTS,
            FEATURE_LEN
        )));
    }

    let mut values = [0.0f32; FEATURE_LEN];
    let blocks = numeric.iter().chain(&town).chain(&flat_type).chain(&flat_model);
    for (slot, &value) in values.iter_mut().zip(blocks) {
        *slot = value;
    }

    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::InvalidFeatures {
            index,
            feature: feature_name(index),
        });
    }

    Ok(FeatureVector(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(len: usize, index: Option<usize>) -> Vec<f32> {
        let mut v = vec![0.0; len];
        if let Some(i) = index {
            v[i] = 1.0;
        }
        v
    }

    #[test]
    fn test_assemble_layout() {
        let features = assemble(
            [0.1, 0.2, 0.3, 0.4, 0.5],
            one_hot(TOWN_SLOTS, Some(22)),
            one_hot(FLAT_TYPE_SLOTS, Some(3)),
            one_hot(FLAT_MODEL_SLOTS, None),
        )
        .unwrap();

        assert_eq!(features.len(), 59);
        assert_eq!(features.numeric(), &[0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(features.as_slice()[27], 1.0);
        assert_eq!(features.as_slice()[34], 1.0);
        assert_eq!(features.town().iter().sum::<f32>(), 1.0);
        assert_eq!(features.flat_type().iter().sum::<f32>(), 1.0);
        assert_eq!(features.flat_model().iter().sum::<f32>(), 0.0);
    }

    #[test]
    fn test_assemble_rejects_wrong_block_length() {
        let result = assemble(
            [0.0; NUMERIC_FEATURES],
            one_hot(TOWN_SLOTS - 1, None),
            one_hot(FLAT_TYPE_SLOTS, None),
            one_hot(FLAT_MODEL_SLOTS, None),
        );
        assert!(matches!(result, Err(PipelineError::Invariant(_))));
    }

    #[test]
    fn test_assemble_rejects_nan() {
        let result = assemble(
            [0.0, 0.0, f32::NAN, 0.0, 0.0],
            one_hot(TOWN_SLOTS, None),
            one_hot(FLAT_TYPE_SLOTS, None),
            one_hot(FLAT_MODEL_SLOTS, None),
        );
        match result {
            Err(PipelineError::InvalidFeatures { index, feature }) => {
                assert_eq!(index, 2);
                assert_eq!(feature, "flat_age");
            }
            other => panic!("expected InvalidFeatures, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(feature_name(0), "floor_area_sqm");
        assert_eq!(feature_name(5), "town[0]");
        assert_eq!(feature_name(31), "flat_type[0]");
        assert_eq!(feature_name(58), "flat_model[20]");
    }

    #[test]
    fn test_lease_year_outside_range() {
        for year in ["-2147483648", "2147483647", "1899", "2101"] {
            let input = RawInput {
                floor_area_sqm: "95".into(),
                lease_commence_date: year.into(),
                ..Default::default()
            };
            assert!(matches!(
                input.numeric_fields(),
                Err(PipelineError::InvalidInput { field: "lease_commence_date", .. })
            ));
        }
    }

    #[test]
    fn test_numeric_fields() {
        let input = RawInput {
            floor_area_sqm: " 95.0 ".into(),
            lease_commence_date: "1990".into(),
            ..Default::default()
        };
        assert_eq!(input.numeric_fields().unwrap(), (95.0, 1990));

        let input = RawInput {
            floor_area_sqm: "ninety".into(),
            lease_commence_date: "1990".into(),
            ..Default::default()
        };
        assert!(matches!(
            input.numeric_fields(),
            Err(PipelineError::InvalidInput { field: "floor_area_sqm", .. })
        ));

        let input = RawInput {
            floor_area_sqm: "95".into(),
            lease_commence_date: "1990.5".into(),
            ..Default::default()
        };
        assert!(matches!(
            input.numeric_fields(),
            Err(PipelineError::InvalidInput { field: "lease_commence_date", .. })
        ));
    }
}
