use log::warn;

use crate::config::ModelConfig;

use super::diagnostic::{CategoryGroup, Diagnostic};

/// One-hot encodes `value` against `vocabulary`.
///
/// The value is trimmed and uppercased before an exact comparison. An
/// unmatched value yields a zero vector of the vocabulary's length.
pub fn encode<S: AsRef<str>>(value: &str, vocabulary: &[S]) -> Vec<f32> {
    one_hot(position(value, vocabulary), vocabulary.len())
}

fn position<S: AsRef<str>>(value: &str, vocabulary: &[S]) -> Option<usize> {
    let normalized = value.trim().to_uppercase();
    vocabulary.iter().position(|entry| entry.as_ref() == normalized)
}

fn one_hot(index: Option<usize>, len: usize) -> Vec<f32> {
    let mut one_hot = vec![0.0; len];
    if let Some(index) = index {
        one_hot[index] = 1.0;
    }
    one_hot
}

/// An ordered, uppercase vocabulary for one categorical group
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    group: CategoryGroup,
    entries: Vec<String>,
}

impl Vocabulary {
    pub fn new(group: CategoryGroup, entries: Vec<String>) -> Self {
        Self { group, entries }
    }

    pub fn group(&self) -> CategoryGroup {
        self.group
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        position(value, &self.entries)
    }

    /// One-hot vector for `value`; an unknown value is recorded in
    /// `diagnostics` and encoded as zeros.
    pub fn encode(&self, value: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<f32> {
        let one_hot = encode(value, &self.entries);
        if !one_hot.contains(&1.0) {
            warn!("Unknown {} '{}', encoding as all zeros", self.group, value);
            diagnostics.push(Diagnostic::UnknownCategory {
                group: self.group,
                value: value.to_string(),
            });
        }
        one_hot
    }
}

/// The town, flat-type and flat-model vocabularies of a model
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEncoder {
    pub towns: Vocabulary,
    pub flat_types: Vocabulary,
    pub flat_models: Vocabulary,
}

impl CategoryEncoder {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            towns: Vocabulary::new(CategoryGroup::Town, config.towns.clone()),
            flat_types: Vocabulary::new(CategoryGroup::FlatType, config.flat_types.clone()),
            flat_models: Vocabulary::new(CategoryGroup::FlatModel, config.flat_models.clone()),
        }
    }

    pub fn vocabulary(&self, group: CategoryGroup) -> &Vocabulary {
        match group {
            CategoryGroup::Town => &self.towns,
            CategoryGroup::FlatType => &self.flat_types,
            CategoryGroup::FlatModel => &self.flat_models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_free_function() {
        let vocabulary = ["BEDOK", "TAMPINES", "YISHUN"];
        assert_eq!(encode("TAMPINES", &vocabulary), vec![0.0, 1.0, 0.0]);
        assert_eq!(encode(" tampines ", &vocabulary), vec![0.0, 1.0, 0.0]);
        assert_eq!(encode("TAMPINE", &vocabulary), vec![0.0, 0.0, 0.0]);
        assert!(encode::<&str>("BEDOK", &[]).is_empty());
    }

    #[test]
    fn test_vocabulary_matches_free_encode() {
        let config = ModelConfig::builtin().unwrap();
        let encoder = CategoryEncoder::from_config(&config);
        let mut diagnostics = Vec::new();
        for value in ["tampines", " Bedok ", "ATLANTIS", ""] {
            assert_eq!(
                encoder.towns.encode(value, &mut diagnostics),
                encode(value, &config.towns)
            );
        }
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_unknown_town_is_all_zero() {
        let encoder = CategoryEncoder::from_config(&ModelConfig::builtin().unwrap());
        let mut diagnostics = Vec::new();
        let one_hot = encoder.towns.encode("ATLANTIS", &mut diagnostics);
        assert_eq!(one_hot.len(), 26);
        assert!(one_hot.iter().all(|&v| v == 0.0));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnknownCategory {
                group: CategoryGroup::Town,
                value: "ATLANTIS".to_string()
            }]
        );
    }

    #[test]
    fn test_known_values_case_insensitive() {
        let encoder = CategoryEncoder::from_config(&ModelConfig::builtin().unwrap());
        let mut diagnostics = Vec::new();

        let model = encoder.flat_models.encode("Model A-Maisonette", &mut diagnostics);
        assert_eq!(model.iter().sum::<f32>(), 1.0);
        assert_eq!(encoder.flat_models.index_of("model a-maisonette"), Some(9));

        let flat_type = encoder.flat_types.encode("executive", &mut diagnostics);
        assert_eq!(flat_type[5], 1.0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_no_partial_matching() {
        let encoder = CategoryEncoder::from_config(&ModelConfig::builtin().unwrap());
        assert_eq!(encoder.flat_models.index_of("MODEL"), None);
        assert_eq!(encoder.towns.index_of("KALLANG"), None);
        assert_eq!(encoder.vocabulary(CategoryGroup::Town).index_of("KALLANG/WHAMPOA"), Some(14));
    }
}
