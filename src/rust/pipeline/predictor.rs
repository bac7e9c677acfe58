use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use super::decode::DecisionDecoder;
use super::diagnostic::Diagnostic;
use super::encoding::CategoryEncoder;
use super::error::PipelineError;
use super::features::{assemble, FeatureVector, RawInput};
use super::fields::{compute_flat_age, parse_reference_year, parse_remaining_lease_years, parse_storey_midpoint};
use super::inference::InferenceRuntime;
use super::standardize::Standardizer;
use super::NUM_CLASSES;
use crate::config::ModelConfig;

/// Value substituted for an unparseable storey range or remaining lease
pub const UNKNOWN_NUMERIC_DEFAULT: f32 = 0.0;

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// One of the model's five price-range labels
    pub label: String,
    pub class_index: usize,
    /// Softmax of the model's logits, in label order
    pub probabilities: [f32; NUM_CLASSES],
    /// Default substitutions and unknown categories met on the way
    pub diagnostics: Vec<Diagnostic>,
}

impl PredictionResult {
    pub fn used_defaults(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Features prepared for one request, before the runtime is called
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFeatures {
    pub features: FeatureVector,
    pub diagnostics: Vec<Diagnostic>,
}

/// The preprocessing, inference and decoding steps of one model version.
///
/// Thread-safe: every field is immutable after construction and the
/// runtime is shared through an `Arc`.
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use flatprice::{PricePredictor, RawInput};
///
/// let predictor = PricePredictor::builder()
///     .with_model_file("models/model.onnx")?
///     .build()?;
///
/// let result = predictor.predict(&RawInput {
///     floor_area_sqm: "95".into(),
///     town: "TAMPINES".into(),
///     flat_type: "4 ROOM".into(),
///     flat_model: "IMPROVED".into(),
///     storey_range: "07 TO 09".into(),
///     remaining_lease: "75 years 00 months".into(),
///     month: "2019-06".into(),
///     lease_commence_date: "1990".into(),
/// })?;
/// println!("Predicted range: {}", result.label);
/// # Ok(())
/// # }
/// ```
pub struct PricePredictor {
    pub(crate) config: Arc<ModelConfig>,
    pub(crate) standardizer: Standardizer,
    pub(crate) encoder: CategoryEncoder,
    pub(crate) decoder: DecisionDecoder,
    pub(crate) runtime: Arc<dyn InferenceRuntime>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<PricePredictor>();
    }
};

impl std::fmt::Debug for PricePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricePredictor")
            .field("version", &self.config.version)
            .field("standardizer", &self.standardizer)
            .field("labels", &self.decoder.labels())
            .finish_non_exhaustive()
    }
}

impl PricePredictor {
    /// Creates a new PredictorBuilder for fluent construction
    pub fn builder() -> super::builder::PredictorBuilder {
        super::builder::PredictorBuilder::new()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Turns raw fields into a validated feature vector.
    ///
    /// # Errors
    /// - `InvalidInput` for a non-numeric floor area or a non-integer
    ///   lease-commencement year
    /// - `InvalidFeatures` if any assembled slot is NaN or infinite
    pub fn prepare(&self, input: &RawInput) -> Result<PreparedFeatures, PipelineError> {
        let (floor_area, lease_commence) = input.numeric_fields()?;
        let mut diagnostics = Vec::new();

        let reference_year = parse_reference_year(&input.month, self.config.fallback_year);
        if reference_year.is_default() {
            warn!(
                "Month '{}' is not YYYY-MM, using fallback year {}",
                input.month, self.config.fallback_year
            );
            diagnostics.push(Diagnostic::ReferenceYearDefaulted {
                raw: input.month.clone(),
                substituted: self.config.fallback_year,
            });
        }

        let flat_age = compute_flat_age(self.config.reference_year_anchor, lease_commence);

        let storey = parse_storey_midpoint(&input.storey_range).unwrap_or_else(|| {
            warn!(
                "Storey range '{}' is not 'L TO U', using {}",
                input.storey_range, UNKNOWN_NUMERIC_DEFAULT
            );
            diagnostics.push(Diagnostic::StoreyRangeDefaulted {
                raw: input.storey_range.clone(),
                substituted: UNKNOWN_NUMERIC_DEFAULT,
            });
            UNKNOWN_NUMERIC_DEFAULT
        });

        let remaining_lease = parse_remaining_lease_years(&input.remaining_lease).unwrap_or_else(|| {
            warn!(
                "Remaining lease '{}' is unparseable, using {}",
                input.remaining_lease, UNKNOWN_NUMERIC_DEFAULT
            );
            diagnostics.push(Diagnostic::RemainingLeaseDefaulted {
                raw: input.remaining_lease.clone(),
                substituted: UNKNOWN_NUMERIC_DEFAULT,
            });
            UNKNOWN_NUMERIC_DEFAULT
        });

        let numeric = self.standardizer.transform([
            floor_area,
            reference_year.value(),
            flat_age,
            storey,
            remaining_lease,
        ]);
        let town = self.encoder.towns.encode(&input.town, &mut diagnostics);
        let flat_type = self.encoder.flat_types.encode(&input.flat_type, &mut diagnostics);
        let flat_model = self.encoder.flat_models.encode(&input.flat_model, &mut diagnostics);

        let features = assemble(numeric, town, flat_type, flat_model)?;
        debug!("Assembled features: {:?}", features.as_slice());

        Ok(PreparedFeatures {
            features,
            diagnostics,
        })
    }

    /// Runs prepared features through the model and decodes the label
    pub fn classify(&self, prepared: PreparedFeatures) -> Result<PredictionResult, PipelineError> {
        let logits = self.runtime.infer(&prepared.features)?;
        debug!("Logits: {:?}", logits);
        let decision = self.decoder.decode(&logits)?;

        Ok(PredictionResult {
            label: decision.label,
            class_index: decision.class_index,
            probabilities: decision.probabilities,
            diagnostics: prepared.diagnostics,
        })
    }

    /// Predicts the price range of a flat.
    ///
    /// # Errors
    /// Everything [`prepare`](Self::prepare) rejects, plus `InferenceFailed`
    /// and `Invariant` from the runtime and decoder. A rejected request
    /// never reaches the runtime.
    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult, PipelineError> {
        let prepared = self.prepare(input)?;
        self.classify(prepared)
    }
}
