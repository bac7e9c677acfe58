#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use env_logger::{Builder, Env};
use flatprice::{FeatureVector, InferenceRuntime, PipelineError, PricePredictor, RawInput, NUM_CLASSES};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Returns the same logits for every request and counts invocations
pub struct FixedRuntime {
    pub logits: [f32; NUM_CLASSES],
    pub calls: AtomicUsize,
}

impl FixedRuntime {
    pub fn new(logits: [f32; NUM_CLASSES]) -> Arc<Self> {
        Arc::new(Self {
            logits,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceRuntime for FixedRuntime {
    fn infer(&self, _features: &FeatureVector) -> Result<[f32; NUM_CLASSES], PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.logits)
    }
}

/// Scores each class by how large the floor-area feature is, so bigger
/// flats land in pricier buckets.
pub struct FloorAreaRuntime;

impl InferenceRuntime for FloorAreaRuntime {
    fn infer(&self, features: &FeatureVector) -> Result<[f32; NUM_CLASSES], PipelineError> {
        let area = features.numeric()[0];
        let mut logits = [0.0; NUM_CLASSES];
        for (class, logit) in logits.iter_mut().enumerate() {
            let center = class as f32 - 2.0;
            *logit = -(area - center).powi(2);
        }
        Ok(logits)
    }
}

/// Simulates an engine returning the wrong number of scores
pub struct MalformedRuntime;

impl InferenceRuntime for MalformedRuntime {
    fn infer(&self, _features: &FeatureVector) -> Result<[f32; NUM_CLASSES], PipelineError> {
        flatprice::pipeline::logits_from_slice(&[0.5, 0.5, 0.5])
    }
}

pub fn predictor_with(runtime: Arc<dyn InferenceRuntime>) -> PricePredictor {
    PricePredictor::builder()
        .with_runtime(runtime)
        .and_then(|builder| builder.build())
        .expect("Failed to create predictor")
}

pub fn tampines_input() -> RawInput {
    RawInput {
        floor_area_sqm: "95.0".into(),
        town: "TAMPINES".into(),
        flat_type: "4 ROOM".into(),
        flat_model: "IMPROVED".into(),
        storey_range: "07 TO 09".into(),
        remaining_lease: "75 years 00 months".into(),
        month: "2019-06".into(),
        lease_commence_date: "1990".into(),
    }
}
