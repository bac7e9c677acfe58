//! Resale-flat price-range prediction on top of an ONNX classifier.
//!
//! Raw listing fields are parsed, standardized and one-hot encoded into a
//! 59-value feature vector, scored by the model, and decoded into one of
//! five price-range labels.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use flatprice::{PricePredictor, RawInput};
//!
//! let predictor = PricePredictor::builder()
//!     .with_config_file("models/preprocessing.json")?
//!     .with_model_file("models/model.onnx")?
//!     .build()?;
//!
//! let input = RawInput {
//!     floor_area_sqm: "95".into(),
//!     town: "TAMPINES".into(),
//!     flat_type: "4 ROOM".into(),
//!     flat_model: "IMPROVED".into(),
//!     storey_range: "07 TO 09".into(),
//!     remaining_lease: "75 years 00 months".into(),
//!     month: "2019-06".into(),
//!     lease_commence_date: "1990".into(),
//! };
//! let result = predictor.predict(&input)?;
//! println!("Predicted range: {}", result.label);
//! # Ok(())
//! # }
//! ```
//!
//! # Loading Off the Request Path
//!
//! [`ModelHandle`] loads the model on a blocking thread and answers
//! [`PipelineError::NotReady`] until it is done:
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use flatprice::{ModelHandle, ModelManager, RuntimeConfig};
//! use std::sync::Arc;
//!
//! let handle = Arc::new(ModelHandle::from_bundle(
//!     ModelManager::new_default()?,
//!     RuntimeConfig::default(),
//! ));
//!
//! let loader = Arc::clone(&handle);
//! tokio::spawn(async move { loader.load().await });
//!
//! // ... later, from any task:
//! // handle.predict_async(input).await
//! handle.release();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod model_manager;
pub mod pipeline;
mod runtime;

pub use config::{FeatureStats, ModelConfig};
pub use model_manager::{ModelError, ModelManager};
pub use pipeline::{
    CategoryGroup, ConfigError, Diagnostic, FeatureVector, InferenceRuntime, LoadOutcome,
    ModelHandle, ModelState, OnnxRuntime, PipelineError, PredictionResult, PredictorBuilder,
    PredictorInfo, PricePredictor, RawInput, FEATURE_LEN, NUM_CLASSES,
};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
