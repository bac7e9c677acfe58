use std::path::Path;
use std::sync::Arc;

use log::{error, info};

use super::decode::DecisionDecoder;
use super::encoding::CategoryEncoder;
use super::error::PipelineError;
use super::inference::{InferenceRuntime, OnnxRuntime};
use super::predictor::PricePredictor;
use super::standardize::Standardizer;
use crate::config::ModelConfig;
use crate::model_manager::ModelManager;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a [`PricePredictor`] with a fluent interface.
///
/// The configuration must be chosen before the model is loaded, since the
/// tensor names it carries are checked against the model. Without an
/// explicit configuration the builtin one is used.
#[derive(Default)]
pub struct PredictorBuilder {
    config: Option<ModelConfig>,
    runtime: Option<Arc<dyn InferenceRuntime>>,
    runtime_config: RuntimeConfig,
}

impl std::fmt::Debug for PredictorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorBuilder")
            .field("config", &self.config.as_ref().map(|c| c.version.as_str()))
            .field("runtime_loaded", &self.runtime.is_some())
            .field("runtime_config", &self.runtime_config)
            .finish()
    }
}

impl PredictorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Uses `config` instead of the builtin preprocessing configuration.
    ///
    /// # Errors
    /// - `Build` if a model has already been loaded
    /// - `Config` if the configuration fails validation
    pub fn with_config(mut self, config: ModelConfig) -> Result<Self, PipelineError> {
        if self.runtime.is_some() {
            return Err(PipelineError::Build(
                "Configuration must be set before the model is loaded".to_string(),
            ));
        }
        config.validate()?;
        self.config = Some(config);
        Ok(self)
    }

    /// Reads the configuration from a `preprocessing.json` file
    pub fn with_config_file<P: AsRef<Path>>(self, path: P) -> Result<Self, PipelineError> {
        let config = ModelConfig::from_file(path)?;
        self.with_config(config)
    }

    /// Loads an ONNX model file with the current configuration.
    ///
    /// # Errors
    /// - `Build` if a runtime is already set
    /// - `Model` if the file is missing, unreadable, or does not have the
    ///   configured input and output
    /// - `InferenceFailed` if the warm-up run does not yield 5 logits
    pub fn with_model_file<P: AsRef<Path>>(mut self, model_path: P) -> Result<Self, PipelineError> {
        if self.runtime.is_some() {
            return Err(PipelineError::Build("Model already loaded".to_string()));
        }
        let config = match self.config.take() {
            Some(config) => config,
            None => ModelConfig::builtin()?,
        };

        let runtime = OnnxRuntime::load(model_path.as_ref(), &config, &self.runtime_config).map_err(|e| {
            error!("Failed to load model: {}", e);
            e
        })?;
        info!("Model loaded from {:?}", runtime.model_path());

        self.config = Some(config);
        self.runtime = Some(Arc::new(runtime));
        Ok(self)
    }

    /// Loads configuration and model from a bundle directory, verifying the
    /// model checksum when the configuration records one.
    pub fn with_bundle(self, manager: &ModelManager) -> Result<Self, PipelineError> {
        let config = manager.load_config()?;
        manager.verify_bundle(&config)?;
        self.with_config(config)?.with_model_file(manager.get_model_path())
    }

    /// Uses a caller-supplied inference runtime instead of an ONNX model
    pub fn with_runtime(mut self, runtime: Arc<dyn InferenceRuntime>) -> Result<Self, PipelineError> {
        if self.runtime.is_some() {
            return Err(PipelineError::Build("Runtime already set".to_string()));
        }
        self.runtime = Some(runtime);
        Ok(self)
    }

    /// Builds and returns the final PricePredictor instance
    ///
    /// # Errors
    /// - `Build` if no model or runtime has been set
    /// - `Config` if the configuration is invalid
    pub fn build(self) -> Result<PricePredictor, PipelineError> {
        let runtime = self
            .runtime
            .ok_or_else(|| PipelineError::Build("A model or runtime must be set".to_string()))?;
        let config = match self.config {
            Some(config) => config,
            None => ModelConfig::builtin()?,
        };

        let standardizer = Standardizer::new(&config.numeric)?;
        let encoder = CategoryEncoder::from_config(&config);
        let decoder = DecisionDecoder::new(config.labels.clone());
        info!("Predictor built for configuration version {}", config.version);

        Ok(PricePredictor {
            config: Arc::new(config),
            standardizer,
            encoder,
            decoder,
            runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FeatureVector, NUM_CLASSES};

    struct FixedRuntime;

    impl InferenceRuntime for FixedRuntime {
        fn infer(&self, _features: &FeatureVector) -> Result<[f32; NUM_CLASSES], PipelineError> {
            Ok([0.0, 1.0, 0.0, 0.0, 0.0])
        }
    }

    #[test]
    fn test_build_requires_runtime() {
        let result = PricePredictor::builder().build();
        assert!(matches!(result, Err(PipelineError::Build(_))));
    }

    #[test]
    fn test_build_with_runtime_uses_builtin_config() -> Result<(), PipelineError> {
        let predictor = PricePredictor::builder()
            .with_runtime(Arc::new(FixedRuntime))?
            .build()?;
        assert_eq!(predictor.config().towns.len(), 26);
        Ok(())
    }

    #[test]
    fn test_duplicate_runtime() {
        let result = PricePredictor::builder()
            .with_runtime(Arc::new(FixedRuntime))
            .and_then(|builder| builder.with_runtime(Arc::new(FixedRuntime)));
        assert!(matches!(result, Err(PipelineError::Build(_))));
    }

    #[test]
    fn test_config_after_runtime_rejected() {
        let result = PricePredictor::builder()
            .with_runtime(Arc::new(FixedRuntime))
            .and_then(|builder| builder.with_config(ModelConfig::builtin()?));
        assert!(matches!(result, Err(PipelineError::Build(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ModelConfig::builtin().unwrap();
        config.numeric[0].std = 0.0;
        let result = PricePredictor::builder().with_config(config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_model_file() {
        let result = PricePredictor::builder().with_model_file("/nonexistent/model.onnx");
        assert!(matches!(result, Err(PipelineError::Model(_))));
    }
}
