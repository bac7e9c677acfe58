use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::error::PipelineError;
use super::features::FeatureVector;
use super::{FEATURE_LEN, NUM_CLASSES};
use crate::config::ModelConfig;
use crate::model_manager::ModelError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// The engine that turns a feature vector into class scores.
///
/// Implementations are shared read-only across concurrent predictions.
/// The ONNX-backed [`OnnxRuntime`] is the production implementation.
pub trait InferenceRuntime: Send + Sync {
    /// Returns the raw logits in the label order of the model configuration.
    ///
    /// # Errors
    /// - `InferenceFailed` if the engine errors or returns malformed output
    fn infer(&self, features: &FeatureVector) -> Result<[f32; NUM_CLASSES], PipelineError>;
}

/// An ONNX Runtime session for the price-range classifier.
///
/// The model is expected to:
/// - Accept one `f32` input of shape `[1, 59]`
/// - Produce one output holding 5 logits (`[1, 5]` or `[5]`)
#[derive(Debug)]
pub struct OnnxRuntime {
    session: Session,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
}

impl OnnxRuntime {
    /// Loads and validates `model.onnx`.
    ///
    /// Besides checking the declared inputs and outputs, a zero vector is run
    /// through the model once so a mismatched artifact fails here rather than
    /// on the first request.
    pub fn load(
        model_path: &Path,
        config: &ModelConfig,
        runtime_config: &RuntimeConfig,
    ) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(ModelError::NotFound(model_path.to_path_buf()).into());
        }

        info!("Loading ONNX model from {:?}", model_path);
        let session = create_session_builder(runtime_config)?
            .commit_from_file(model_path)
            .map_err(ModelError::from)?;

        Self::validate_model(&session, &config.input_name, &config.output_name)?;
        info!("Model structure validated successfully");

        let runtime = Self {
            session,
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            model_path: model_path.to_path_buf(),
        };
        let probe = runtime.run(&[0.0; FEATURE_LEN])?;
        debug!("Warm-up logits: {:?}", probe);

        Ok(runtime)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session, input_name: &str, output_name: &str) -> Result<(), ModelError> {
        let inputs = &session.inputs;
        if inputs.len() != 1 {
            return Err(ModelError::InvalidModel(format!(
                "Model must have exactly 1 input, found {}",
                inputs.len()
            )));
        }
        if inputs[0].name != input_name {
            return Err(ModelError::InvalidModel(format!(
                "Model input is named '{}', configuration expects '{}'",
                inputs[0].name, input_name
            )));
        }

        if !session.outputs.iter().any(|output| output.name == output_name) {
            let names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
            return Err(ModelError::InvalidModel(format!(
                "Model has no output named '{}' (outputs: {:?})",
                output_name, names
            )));
        }

        Ok(())
    }

    fn run(&self, values: &[f32]) -> Result<[f32; NUM_CLASSES], PipelineError> {
        let input_array = Array2::from_shape_vec((1, values.len()), values.to_vec())
            .map_err(|e| PipelineError::InferenceFailed(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| PipelineError::InferenceFailed(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| PipelineError::InferenceFailed(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::InferenceFailed(format!("Failed to extract output tensor: {}", e)))?;

        let scores: Vec<f32> = output_tensor.iter().copied().collect();
        logits_from_slice(&scores)
    }
}

impl InferenceRuntime for OnnxRuntime {
    fn infer(&self, features: &FeatureVector) -> Result<[f32; NUM_CLASSES], PipelineError> {
        self.run(features.as_slice())
    }
}

/// Checks a raw engine output and copies it into a fixed-size score vector.
pub fn logits_from_slice(scores: &[f32]) -> Result<[f32; NUM_CLASSES], PipelineError> {
    if scores.len() != NUM_CLASSES {
        return Err(PipelineError::InferenceFailed(format!(
            "Expected {} logits, model returned {}",
            NUM_CLASSES,
            scores.len()
        )));
    }
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(PipelineError::InferenceFailed(format!(
            "Logit {} is not finite ({})",
            i, scores[i]
        )));
    }
    let mut logits = [0.0; NUM_CLASSES];
    logits.copy_from_slice(scores);
    Ok(logits)
}
