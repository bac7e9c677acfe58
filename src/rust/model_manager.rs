use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::ModelConfig;
use crate::pipeline::ConfigError;

pub const MODEL_FILE: &str = "model.onnx";
pub const CONFIG_FILE: &str = "preprocessing.json";
/// Environment variable that overrides the bundle directory
pub const MODEL_DIR_ENV: &str = "FLATPRICE_MODEL_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model bundle file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file:?}")]
    HashMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("ONNX Runtime initialization failed: {0}")]
    Runtime(String),
    #[error("Model structure invalid: {0}")]
    InvalidModel(String),
}

/// Locates the model bundle: a directory holding `model.onnx` and the
/// `preprocessing.json` versioned with it.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Creates a new ModelManager with the default bundle directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default bundle directory path
    pub fn get_default_models_dir() -> PathBuf {
        Self::default_models_dir_from(env::var(MODEL_DIR_ENV).ok())
    }

    fn default_models_dir_from(env_override: Option<String>) -> PathBuf {
        // 1. Check environment variable
        if let Some(path) = env_override {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("flatprice").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("flatprice").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("flatprice").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self) -> PathBuf {
        self.models_dir.join(MODEL_FILE)
    }

    pub fn get_config_path(&self) -> PathBuf {
        self.models_dir.join(CONFIG_FILE)
    }

    pub fn is_bundle_present(&self) -> bool {
        let model_path = self.get_model_path();
        let config_path = self.get_config_path();
        log::info!("Checking model bundle:");
        log::info!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::info!("  Config path: {:?} (exists: {})", config_path, config_path.exists());
        model_path.exists() && config_path.exists()
    }

    /// Loads the bundle's configuration, falling back to the builtin one
    /// when the bundle ships only a model file.
    pub fn load_config(&self) -> Result<ModelConfig, ConfigError> {
        let config_path = self.get_config_path();
        if config_path.exists() {
            ModelConfig::from_file(&config_path)
        } else {
            log::warn!("No {} in {:?}, using builtin configuration", CONFIG_FILE, self.models_dir);
            ModelConfig::builtin()
        }
    }

    fn hash_file(path: &Path) -> Result<String, ModelError> {
        log::info!("Hashing file: {:?}", path);
        let bytes = fs::read(path)?;
        log::info!("Read {} bytes", bytes.len());
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Checks `model.onnx` against the checksum recorded in `config`.
    ///
    /// Configurations without a checksum are accepted as-is.
    pub fn verify_bundle(&self, config: &ModelConfig) -> Result<(), ModelError> {
        let model_path = self.get_model_path();
        if !model_path.exists() {
            return Err(ModelError::NotFound(model_path));
        }

        let Some(expected) = config.model_sha256.as_deref() else {
            log::warn!("Configuration {} has no model checksum, skipping verification", config.version);
            return Ok(());
        };

        let actual = Self::hash_file(&model_path)?;
        log::info!("Calculated hash: {}", actual);
        log::info!("Expected hash:   {}", expected);
        if !actual.eq_ignore_ascii_case(expected) {
            log::error!("Model hash mismatch for {:?}", model_path);
            return Err(ModelError::HashMismatch {
                file: model_path,
                expected: expected.to_string(),
                actual,
            });
        }
        log::info!("Model file verified successfully");
        Ok(())
    }
}
