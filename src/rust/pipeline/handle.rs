use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{error, info};
use tokio::sync::Mutex;

use super::error::PipelineError;
use super::features::RawInput;
use super::predictor::{PricePredictor, PredictionResult};
use crate::model_manager::ModelManager;
use crate::runtime::RuntimeConfig;

type Loader = dyn Fn() -> Result<PricePredictor, PipelineError> + Send + Sync;

/// Lifecycle state of a [`ModelHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Released,
}

/// What a call to [`ModelHandle::load`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This call ran the loader
    Loaded,
    /// A previous (or concurrent) call had already loaded the model
    AlreadyLoaded,
}

/// Owns the loaded model and its lifecycle.
///
/// Loading runs once on a blocking thread; concurrent `load` calls wait for
/// the one in progress instead of starting another. Predictions never wait:
/// until the model is ready they fail with [`PipelineError::NotReady`].
/// Each prediction holds its own `Arc` to the predictor, so
/// [`release`](Self::release) never pulls a model out from under a request
/// in flight; the session is freed when the last one finishes.
pub struct ModelHandle {
    shared: Arc<Shared>,
}

/// State reachable from the load task, which may outlive the caller's future
struct Shared {
    loader: Arc<Loader>,
    load_lock: Mutex<()>,
    loading: AtomicBool,
    released: AtomicBool,
    predictor: RwLock<Option<Arc<PricePredictor>>>,
}

/// Clears the loading flag when the load task finishes or fails
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Shared {
    async fn load(&self) -> Result<LoadOutcome, PipelineError> {
        let _guard = self.load_lock.lock().await;
        if self.snapshot().is_some() {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let _flag = LoadingFlag::raise(&self.loading);
        info!("Loading model...");
        let loader = Arc::clone(&self.loader);
        let predictor = match tokio::task::spawn_blocking(move || loader()).await {
            Ok(Ok(predictor)) => predictor,
            Ok(Err(e)) => {
                error!("Model load failed: {}", e);
                return Err(e);
            }
            Err(e) => {
                error!("Model load task failed: {}", e);
                return Err(PipelineError::Build(format!("Model load task failed: {}", e)));
            }
        };

        *self.predictor.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(predictor));
        self.released.store(false, Ordering::SeqCst);
        info!("Model ready");
        Ok(LoadOutcome::Loaded)
    }

    fn snapshot(&self) -> Option<Arc<PricePredictor>> {
        self.predictor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ModelHandle {
    /// Creates an unloaded handle that will build its predictor with `loader`
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<PricePredictor, PipelineError> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                loader: Arc::new(loader),
                load_lock: Mutex::new(()),
                loading: AtomicBool::new(false),
                released: AtomicBool::new(false),
                predictor: RwLock::new(None),
            }),
        }
    }

    /// A handle that loads the bundle found by `manager`
    pub fn from_bundle(manager: ModelManager, runtime_config: RuntimeConfig) -> Self {
        Self::new(move || {
            PricePredictor::builder()
                .with_runtime_config(runtime_config.clone())
                .with_bundle(&manager)?
                .build()
        })
    }

    pub fn state(&self) -> ModelState {
        if self.shared.snapshot().is_some() {
            ModelState::Ready
        } else if self.is_loading() {
            ModelState::Loading
        } else if self.shared.released.load(Ordering::SeqCst) {
            ModelState::Released
        } else {
            ModelState::Unloaded
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ModelState::Ready
    }

    /// True while a load is running; lets callers report progress without
    /// waiting on it.
    pub fn is_loading(&self) -> bool {
        self.shared.loading.load(Ordering::SeqCst)
    }

    /// Loads the model unless it is already loaded.
    ///
    /// Safe to call concurrently: only one loader runs, and the other callers
    /// resolve to [`LoadOutcome::AlreadyLoaded`] once it finishes. A failed
    /// load leaves the handle unloaded so the caller may retry.
    ///
    /// The load runs in its own task. Dropping the returned future (for
    /// example under `tokio::time::timeout`) stops waiting but not loading;
    /// a later call waits for that load instead of starting another.
    pub async fn load(&self) -> Result<LoadOutcome, PipelineError> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.load().await })
            .await
            .map_err(|e| PipelineError::Build(format!("Model load task failed: {}", e)))?
    }

    /// The loaded predictor, or `NotReady`
    pub fn predictor(&self) -> Result<Arc<PricePredictor>, PipelineError> {
        self.shared.snapshot().ok_or(PipelineError::NotReady)
    }

    /// Predicts on the calling thread
    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult, PipelineError> {
        self.predictor()?.predict(input)
    }

    /// Predicts with inference moved onto a blocking thread.
    ///
    /// Dropping the future before inference starts cancels the request.
    /// Once the runtime has been invoked, it runs to completion.
    pub async fn predict_async(&self, input: RawInput) -> Result<PredictionResult, PipelineError> {
        let predictor = self.predictor()?;
        let prepared = predictor.prepare(&input)?;

        // Last cancellation point before the runtime is invoked.
        tokio::task::yield_now().await;

        tokio::task::spawn_blocking(move || predictor.classify(prepared))
            .await
            .map_err(|e| PipelineError::InferenceFailed(format!("Inference task failed: {}", e)))?
    }

    /// Drops the handle's reference to the model.
    ///
    /// Returns `false` if nothing was loaded. Requests already holding the
    /// predictor finish normally; new ones get `NotReady` until the next
    /// [`load`](Self::load).
    pub fn release(&self) -> bool {
        let released = self
            .shared
            .predictor
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match released {
            Some(predictor) => {
                self.shared.released.store(true, Ordering::SeqCst);
                info!(
                    "Released model (version {}, {} other references)",
                    predictor.config().version,
                    Arc::strong_count(&predictor) - 1
                );
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        if self.release() {
            info!("Model released on drop");
        }
    }
}
