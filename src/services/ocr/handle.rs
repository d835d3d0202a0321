use crate::error::{OcrError, Result};
use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::RecognitionResult;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::engine::{EngineFactory, EngineFault, EventSink, RecognitionEngine};
use super::progress::ProgressObserver;

/// Lifecycle state of an engine handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Uninitialized,
    Loading,
    Ready,
    Busy,
    Failed,
}

/// Owns one engine instance and serializes access to it
///
/// The engine is built lazily by `ensure_ready`, which runs
/// load -> load_language -> initialize once per handle. A handle that
/// failed to get ready stays `Failed`; callers replace it to retry.
pub struct EngineHandle {
    factory: Arc<dyn EngineFactory>,
    language: String,
    state: Mutex<EngineState>,
    // Only locked by the task that moved the state to Loading or Busy
    engine: tokio::sync::Mutex<Option<Box<dyn RecognitionEngine>>>,
    progress: ProgressObserver,
}

/// Restores `fallback` if the future holding it is dropped while the
/// handle is still in the transitional state `during`
struct StateGuard<'a> {
    state: &'a Mutex<EngineState>,
    during: EngineState,
    fallback: EngineState,
    armed: bool,
}

impl<'a> StateGuard<'a> {
    fn new(state: &'a Mutex<EngineState>, during: EngineState, fallback: EngineState) -> Self {
        Self {
            state,
            during,
            fallback,
            armed: true,
        }
    }

    fn finish(mut self, next: EngineState) {
        *self.state.lock() = next;
        self.armed = false;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock();
            if *state == self.during {
                *state = self.fallback;
            }
        }
    }
}

impl EngineHandle {
    /// Create an uninitialized handle; nothing is loaded until first use
    pub fn new(factory: Arc<dyn EngineFactory>, language: impl Into<String>) -> Self {
        Self {
            factory,
            language: language.into(),
            state: Mutex::new(EngineState::Uninitialized),
            engine: tokio::sync::Mutex::new(None),
            progress: ProgressObserver::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Progress subscription point for recognitions run by this handle
    pub fn progress(&self) -> &ProgressObserver {
        &self.progress
    }

    /// Run the readiness sequence if it has not run yet
    pub async fn ensure_ready(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            match *state {
                EngineState::Ready | EngineState::Busy => return Ok(()),
                EngineState::Loading => return Err(OcrError::EngineBusy),
                EngineState::Failed => {
                    return Err(OcrError::EngineInit(
                        "engine handle failed earlier; create a new handle to retry".to_string(),
                    ))
                }
                EngineState::Uninitialized => *state = EngineState::Loading,
            }
        }
        let guard = StateGuard::new(&self.state, EngineState::Loading, EngineState::Uninitialized);

        let started = Instant::now();
        match self.bring_up().await {
            Ok(engine) => {
                *self.engine.lock().await = Some(engine);
                guard.finish(EngineState::Ready);
                info!(
                    language = %self.language,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "OCR engine ready"
                );
                Ok(())
            }
            Err(e) => {
                guard.finish(EngineState::Failed);
                warn!(language = %self.language, error = %e, "OCR engine failed to initialize");
                Err(e)
            }
        }
    }

    async fn bring_up(&self) -> Result<Box<dyn RecognitionEngine>> {
        let init_err = |step: &str, e: EngineFault| OcrError::EngineInit(format!("{}: {}", step, e));

        let mut engine = self.factory.create().map_err(|e| init_err("create", e))?;
        debug!(engine = engine.name(), "loading OCR engine");

        engine.load().await.map_err(|e| init_err("load", e))?;
        engine
            .load_language(&self.language)
            .await
            .map_err(|e| init_err("load language", e))?;
        engine
            .initialize(&self.language)
            .await
            .map_err(|e| init_err("initialize", e))?;

        Ok(engine)
    }

    /// Recognize text in `image`
    ///
    /// Initializes the engine first when needed. At most one recognition
    /// runs at a time; a concurrent call fails with `EngineBusy`.
    pub async fn recognize(&self, image: &ImageRef) -> Result<RecognitionResult> {
        if self.state() == EngineState::Uninitialized {
            self.ensure_ready().await?;
        }

        let guard = {
            let mut state = self.state.lock();
            match *state {
                EngineState::Ready => *state = EngineState::Busy,
                EngineState::Busy | EngineState::Loading => return Err(OcrError::EngineBusy),
                EngineState::Failed | EngineState::Uninitialized => {
                    return Err(OcrError::EngineInit("OCR engine is not ready".to_string()))
                }
            }
            StateGuard::new(&self.state, EngineState::Busy, EngineState::Ready)
        };

        self.progress.begin_run();
        let sink = EventSink::new(self.progress.clone());
        let started = Instant::now();

        let outcome = {
            let mut slot = self.engine.lock().await;
            match slot.as_mut() {
                Some(engine) => engine.recognize(image, &sink).await,
                None => Err(EngineFault::Fatal("engine instance missing".to_string())),
            }
        };

        match outcome {
            Ok(result) => {
                guard.finish(EngineState::Ready);
                info!(
                    bytes = image.len(),
                    chars = result.text.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "recognition finished"
                );
                Ok(result)
            }
            Err(EngineFault::Recoverable(msg)) => {
                guard.finish(EngineState::Ready);
                warn!(error = %msg, "recognition failed");
                Err(OcrError::Recognition(msg))
            }
            Err(EngineFault::Fatal(msg)) => {
                guard.finish(EngineState::Failed);
                warn!(error = %msg, "OCR engine faulted during recognition");
                Err(OcrError::EngineFailed(msg))
            }
        }
    }

    /// Tear the engine down
    ///
    /// Refused while a recognition is running.
    pub async fn terminate(self) -> Result<()> {
        if self.state() == EngineState::Busy {
            return Err(OcrError::EngineBusy);
        }
        let engine = self.engine.into_inner();
        if let Some(mut engine) = engine {
            debug!(engine = engine.name(), "terminating OCR engine");
            if let Err(e) = engine.terminate().await {
                warn!(error = %e, "OCR engine did not terminate cleanly");
            }
        }
        Ok(())
    }
}
