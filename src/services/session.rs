use crate::error::{OcrError, Result};
use crate::models::config::AppConfig;
use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::FilteredLine;
use crate::models::session::SessionState;
use crate::services::image_source::ImageSource;
use crate::services::ocr::{engine_factory, filter_text, EngineFactory, EngineHandle, EngineState};
use chrono::Utc;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Result of a `recognize` request that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    /// No image uploaded; nothing was done
    Skipped,
    /// Lines now held by the session
    Completed(Vec<FilteredLine>),
    /// The image was cleared or replaced while recognition ran
    Discarded,
}

struct ControllerInner {
    state: SessionState,
    generation: u64,
    // Generation whose run may still write progress and results
    active_run: Option<u64>,
    in_flight: bool,
}

impl ControllerInner {
    fn run_is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.active_run == Some(generation)
    }
}

/// Clears the in-flight flag even if the recognize future is dropped
struct InFlight {
    inner: Arc<Mutex<ControllerInner>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.lock().in_flight = false;
    }
}

/// Session orchestration: upload -> recognize -> filtered lines
///
/// All shell-visible state lives in one `SessionState` value published
/// through a watch channel. Every upload or clear starts a new image
/// generation; a recognition that finishes for an older generation is
/// discarded instead of overwriting newer state.
pub struct SessionController {
    inner: Arc<Mutex<ControllerInner>>,
    updates: Arc<watch::Sender<SessionState>>,
    factory: Arc<dyn EngineFactory>,
    language: String,
    handle: Mutex<Option<Arc<EngineHandle>>>,
}

impl SessionController {
    /// Create an empty session; the engine is built on first recognition
    pub fn new(factory: Arc<dyn EngineFactory>, language: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Mutex::new(ControllerInner {
                state: SessionState::default(),
                generation: 0,
                active_run: None,
                in_flight: false,
            })),
            updates: Arc::new(updates),
            factory,
            language: language.into(),
            handle: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(engine_factory(&config.engine), config.language.clone())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Current state
    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// Receives a fresh `SessionState` after every change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    /// Progress percentages of every run on the current engine handle
    pub fn progress_stream(&self) -> mpsc::UnboundedReceiver<f64> {
        self.engine_handle().progress().stream()
    }

    /// State of the engine handle, `None` before first use
    pub fn engine_state(&self) -> Option<EngineState> {
        self.handle.lock().as_ref().map(|h| h.state())
    }

    pub fn is_recognizing(&self) -> bool {
        self.inner.lock().in_flight
    }

    /// Load the selected file as the session image
    ///
    /// Returns `Ok(false)` when no file was selected. A new image drops
    /// earlier results but does not start recognition. On read failure
    /// the session is left untouched.
    pub async fn upload(&self, path: Option<&Path>) -> Result<bool> {
        match ImageSource::load(path).await? {
            Some(image) => {
                self.upload_image(image);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the session image with one already in memory
    pub fn upload_image(&self, image: ImageRef) {
        self.mutate(|inner| {
            inner.generation += 1;
            inner.active_run = None;
            inner.state = SessionState {
                image: Some(image),
                ..SessionState::default()
            };
        });
        debug!("session image replaced");
    }

    /// Recognize the session image and store its filtered lines
    ///
    /// A second request while one is running fails with `EngineBusy` and
    /// leaves the session as it was. Lines are only replaced when the
    /// whole run succeeds.
    pub async fn recognize(&self) -> Result<RecognitionOutcome> {
        let (image, generation) = {
            let mut inner = self.inner.lock();
            let Some(image) = inner.state.image.clone() else {
                return Ok(RecognitionOutcome::Skipped);
            };
            if inner.in_flight {
                return Err(OcrError::EngineBusy);
            }
            inner.in_flight = true;
            inner.active_run = Some(inner.generation);
            inner.state.progress = None;
            self.updates.send_replace(inner.state.clone());
            (image, inner.generation)
        };
        let _in_flight = InFlight {
            inner: Arc::clone(&self.inner),
        };

        let handle = self.engine_handle();
        info!(generation, bytes = image.len(), "recognition requested");

        let outcome = match handle.ensure_ready().await {
            Ok(()) => handle.recognize(&image).await,
            Err(e) => Err(e),
        };

        let mut inner = self.inner.lock();
        if !inner.run_is_current(generation) {
            debug!(generation, current = inner.generation, "discarding stale recognition");
            return outcome.map(|_| RecognitionOutcome::Discarded);
        }
        inner.active_run = None;

        let result = outcome?;
        let lines = filter_text(&result.text);
        inner.state.lines = lines.clone();
        inner.state.recognized_at = Some(Utc::now());
        self.updates.send_replace(inner.state.clone());

        info!(lines = lines.len(), "recognition stored");
        Ok(RecognitionOutcome::Completed(lines))
    }

    /// Reset image, progress and lines
    ///
    /// The engine handle is kept. A recognition still running is not
    /// aborted; its result will be discarded.
    pub fn clear(&self) {
        self.mutate(|inner| {
            inner.generation += 1;
            inner.active_run = None;
            inner.state = SessionState::default();
        });
        debug!("session cleared");
    }

    /// Terminate the engine handle; the next recognition builds a new one
    ///
    /// This is the only way to recover from a failed engine.
    pub async fn reset_engine(&self) -> Result<()> {
        if self.is_recognizing() {
            return Err(OcrError::EngineBusy);
        }
        let Some(handle) = self.handle.lock().take() else {
            return Ok(());
        };

        match Arc::try_unwrap(handle) {
            Ok(handle) => handle.terminate().await,
            // A run that is just finishing still holds it; dropped after
            Err(_) => {
                warn!("engine handle still shared, skipping engine teardown");
                Ok(())
            }
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut ControllerInner)) {
        let mut inner = self.inner.lock();
        f(&mut inner);
        self.updates.send_replace(inner.state.clone());
    }

    /// Current handle, created and wired to session progress on first use
    fn engine_handle(&self) -> Arc<EngineHandle> {
        let mut slot = self.handle.lock();
        if let Some(handle) = slot.as_ref() {
            return Arc::clone(handle);
        }

        let handle = Arc::new(EngineHandle::new(Arc::clone(&self.factory), self.language.clone()));
        let inner = Arc::clone(&self.inner);
        let updates = Arc::clone(&self.updates);
        handle.progress().on_progress(move |percent| {
            let mut inner = inner.lock();
            if inner.active_run == Some(inner.generation) {
                inner.state.progress = Some(percent / 100.0);
                updates.send_replace(inner.state.clone());
            }
        });

        *slot = Some(Arc::clone(&handle));
        handle
    }
}
