use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::RecognitionResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::progress::ProgressObserver;

/// Status event emitted by an engine while it works
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineEvent {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl EngineEvent {
    pub fn new(status: impl Into<String>, progress: Option<f64>) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }
}

/// Failure reported by an engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineFault {
    /// The operation failed but the engine instance is still usable
    #[error("{0}")]
    Recoverable(String),
    /// The engine instance is unusable from now on
    #[error("fatal: {0}")]
    Fatal(String),
}

impl EngineFault {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Recoverable(msg) | Self::Fatal(msg) => msg,
        }
    }
}

/// Where an engine sends its status events during `recognize`
///
/// Delivery is synchronous and in emission order.
#[derive(Clone)]
pub struct EventSink {
    observer: ProgressObserver,
}

impl EventSink {
    pub(crate) fn new(observer: ProgressObserver) -> Self {
        Self { observer }
    }

    pub fn emit(&self, event: EngineEvent) {
        tracing::trace!(status = %event.status, progress = ?event.progress, "engine event");
        self.observer.observe(&event);
    }

    /// Shorthand for a `status` event carrying a completion fraction
    pub fn progress(&self, status: &str, fraction: f64) {
        self.emit(EngineEvent::new(status, Some(fraction)));
    }
}

/// OCR engine contract
///
/// The handle drives `load`, `load_language` and `initialize` exactly once,
/// in that order, before the first `recognize`.
#[async_trait]
pub trait RecognitionEngine: Send {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Load the engine runtime
    async fn load(&mut self) -> Result<(), EngineFault>;

    /// Make language data for `language` available
    async fn load_language(&mut self, language: &str) -> Result<(), EngineFault>;

    /// Prepare the engine to recognize `language`
    async fn initialize(&mut self, language: &str) -> Result<(), EngineFault>;

    /// Recognize text in `image`, reporting status through `events`
    async fn recognize(
        &mut self,
        image: &ImageRef,
        events: &EventSink,
    ) -> Result<RecognitionResult, EngineFault>;

    /// Release engine resources
    async fn terminate(&mut self) -> Result<(), EngineFault> {
        Ok(())
    }
}

/// Builds fresh engine instances for a handle
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn RecognitionEngine>, EngineFault>;
}

impl<F> EngineFactory for F
where
    F: Fn() -> Result<Box<dyn RecognitionEngine>, EngineFault> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn RecognitionEngine>, EngineFault> {
        self()
    }
}
