pub mod engine;
pub mod filter;
pub mod handle;
pub mod http_ocr;
pub mod progress;
#[cfg(test)]
pub(crate) mod scripted;
#[cfg(feature = "tesseract")]
pub mod tesseract;

// Re-export main types
pub use engine::{EngineEvent, EngineFactory, EngineFault, EventSink, RecognitionEngine};
pub use filter::filter_text;
pub use handle::{EngineHandle, EngineState};
pub use http_ocr::HttpOcrEngine;
pub use progress::{ProgressObserver, SubscriptionId, RECOGNIZING_TEXT};

use crate::models::config::{EngineBackend, EngineConfig};
use std::sync::Arc;

/// Engine factory for the configured backend
pub fn engine_factory(config: &EngineConfig) -> Arc<dyn EngineFactory> {
    let config = config.clone();
    Arc::new(move || -> Result<Box<dyn RecognitionEngine>, EngineFault> {
        match config.backend {
            EngineBackend::Http => Ok(Box::new(HttpOcrEngine::from_config(&config)?)),
            #[cfg(feature = "tesseract")]
            EngineBackend::Tesseract => Ok(Box::new(tesseract::TesseractEngine::from_config(&config))),
            #[cfg(not(feature = "tesseract"))]
            EngineBackend::Tesseract => Err(EngineFault::Fatal(
                "built without the `tesseract` feature".to_string(),
            )),
        }
    })
}
