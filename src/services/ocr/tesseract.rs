use crate::models::config::EngineConfig;
use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::RecognitionResult;
use async_trait::async_trait;
use leptess::LepTess;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::engine::{EngineFault, EventSink, RecognitionEngine};
use super::progress::RECOGNIZING_TEXT;

/// In-process Tesseract engine
pub struct TesseractEngine {
    tessdata_dir: Option<PathBuf>,
    // Shared with the blocking task so a dropped recognition cannot lose it
    api: Option<Arc<Mutex<LepTess>>>,
    language: Option<String>,
}

impl TesseractEngine {
    pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
        Self {
            tessdata_dir,
            api: None,
            language: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tessdata_dir.clone())
    }

    fn datapath(&self) -> Option<String> {
        self.tessdata_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned())
    }
}

fn recognize_blocking(api: &mut LepTess, bytes: &[u8]) -> Result<(String, i32), EngineFault> {
    api.set_image_from_mem(bytes)
        .map_err(|e| EngineFault::Recoverable(format!("Failed to set image: {}", e)))?;
    let text = api
        .get_utf8_text()
        .map_err(|e| EngineFault::Recoverable(format!("Failed to recognize text: {}", e)))?;
    Ok((text, api.mean_text_conf()))
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn load(&mut self) -> Result<(), EngineFault> {
        if let Some(dir) = &self.tessdata_dir {
            if !dir.is_dir() {
                return Err(EngineFault::Fatal(format!(
                    "tessdata directory not found: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Creating the API loads the language's traineddata
    async fn load_language(&mut self, language: &str) -> Result<(), EngineFault> {
        let datapath = self.datapath();
        let language = language.to_string();

        let api = tokio::task::spawn_blocking(move || LepTess::new(datapath.as_deref(), &language))
            .await
            .map_err(|e| EngineFault::Fatal(format!("Tesseract init task failed: {}", e)))?
            .map_err(|e| EngineFault::Fatal(format!("Failed to load language data: {}", e)))?;

        self.api = Some(Arc::new(Mutex::new(api)));
        Ok(())
    }

    async fn initialize(&mut self, language: &str) -> Result<(), EngineFault> {
        if self.api.is_none() {
            return Err(EngineFault::Fatal("language data not loaded".to_string()));
        }
        self.language = Some(language.to_string());
        Ok(())
    }

    async fn recognize(
        &mut self,
        image: &ImageRef,
        events: &EventSink,
    ) -> Result<RecognitionResult, EngineFault> {
        let api = self
            .api
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| EngineFault::Fatal("engine not initialized".to_string()))?;
        let bytes = image.bytes().to_vec();

        events.progress(RECOGNIZING_TEXT, 0.0);

        // A task left running by a dropped call finishes before this one locks
        let (text, confidence) = tokio::task::spawn_blocking(move || {
            let mut api = api.blocking_lock();
            recognize_blocking(&mut api, &bytes)
        })
        .await
        .map_err(|e| EngineFault::Fatal(format!("Tesseract task panicked: {}", e)))??;

        events.progress(RECOGNIZING_TEXT, 1.0);
        Ok(RecognitionResult {
            text,
            confidence: Some(confidence as f32),
            metadata: Default::default(),
        })
    }

    async fn terminate(&mut self) -> Result<(), EngineFault> {
        self.api = None;
        self.language = None;
        Ok(())
    }
}
