use crate::models::config::EngineConfig;
use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::RecognitionResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::engine::{EngineFault, EventSink, RecognitionEngine};
use super::progress::RECOGNIZING_TEXT;

/// OCR engine backed by a local OCR server over HTTP
pub struct HttpOcrEngine {
    client: reqwest::Client,
    base_url: String,
    language: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image_base64: String,
    mime_type: &'a str,
    lang: &'a str,
}

#[derive(Deserialize)]
struct LanguagesResponse {
    languages: Vec<String>,
}

impl HttpOcrEngine {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineFault> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineFault::Fatal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: None,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineFault> {
        Self::new(&config.server_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a non-2xx response into a message including the body
    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("OCR server error ({}): {}", status, body)
    }
}

#[async_trait]
impl RecognitionEngine for HttpOcrEngine {
    fn name(&self) -> &'static str {
        "http"
    }

    /// Server must answer its health check
    async fn load(&mut self) -> Result<(), EngineFault> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineFault::Fatal(format!("Health check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineFault::Fatal(Self::error_text(response).await));
        }
        Ok(())
    }

    /// Server must list `language` among its installed languages
    async fn load_language(&mut self, language: &str) -> Result<(), EngineFault> {
        let url = format!("{}/languages", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineFault::Fatal(format!("Language query failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineFault::Fatal(Self::error_text(response).await));
        }

        let data: LanguagesResponse = response
            .json()
            .await
            .map_err(|e| EngineFault::Fatal(format!("Failed to parse languages: {}", e)))?;

        if !data.languages.iter().any(|l| l == language) {
            return Err(EngineFault::Fatal(format!(
                "Language '{}' not installed on OCR server (available: {})",
                language,
                data.languages.join(", ")
            )));
        }
        Ok(())
    }

    async fn initialize(&mut self, language: &str) -> Result<(), EngineFault> {
        self.language = Some(language.to_string());
        Ok(())
    }

    async fn recognize(
        &mut self,
        image: &ImageRef,
        events: &EventSink,
    ) -> Result<RecognitionResult, EngineFault> {
        let lang = self
            .language
            .as_deref()
            .ok_or_else(|| EngineFault::Fatal("engine not initialized".to_string()))?;
        let url = format!("{}/ocr", self.base_url);

        events.progress(RECOGNIZING_TEXT, 0.0);

        let response = self
            .client
            .post(&url)
            .json(&ImageRequest {
                image_base64: image.to_base64(),
                mime_type: image.mime_type(),
                lang,
            })
            .send()
            .await
            .map_err(|e| EngineFault::Recoverable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineFault::Recoverable(Self::error_text(response).await));
        }

        let result: RecognitionResult = response
            .json()
            .await
            .map_err(|e| EngineFault::Recoverable(format!("Failed to parse response: {}", e)))?;

        events.progress(RECOGNIZING_TEXT, 1.0);
        Ok(result)
    }
}
