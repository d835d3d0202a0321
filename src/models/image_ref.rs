use crate::error::{OcrError, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Fallback MIME type when the source format is unknown
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Encoded image handed to the recognition engine
///
/// Immutable once built. Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageRef {
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl ImageRef {
    /// Wrap raw bytes with their MIME type
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 payload without the data URL prefix
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Render as `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Parse a base64 data URL
    ///
    /// Only the `;base64` form is accepted. An empty media type
    /// falls back to `application/octet-stream`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| OcrError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| OcrError::InvalidDataUrl("missing ',' separator".to_string()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| OcrError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;

        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| OcrError::InvalidDataUrl(format!("Failed to decode base64: {}", e)))?;

        let mime_type = if mime_type.is_empty() { OCTET_STREAM } else { mime_type };

        Ok(Self::new(bytes, mime_type))
    }
}

// Payloads can be megabytes; keep Debug output short
impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRef")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}
