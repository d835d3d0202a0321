use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to callers of the session operations
#[derive(Error, Debug)]
pub enum OcrError {
    /// The selected file could not be read
    #[error("Failed to read image source {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image data URL: {0}")]
    InvalidDataUrl(String),

    /// Load, language configuration or initialization failed.
    /// The handle that raised it stays `Failed` until it is replaced.
    #[error("OCR engine initialization failed: {0}")]
    EngineInit(String),

    #[error("OCR engine is busy with another recognition")]
    EngineBusy,

    /// The engine rejected this particular image; the handle stays usable
    #[error("Recognition failed: {0}")]
    Recognition(String),

    /// The engine reported an unrecoverable fault mid-recognition
    #[error("OCR engine failed: {0}")]
    EngineFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OcrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_read_message_names_path() {
        let err = OcrError::SourceRead {
            path: PathBuf::from("/tmp/missing.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        let message = err.to_string();
        assert!(message.contains("missing.png"), "got: {}", message);
        assert!(message.contains("not found"), "got: {}", message);
    }

    #[test]
    fn test_busy_message() {
        assert_eq!(
            OcrError::EngineBusy.to_string(),
            "OCR engine is busy with another recognition"
        );
    }
}
