use crate::error::{OcrError, Result};
use crate::models::image_ref::{ImageRef, OCTET_STREAM};
use image::ImageFormat;
use std::path::Path;

/// Turns user-selected files into `ImageRef`s
///
/// Contents are not validated; an unreadable image surfaces later as a
/// recognition failure.
pub struct ImageSource;

impl ImageSource {
    /// Read the selected file, if any
    ///
    /// `None` means nothing was selected and yields `Ok(None)`.
    pub async fn load(path: Option<&Path>) -> Result<Option<ImageRef>> {
        let Some(path) = path else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| OcrError::SourceRead {
                path: path.to_path_buf(),
                source,
            })?;

        let image = Self::from_bytes(bytes, Self::mime_type_for(path));
        tracing::debug!(path = %path.display(), mime = image.mime_type(), bytes = image.len(), "image loaded");
        Ok(Some(image))
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes(bytes: Vec<u8>, mime_type: &str) -> ImageRef {
        ImageRef::new(bytes, mime_type)
    }

    /// MIME type from the file extension, `application/octet-stream` if unknown
    pub fn mime_type_for(path: &Path) -> &'static str {
        ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or(OCTET_STREAM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: temp file with the given suffix and contents
    fn fixture(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_no_file_is_noop() {
        let result = ImageSource::load(None).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_load_png() {
        let file = fixture(".png", &[0x89, 0x50, 0x4e, 0x47]);

        let image = ImageSource::load(Some(file.path())).await.unwrap().unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.bytes(), &[0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_contents_not_validated() {
        let file = fixture(".jpg", b"definitely not a jpeg");

        let image = ImageSource::load(Some(file.path())).await.unwrap().unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.bytes(), b"definitely not a jpeg");
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let file = fixture(".scan", b"raw");

        let image = ImageSource::load(Some(file.path())).await.unwrap().unwrap();
        assert_eq!(image.mime_type(), OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");

        let err = ImageSource::load(Some(&path)).await.unwrap_err();
        match err {
            OcrError::SourceRead { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(ImageSource::mime_type_for(Path::new("scan.PNG")), "image/png");
        assert_eq!(ImageSource::mime_type_for(Path::new("scan.webp")), "image/webp");
        assert_eq!(ImageSource::mime_type_for(Path::new("scan")), OCTET_STREAM);
    }
}
