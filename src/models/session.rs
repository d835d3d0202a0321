use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::FilteredLine;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a presentation shell needs to render a session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    /// Uploaded image, rendered as a data URL when serialized
    pub image: Option<ImageRef>,
    /// Fraction in [0.0, 1.0] of the current or last run; `None` before any progress
    pub progress: Option<f64>,
    pub lines: Vec<FilteredLine>,
    pub recognized_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Progress as a percentage for display
    pub fn progress_percent(&self) -> Option<f64> {
        self.progress.map(|p| p * 100.0)
    }

    /// True when nothing has been uploaded or recognized
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.progress.is_none() && self.lines.is_empty()
    }
}
