pub mod config;
pub mod image_source;
pub mod ocr;
pub mod session;

pub use config::ConfigManager;
pub use image_source::ImageSource;
pub use session::{RecognitionOutcome, SessionController};
