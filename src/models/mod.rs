pub mod config;
pub mod image_ref;
pub mod ocr_result;
pub mod session;
