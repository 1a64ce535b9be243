pub mod capture_error;
pub mod frame_source;
pub mod image_encoder;
pub mod photo_capturer;
