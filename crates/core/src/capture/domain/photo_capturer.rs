use crate::capture::domain::capture_error::CaptureError;
use crate::shared::photo::Photo;

/// Produces a gated, encoded photo on demand ("take photo").
pub trait PhotoCapturer {
    fn capture(&mut self, file_name: &str) -> Result<Photo, CaptureError>;
}
