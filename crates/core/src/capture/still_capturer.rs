use std::path::Path;

use crate::capture::capture_photo_use_case::CapturePhotoUseCase;
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::capture::infrastructure::photo_file::read_photo;
use crate::shared::frame::Frame;
use crate::shared::photo::Photo;

/// Runs the camera capture flow over a decoded still image instead of a
/// live frame, for machines without a webcam.
pub struct StillCapturer {
    frame: Frame,
    use_case: CapturePhotoUseCase,
}

impl StillCapturer {
    pub fn new(frame: Frame, use_case: CapturePhotoUseCase) -> Self {
        Self { frame, use_case }
    }

    pub fn from_file(path: &Path, use_case: CapturePhotoUseCase) -> Result<Self, CaptureError> {
        let (_, frame) = read_photo(path)?;
        Ok(Self::new(frame, use_case))
    }
}

impl PhotoCapturer for StillCapturer {
    fn capture(&mut self, file_name: &str) -> Result<Photo, CaptureError> {
        self.use_case.capture(&self.frame, file_name)
    }
}
