use crate::capture::capture_photo_use_case::CapturePhotoUseCase;
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::capture::live_preview::LatestFrame;
use crate::shared::photo::Photo;

/// Takes the photo from whatever the live preview is showing right now.
pub struct LiveCapturer {
    latest: LatestFrame,
    use_case: CapturePhotoUseCase,
}

impl LiveCapturer {
    pub fn new(latest: LatestFrame, use_case: CapturePhotoUseCase) -> Self {
        Self { latest, use_case }
    }
}

impl PhotoCapturer for LiveCapturer {
    fn capture(&mut self, file_name: &str) -> Result<Photo, CaptureError> {
        let frame = self
            .latest
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(CaptureError::CameraNotReady)?;
        self.use_case.capture(&frame, file_name)
    }
}
