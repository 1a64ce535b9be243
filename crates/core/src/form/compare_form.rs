use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::form::screen_state::{ScreenEvent, ScreenState};
use crate::shared::photo::Photo;

/// State of the "compare student" screen.
#[derive(Clone, Debug, Default)]
pub struct CompareForm {
    pub student_id: String,
    pub photo: Option<Photo>,
    /// Text of the last comparison, shown under the form.
    pub result: Option<String>,
    pub state: ScreenState,
}

impl CompareForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_student_id(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            ..Self::default()
        }
    }

    pub fn student_id(&self) -> &str {
        self.student_id.trim()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        if self.student_id().is_empty() {
            vec!["estudiante_id"]
        } else {
            Vec::new()
        }
    }

    pub fn photo_file_name(&self) -> String {
        format!("comparacion_{}.jpg", self.student_id())
    }

    /// Captures a new photo, replacing the old one only on success.
    pub fn take_photo(
        &mut self,
        capturer: &mut dyn PhotoCapturer,
    ) -> Result<&Photo, CaptureError> {
        let photo = capturer.capture(&self.photo_file_name())?;
        self.state.apply(ScreenEvent::PhotoTaken);
        Ok(self.photo.insert(photo))
    }
}
