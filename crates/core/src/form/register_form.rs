use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::form::screen_state::{ScreenEvent, ScreenState};
use crate::shared::photo::Photo;

/// Where the registration photo comes from. Exactly one is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhotoSource {
    #[default]
    File,
    Camera,
}

/// State of the "register student" screen.
#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub nombre: String,
    pub apellido: String,
    pub correo: String,
    pub numero_matricula: String,
    source: PhotoSource,
    photo: Option<Photo>,
    pub state: ScreenState,
}

impl RegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file-mode form with the identity fields filled in.
    pub fn with_identity(
        nombre: impl Into<String>,
        apellido: impl Into<String>,
        correo: impl Into<String>,
        numero_matricula: impl Into<String>,
    ) -> Self {
        Self {
            nombre: nombre.into(),
            apellido: apellido.into(),
            correo: correo.into(),
            numero_matricula: numero_matricula.into(),
            ..Self::default()
        }
    }

    pub fn source(&self) -> PhotoSource {
        self.source
    }

    /// Switches the photo source. Any photo from the old source is discarded.
    pub fn set_source(&mut self, source: PhotoSource) {
        if self.source == source {
            return;
        }
        self.source = source;
        if self.photo.take().is_some() {
            self.state.apply(ScreenEvent::PhotoDiscarded);
        }
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    /// Sets a chosen file as the photo. Only valid in file mode.
    pub fn choose_file(&mut self, photo: Photo) -> bool {
        if self.source != PhotoSource::File {
            log::warn!("Ignoring chosen file while the camera is the photo source");
            return false;
        }
        self.photo = Some(photo);
        self.state.apply(ScreenEvent::PhotoTaken);
        true
    }

    /// Captures a photo from the camera, keeping the old one on failure.
    pub fn take_photo(
        &mut self,
        capturer: &mut dyn PhotoCapturer,
    ) -> Result<&Photo, CaptureError> {
        let photo = capturer.capture(&self.photo_file_name())?;
        self.state.apply(ScreenEvent::PhotoTaken);
        Ok(self.photo.insert(photo))
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("nombre", &self.nombre),
            ("apellido", &self.apellido),
            ("correo", &self.correo),
            ("numero_matricula", &self.numero_matricula),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn photo_file_name(&self) -> String {
        format!("{}_{}.jpg", self.nombre.trim(), self.apellido.trim())
    }
}
