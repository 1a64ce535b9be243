use std::fmt;

use thiserror::Error;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::detection::domain::detection_gate::GateRejection;
use crate::form::register_form::{PhotoSource, RegisterForm};
use crate::form::screen_state::ScreenEvent;
use crate::submission::domain::student_backend::{RegisterRequest, StudentBackend, SubmitError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterOutcome;

impl fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Estudiante registrado exitosamente")
    }
}

/// Why a registration failed. `Display` is the alert text.
#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("Por favor, completa los campos: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Por favor, selecciona una foto.")]
    MissingPhoto,
    #[error(transparent)]
    NoFace(GateRejection),
    #[error("No se pudo capturar la foto.")]
    CaptureFailed(#[source] CaptureError),
    /// Non-2xx answer, or a 2xx answer whose status is not "success".
    #[error("Error: {0}")]
    Rejected(String),
    #[error("Error al registrar el estudiante")]
    Failed(#[source] SubmitError),
}

impl From<CaptureError> for RegisterError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Rejected(rejection) => RegisterError::NoFace(rejection),
            other => RegisterError::CaptureFailed(other),
        }
    }
}

impl From<SubmitError> for RegisterError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Rejected { message, .. } => RegisterError::Rejected(message),
            other => RegisterError::Failed(other),
        }
    }
}

/// validate → make sure there is a photo → one POST → confirmation.
pub struct RegisterStudentUseCase {
    backend: Box<dyn StudentBackend>,
}

impl RegisterStudentUseCase {
    pub fn new(backend: Box<dyn StudentBackend>) -> Self {
        Self { backend }
    }

    /// Registers the student on the form.
    ///
    /// In camera mode a missing photo is captured through `capturer` first.
    /// In file mode the chosen file is sent as is and `capturer` is never used.
    pub fn execute(
        &self,
        form: &mut RegisterForm,
        capturer: Option<&mut dyn PhotoCapturer>,
    ) -> Result<RegisterOutcome, RegisterError> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            return Err(RegisterError::MissingFields(missing));
        }

        let photo = match form.photo() {
            Some(photo) => photo.clone(),
            None => match (form.source(), capturer) {
                (PhotoSource::Camera, Some(capturer)) => form.take_photo(capturer)?.clone(),
                _ => return Err(RegisterError::MissingPhoto),
            },
        };

        let request = RegisterRequest {
            nombre: form.nombre.trim().to_string(),
            apellido: form.apellido.trim().to_string(),
            correo: form.correo.trim().to_string(),
            numero_matricula: form.numero_matricula.trim().to_string(),
            photo,
        };
        log::info!(
            "Registering {} {} ({}, {} bytes photo)",
            request.nombre,
            request.apellido,
            request.numero_matricula,
            request.photo.len()
        );

        form.state.apply(ScreenEvent::SubmitStarted);
        let result = self
            .backend
            .register(&request)
            .map_err(RegisterError::from)
            .and_then(|response| {
                if response.is_success() {
                    Ok(RegisterOutcome)
                } else {
                    Err(RegisterError::Rejected(
                        response.message.unwrap_or(response.status),
                    ))
                }
            });

        match &result {
            Ok(_) => {
                form.state.apply(ScreenEvent::SubmitSucceeded);
            }
            Err(e) => {
                log::error!("Registration of {} failed: {e}", request.numero_matricula);
                form.state.apply(ScreenEvent::SubmitFailed);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::screen_state::ScreenState;
    use crate::shared::photo::Photo;
    use crate::submission::domain::student_backend::{
        CompareRequest, CompareResponse, RegisterResponse,
    };
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubBackend {
        answer: Result<RegisterResponse, SubmitError>,
        requests: Arc<Mutex<Vec<RegisterRequest>>>,
    }

    impl StudentBackend for StubBackend {
        fn compare(&self, _request: &CompareRequest) -> Result<CompareResponse, SubmitError> {
            unreachable!("register flow never compares")
        }

        fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, SubmitError> {
            self.requests.lock().unwrap().push(request.clone());
            self.answer.clone()
        }
    }

    struct StubCamera {
        calls: usize,
        fail: bool,
    }

    impl PhotoCapturer for StubCamera {
        fn capture(&mut self, file_name: &str) -> Result<Photo, CaptureError> {
            self.calls += 1;
            if self.fail {
                return Err(GateRejection::NoFace.into());
            }
            Ok(Photo::jpeg(file_name, vec![0xFF, 0xD8, 0xFF, 0xD9]))
        }
    }

    fn success() -> Result<RegisterResponse, SubmitError> {
        Ok(RegisterResponse {
            status: "success".into(),
            message: None,
        })
    }

    fn use_case(
        answer: Result<RegisterResponse, SubmitError>,
    ) -> (RegisterStudentUseCase, Arc<Mutex<Vec<RegisterRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let backend = StubBackend {
            answer,
            requests: requests.clone(),
        };
        (RegisterStudentUseCase::new(Box::new(backend)), requests)
    }

    fn filled(source: PhotoSource) -> RegisterForm {
        let mut form = RegisterForm::with_identity("Ana", "Pérez", "ana@uni.edu", "2024-001");
        form.set_source(source);
        form
    }

    fn chosen_file() -> Photo {
        Photo {
            file_name: "retrato.png".into(),
            mime: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        }
    }

    // --- Tests ---

    #[test]
    fn test_file_mode_sends_file_unmodified_without_camera() {
        let (use_case, requests) = use_case(success());
        let mut form = filled(PhotoSource::File);
        form.choose_file(chosen_file());
        let mut camera = StubCamera {
            calls: 0,
            fail: false,
        };

        let outcome = use_case.execute(&mut form, Some(&mut camera)).unwrap();

        assert_eq!(outcome.to_string(), "Estudiante registrado exitosamente");
        assert_eq!(camera.calls, 0);
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].photo, chosen_file());
        assert_eq!(requests[0].numero_matricula, "2024-001");
        assert_eq!(form.state, ScreenState::Success);
    }

    #[test]
    fn test_file_mode_without_file_is_missing_photo() {
        let (use_case, requests) = use_case(success());
        let mut form = filled(PhotoSource::File);
        let err = use_case.execute(&mut form, None).unwrap_err();
        assert!(matches!(err, RegisterError::MissingPhoto));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_camera_mode_captures_when_no_photo() {
        let (use_case, requests) = use_case(success());
        let mut form = filled(PhotoSource::Camera);
        let mut camera = StubCamera {
            calls: 0,
            fail: false,
        };

        use_case.execute(&mut form, Some(&mut camera)).unwrap();

        assert_eq!(camera.calls, 1);
        assert_eq!(requests.lock().unwrap()[0].photo.file_name, "Ana_Pérez.jpg");
    }

    #[test]
    fn test_camera_mode_no_face_makes_no_request() {
        let (use_case, requests) = use_case(success());
        let mut form = filled(PhotoSource::Camera);
        let mut camera = StubCamera {
            calls: 0,
            fail: true,
        };

        let err = use_case.execute(&mut form, Some(&mut camera)).unwrap_err();

        assert_eq!(err.to_string(), "No se encontró ninguna cara en la imagen");
        assert!(form.photo().is_none());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_field_makes_no_request() {
        let (use_case, requests) = use_case(success());
        let mut form = filled(PhotoSource::File);
        form.choose_file(chosen_file());
        form.correo = " ".into();

        let err = use_case.execute(&mut form, None).unwrap_err();

        assert_eq!(err.to_string(), "Por favor, completa los campos: correo");
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_success_status_shows_server_message() {
        let (use_case, _) = use_case(Ok(RegisterResponse {
            status: "error".into(),
            message: Some("Matrícula duplicada".into()),
        }));
        let mut form = filled(PhotoSource::File);
        form.choose_file(chosen_file());

        let err = use_case.execute(&mut form, None).unwrap_err();

        assert_eq!(err.to_string(), "Error: Matrícula duplicada");
        assert_eq!(form.state, ScreenState::Failed);
    }

    #[test]
    fn test_http_error_shows_server_message() {
        let (use_case, _) = use_case(Err(SubmitError::Rejected {
            status: 500,
            message: "x".into(),
        }));
        let mut form = filled(PhotoSource::File);
        form.choose_file(chosen_file());
        assert_eq!(
            use_case.execute(&mut form, None).unwrap_err().to_string(),
            "Error: x"
        );
    }

    #[test]
    fn test_transport_failure_is_generic_alert() {
        let (use_case, _) = use_case(Err(SubmitError::Transport("timeout".into())));
        let mut form = filled(PhotoSource::File);
        form.choose_file(chosen_file());
        assert_eq!(
            use_case.execute(&mut form, None).unwrap_err().to_string(),
            "Error al registrar el estudiante"
        );
    }
}
