use std::fmt;

use thiserror::Error;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::detection::domain::detection_gate::GateRejection;
use crate::form::compare_form::CompareForm;
use crate::form::screen_state::ScreenEvent;
use crate::submission::domain::student_backend::{CompareRequest, StudentBackend, SubmitError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompareOutcome {
    pub similar: bool,
}

impl fmt::Display for CompareOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.similar {
            f.write_str("Las caras son similares")
        } else {
            f.write_str("Las caras no son similares")
        }
    }
}

/// Why a comparison did not produce a result. `Display` is the alert text.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Por favor, proporciona el ID del estudiante.")]
    MissingStudentId,
    #[error(transparent)]
    Rejected(GateRejection),
    #[error("No se pudo capturar la foto.")]
    CaptureFailed(#[source] CaptureError),
    #[error("Error: {0}")]
    Server(String),
    #[error("Error al comparar las caras")]
    Failed(#[source] SubmitError),
}

impl From<CaptureError> for CompareError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Rejected(rejection) => CompareError::Rejected(rejection),
            other => CompareError::CaptureFailed(other),
        }
    }
}

impl From<SubmitError> for CompareError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Rejected { message, .. } => CompareError::Server(message),
            other => CompareError::Failed(other),
        }
    }
}

/// validate → capture a fresh photo → one POST → result text.
pub struct CompareStudentUseCase {
    backend: Box<dyn StudentBackend>,
}

impl CompareStudentUseCase {
    pub fn new(backend: Box<dyn StudentBackend>) -> Self {
        Self { backend }
    }

    /// Runs the comparison and stores the result text on the form.
    ///
    /// On any error the previous result is left as it was.
    pub fn execute(
        &self,
        form: &mut CompareForm,
        capturer: &mut dyn PhotoCapturer,
    ) -> Result<CompareOutcome, CompareError> {
        if !form.missing_fields().is_empty() {
            return Err(CompareError::MissingStudentId);
        }

        let student_id = form.student_id().to_string();
        form.photo = None;
        let photo = match form.take_photo(capturer) {
            Ok(photo) => photo.clone(),
            Err(e) => {
                if e.is_rejection() {
                    log::info!("Photo for {student_id} refused: {e}");
                } else {
                    log::warn!("Capture for {student_id} failed: {e}");
                }
                return Err(e.into());
            }
        };

        let request = CompareRequest { student_id, photo };
        form.state.apply(ScreenEvent::SubmitStarted);
        match self.backend.compare(&request) {
            Ok(response) => {
                let outcome = CompareOutcome {
                    similar: response.es_similar,
                };
                log::info!("Comparison for {}: {outcome}", request.student_id);
                form.result = Some(outcome.to_string());
                form.state.apply(ScreenEvent::SubmitSucceeded);
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Comparison for {} failed: {e}", request.student_id);
                form.state.apply(ScreenEvent::SubmitFailed);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::screen_state::ScreenState;
    use crate::shared::photo::Photo;
    use crate::submission::domain::student_backend::{
        CompareResponse, RegisterRequest, RegisterResponse,
    };
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubBackend {
        answer: Result<CompareResponse, SubmitError>,
        requests: Arc<Mutex<Vec<CompareRequest>>>,
    }

    impl StudentBackend for StubBackend {
        fn compare(&self, request: &CompareRequest) -> Result<CompareResponse, SubmitError> {
            self.requests.lock().unwrap().push(request.clone());
            self.answer.clone()
        }

        fn register(&self, _request: &RegisterRequest) -> Result<RegisterResponse, SubmitError> {
            unreachable!("compare flow never registers")
        }
    }

    struct StubCapturer {
        result: Option<CaptureError>,
        calls: usize,
    }

    impl StubCapturer {
        fn ok() -> Self {
            Self {
                result: None,
                calls: 0,
            }
        }

        fn failing(error: CaptureError) -> Self {
            Self {
                result: Some(error),
                calls: 0,
            }
        }
    }

    impl PhotoCapturer for StubCapturer {
        fn capture(&mut self, file_name: &str) -> Result<Photo, CaptureError> {
            self.calls += 1;
            match self.result.take() {
                Some(e) => Err(e),
                None => Ok(Photo::jpeg(file_name, vec![0xFF, 0xD8, 0xFF, 0xD9])),
            }
        }
    }

    fn use_case(
        answer: Result<CompareResponse, SubmitError>,
    ) -> (CompareStudentUseCase, Arc<Mutex<Vec<CompareRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let backend = StubBackend {
            answer,
            requests: requests.clone(),
        };
        (CompareStudentUseCase::new(Box::new(backend)), requests)
    }

    // --- Tests ---

    #[test]
    fn test_similar_faces() {
        let (use_case, requests) = use_case(Ok(CompareResponse { es_similar: true }));
        let mut form = CompareForm::with_student_id("S123");

        let outcome = use_case.execute(&mut form, &mut StubCapturer::ok()).unwrap();

        assert!(outcome.similar);
        assert_eq!(form.result.as_deref(), Some("Las caras son similares"));
        assert_eq!(form.state, ScreenState::Success);
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].student_id, "S123");
        assert_eq!(requests[0].photo.file_name, "comparacion_S123.jpg");
    }

    #[test]
    fn test_dissimilar_faces() {
        let (use_case, _) = use_case(Ok(CompareResponse { es_similar: false }));
        let mut form = CompareForm::with_student_id("S9");
        use_case.execute(&mut form, &mut StubCapturer::ok()).unwrap();
        assert_eq!(form.result.as_deref(), Some("Las caras no son similares"));
    }

    #[test]
    fn test_missing_id_makes_no_capture_and_no_request() {
        let (use_case, requests) = use_case(Ok(CompareResponse { es_similar: true }));
        let mut form = CompareForm::with_student_id("  ");
        let mut capturer = StubCapturer::ok();

        let err = use_case.execute(&mut form, &mut capturer).unwrap_err();

        assert_eq!(err.to_string(), "Por favor, proporciona el ID del estudiante.");
        assert_eq!(capturer.calls, 0);
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_face_makes_no_request_and_leaves_photo_unset() {
        let (use_case, requests) = use_case(Ok(CompareResponse { es_similar: true }));
        let mut form = CompareForm::with_student_id("S123");
        form.photo = Some(Photo::jpeg("stale.jpg", vec![1]));
        let mut capturer = StubCapturer::failing(GateRejection::NoFace.into());

        let err = use_case.execute(&mut form, &mut capturer).unwrap_err();

        assert_eq!(err.to_string(), "No se encontró ninguna cara en la imagen");
        assert!(form.photo.is_none());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_camera_not_ready_is_capture_alert() {
        let (use_case, requests) = use_case(Ok(CompareResponse { es_similar: true }));
        let mut form = CompareForm::with_student_id("S123");
        let mut capturer = StubCapturer::failing(CaptureError::CameraNotReady);

        let err = use_case.execute(&mut form, &mut capturer).unwrap_err();

        assert_eq!(err.to_string(), "No se pudo capturar la foto.");
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_server_error_message_shown_and_result_unchanged() {
        let (use_case, _) = use_case(Err(SubmitError::Rejected {
            status: 500,
            message: "x".into(),
        }));
        let mut form = CompareForm::with_student_id("S123");
        form.result = Some("Las caras son similares".into());

        let err = use_case.execute(&mut form, &mut StubCapturer::ok()).unwrap_err();

        assert_eq!(err.to_string(), "Error: x");
        assert_eq!(form.result.as_deref(), Some("Las caras son similares"));
        assert_eq!(form.state, ScreenState::Failed);
    }

    #[test]
    fn test_transport_failure_is_generic_alert() {
        let (use_case, _) = use_case(Err(SubmitError::Transport("refused".into())));
        let mut form = CompareForm::with_student_id("S123");
        let err = use_case.execute(&mut form, &mut StubCapturer::ok()).unwrap_err();
        assert_eq!(err.to_string(), "Error al comparar las caras");
        assert!(form.result.is_none());
    }

    #[test]
    fn test_each_submit_recaptures() {
        let (use_case, requests) = use_case(Ok(CompareResponse { es_similar: true }));
        let mut form = CompareForm::with_student_id("S123");
        let mut capturer = StubCapturer::ok();

        use_case.execute(&mut form, &mut capturer).unwrap();
        use_case.execute(&mut form, &mut capturer).unwrap();

        assert_eq!(capturer.calls, 2);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }
}
