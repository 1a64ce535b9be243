use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::shared::constants::{COMPARE_ENDPOINT, REGISTER_ENDPOINT};
use crate::shared::photo::Photo;
use crate::submission::domain::student_backend::{
    BackendConfig, CompareRequest, CompareResponse, RegisterRequest, RegisterResponse,
    StudentBackend, SubmitError,
};

/// Multipart/form-data client for the student backend.
pub struct HttpStudentBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpStudentBackend {
    pub fn new(config: BackendConfig) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn post<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, SubmitError> {
        let url = self.config.endpoint(path);
        log::info!("POST {url}");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        log::debug!("{url} answered {status}: {body}");

        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| SubmitError::Decode(e.to_string()))
    }
}

fn photo_part(photo: &Photo) -> Result<Part, SubmitError> {
    Part::bytes(photo.bytes.clone())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.mime)
        .map_err(|e| SubmitError::Transport(e.to_string()))
}

/// Error for a non-2xx answer: the JSON `message` if present, the status
/// text if the JSON has none.
fn rejection(status: StatusCode, body: &str) -> SubmitError {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let message = json
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or(status.as_str())
                        .to_string()
                });
            SubmitError::Rejected {
                status: status.as_u16(),
                message,
            }
        }
        Err(e) => SubmitError::Decode(format!("HTTP {status} with non-JSON body: {e}")),
    }
}

impl StudentBackend for HttpStudentBackend {
    fn compare(&self, request: &CompareRequest) -> Result<CompareResponse, SubmitError> {
        let form = Form::new()
            .text("estudiante_id", request.student_id.clone())
            .part("foto", photo_part(&request.photo)?);
        self.post(COMPARE_ENDPOINT, form)
    }

    fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, SubmitError> {
        let form = Form::new()
            .text("nombre", request.nombre.clone())
            .text("apellido", request.apellido.clone())
            .text("correo", request.correo.clone())
            .text("numero_matricula", request.numero_matricula.clone())
            .part("foto", photo_part(&request.photo)?);
        self.post(REGISTER_ENDPOINT, form)
    }
}
