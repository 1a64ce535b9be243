use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::shared::constants::DEFAULT_BACKEND_URL;
use crate::shared::photo::Photo;

/// Matches the default of `reqwest::blocking`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Absolute URL for an endpoint path such as `/api/comparar_estudiante/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

#[derive(Clone, Debug)]
pub struct CompareRequest {
    pub student_id: String,
    pub photo: Photo,
}

#[derive(Clone, Debug)]
pub struct RegisterRequest {
    pub nombre: String,
    pub apellido: String,
    pub correo: String,
    pub numero_matricula: String,
    pub photo: Photo,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CompareResponse {
    pub es_similar: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl RegisterResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Non-2xx answer. `message` is the server's, or the status text.
    #[error("Error: {message}")]
    Rejected { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The remote service that compares and registers students.
///
/// Each call is exactly one request; nothing is retried.
pub trait StudentBackend: Send {
    fn compare(&self, request: &CompareRequest) -> Result<CompareResponse, SubmitError>;
    fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, SubmitError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8000")]
    #[case("http://localhost:8000/")]
    fn test_endpoint_joins_without_double_slash(#[case] base: &str) {
        assert_eq!(
            BackendConfig::new(base).endpoint("/api/comparar_estudiante/"),
            "http://localhost:8000/api/comparar_estudiante/"
        );
    }

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_register_response_without_message() {
        let parsed: RegisterResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed.message, None);

        let parsed: RegisterResponse =
            serde_json::from_str(r#"{"status":"error","message":"duplicado"}"#).unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed.message.as_deref(), Some("duplicado"));
    }

    #[test]
    fn test_rejected_display_is_alert_text() {
        let err = SubmitError::Rejected {
            status: 500,
            message: "x".into(),
        };
        assert_eq!(err.to_string(), "Error: x");
    }
}
