use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::detection_gate::GateRejection;

/// Failure of a capture flow. `Display` is the text shown to the user.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Rejected(#[from] GateRejection),
    #[error("La cámara todavía no está lista")]
    CameraNotReady,
    #[error("Error al detectar caras: {0}")]
    Detection(String),
    #[error("No se pudo codificar la foto: {0}")]
    Encode(String),
    #[error("No se pudo leer {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No se pudo decodificar {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl CaptureError {
    /// True when the photo was refused because of its faces, not an I/O problem.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CaptureError::Rejected(_))
    }
}
