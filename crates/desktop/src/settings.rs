use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facecheck_core::capture::domain::frame_source::CameraRequest;
use facecheck_core::detection::domain::detection_gate::{DetectionGate, MultiFacePolicy};
use facecheck_core::shared::constants::{
    CAMERA_FPS, CAMERA_HEIGHT, CAMERA_WIDTH, DEFAULT_BACKEND_URL, DEFAULT_CAMERA_DEVICE,
};
use facecheck_core::submission::domain::student_backend::BackendConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultipleFaces {
    Allow,
    Reject,
}

impl MultipleFaces {
    pub const ALL: &[MultipleFaces] = &[MultipleFaces::Allow, MultipleFaces::Reject];
}

impl std::fmt::Display for MultipleFaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultipleFaces::Allow => write!(f, "Permitir"),
            MultipleFaces::Reject => write!(f, "Rechazar"),
        }
    }
}

impl From<MultipleFaces> for MultiFacePolicy {
    fn from(value: MultipleFaces) -> Self {
        match value {
            MultipleFaces::Allow => MultiFacePolicy::Allow,
            MultipleFaces::Reject => MultiFacePolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "Sistema"),
            Appearance::Dark => write!(f, "Oscuro"),
            Appearance::Light => write!(f, "Claro"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    pub camera_device: String,
    pub camera_width: u32,
    pub camera_height: u32,
    #[serde(default = "default_multiple_faces")]
    pub multiple_faces: MultipleFaces,
    pub appearance: Appearance,
    pub high_contrast: bool,
    pub font_scale: f32,
}

fn default_multiple_faces() -> MultipleFaces {
    MultipleFaces::Allow
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            camera_device: DEFAULT_CAMERA_DEVICE.to_string(),
            camera_width: CAMERA_WIDTH,
            camera_height: CAMERA_HEIGHT,
            multiple_faces: default_multiple_faces(),
            appearance: Appearance::System,
            high_contrast: false,
            font_scale: 1.0,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceCheck").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            self.save_to(&path);
        }
    }

    fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::warn!("Could not save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Could not serialize settings: {e}"),
        }
    }

    pub fn camera_request(&self) -> CameraRequest {
        CameraRequest {
            device: self.camera_device.clone(),
            width: self.camera_width,
            height: self.camera_height,
            fps: CAMERA_FPS,
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.backend_url.trim())
    }

    pub fn gate(&self) -> DetectionGate {
        DetectionGate::new(self.multiple_faces.into())
    }
}
