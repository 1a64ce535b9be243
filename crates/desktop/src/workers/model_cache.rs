use std::sync::{Arc, Mutex};
use std::thread;

use facecheck_core::detection::domain::face_detector::{self, SharedDetector};
use facecheck_core::detection::infrastructure::model_resolver::{self, ModelSource};
use facecheck_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use facecheck_core::shared::constants::{FACE_MODEL_NAME, FACE_MODEL_URL};

#[derive(Clone)]
pub enum ModelStatus {
    /// Resolving or downloading; `(downloaded, total)` bytes, total 0 if unknown.
    Loading(u64, u64),
    Ready(SharedDetector),
    Failed(String),
}

/// Loads the face detector in the background at startup.
///
/// Screens poll [`ModelCache::status`] on each tick and enable capture once
/// the detector is ready.
pub struct ModelCache {
    status: Arc<Mutex<ModelStatus>>,
}

impl ModelCache {
    pub fn new() -> Arc<Self> {
        let cache = Arc::new(Self {
            status: Arc::new(Mutex::new(ModelStatus::Loading(0, 0))),
        });

        let status = cache.status.clone();
        thread::spawn(move || {
            let result = load_detector(status.clone());
            let next = match result {
                Ok(detector) => {
                    log::info!("Face detector ready");
                    ModelStatus::Ready(detector)
                }
                Err(e) => {
                    log::error!("Failed to load face detector: {e}");
                    ModelStatus::Failed(e)
                }
            };
            if let Ok(mut guard) = status.lock() {
                *guard = next;
            }
        });

        cache
    }

    /// A cache that never loads anything; it reports `status` forever.
    #[cfg(test)]
    pub fn with_status(status: ModelStatus) -> Arc<Self> {
        Arc::new(Self {
            status: Arc::new(Mutex::new(status)),
        })
    }

    pub fn status(&self) -> ModelStatus {
        self.status
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| ModelStatus::Failed("model cache lock poisoned".into()))
    }

    pub fn detector(&self) -> Option<SharedDetector> {
        match self.status() {
            ModelStatus::Ready(detector) => Some(detector),
            _ => None,
        }
    }
}

fn load_detector(status: Arc<Mutex<ModelStatus>>) -> Result<SharedDetector, String> {
    let bundled_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")));
    let source = ModelSource {
        name: FACE_MODEL_NAME,
        url: FACE_MODEL_URL,
        explicit: None,
        bundled_dir: bundled_dir.as_deref(),
    };
    let model_path = model_resolver::resolve(
        &source,
        Some(Box::new(move |downloaded, total| {
            if let Ok(mut guard) = status.lock() {
                *guard = ModelStatus::Loading(downloaded, total);
            }
        })),
    )
    .map_err(|e| e.to_string())?;

    let detector = OnnxFaceDetector::new(&model_path).map_err(|e| e.to_string())?;
    Ok(face_detector::shared(Box::new(detector)))
}
