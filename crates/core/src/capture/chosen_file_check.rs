use std::path::Path;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::infrastructure::photo_file::read_photo;
use crate::detection::domain::detection_gate::DetectionGate;
use crate::detection::domain::face_detector::{detect_shared, DetectorOptions, SharedDetector};
use crate::shared::photo::Photo;

/// Accepts a user-chosen photo only if a face can be found on it.
///
/// The returned photo is the file exactly as it is on disk.
pub struct ChosenFileCheck {
    detector: SharedDetector,
    gate: DetectionGate,
}

impl ChosenFileCheck {
    pub fn new(detector: SharedDetector, gate: DetectionGate) -> Self {
        Self { detector, gate }
    }

    pub fn load(&self, path: &Path) -> Result<Photo, CaptureError> {
        let (photo, frame) = read_photo(path)?;
        let regions = detect_shared(&self.detector, &frame, &DetectorOptions::LIVE)
            .map_err(|e| CaptureError::Detection(e.to_string()))?;
        log::debug!("{}: {} face(s)", path.display(), regions.len());
        self.gate.check(&regions)?;
        log::info!("Accepted {} ({} bytes)", photo.file_name, photo.len());
        Ok(photo)
    }
}
