use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::image_encoder::ImageEncoder;
use crate::detection::domain::detection_gate::DetectionGate;
use crate::detection::domain::face_detector::{detect_shared, DetectorOptions, SharedDetector};
use crate::shared::constants::CAPTURE_SIZE;
use crate::shared::frame::Frame;
use crate::shared::photo::Photo;

/// Still capture: stretch → detect → gate → encode.
///
/// The frame is stretched onto a fixed 128×128 surface (aspect ratio is not
/// preserved) and only encoded once the gate accepts its detections.
pub struct CapturePhotoUseCase {
    detector: SharedDetector,
    gate: DetectionGate,
    encoder: Box<dyn ImageEncoder>,
}

impl CapturePhotoUseCase {
    pub fn new(
        detector: SharedDetector,
        gate: DetectionGate,
        encoder: Box<dyn ImageEncoder>,
    ) -> Self {
        Self {
            detector,
            gate,
            encoder,
        }
    }

    pub fn capture(&self, frame: &Frame, file_name: &str) -> Result<Photo, CaptureError> {
        let still = frame.resized(CAPTURE_SIZE, CAPTURE_SIZE);

        let regions = detect_shared(&self.detector, &still, &DetectorOptions::CAPTURE)
            .map_err(|e| CaptureError::Detection(e.to_string()))?;
        log::debug!(
            "Capture {file_name}: {} face(s) on {CAPTURE_SIZE}x{CAPTURE_SIZE} still",
            regions.len()
        );
        self.gate.check(&regions)?;

        let bytes = self
            .encoder
            .encode(&still)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        log::info!("Captured {file_name} ({} bytes)", bytes.len());
        Ok(Photo::jpeg(file_name, bytes))
    }
}
