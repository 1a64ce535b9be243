use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Per-call detector knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorOptions {
    /// Square network input resolution the frame is scaled to.
    pub input_size: u32,
    /// Minimum score for a detection to be reported.
    pub score_threshold: f64,
}

impl DetectorOptions {
    /// Used on every live preview frame.
    pub const LIVE: DetectorOptions = DetectorOptions {
        input_size: 416,
        score_threshold: 0.5,
    };

    /// Used on the 128×128 still produced by the capture flow.
    pub const CAPTURE: DetectorOptions = DetectorOptions {
        input_size: 128,
        score_threshold: 0.5,
    };
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self::LIVE
    }
}

/// Domain interface for face detection.
///
/// Implementations may keep inference state between calls, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}

/// One detector shared between the live preview loop and the capture flow.
pub type SharedDetector = Arc<Mutex<Box<dyn FaceDetector>>>;

pub fn shared(detector: Box<dyn FaceDetector>) -> SharedDetector {
    Arc::new(Mutex::new(detector))
}

/// Runs `detector` while holding the shared lock.
pub fn detect_shared(
    detector: &SharedDetector,
    frame: &Frame,
    options: &DetectorOptions,
) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
    let mut guard = detector
        .lock()
        .map_err(|_| "face detector lock poisoned")?;
    guard.detect(frame, options)
}
