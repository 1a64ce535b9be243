use crate::shared::constants::{CAMERA_FPS, CAMERA_HEIGHT, CAMERA_WIDTH, DEFAULT_CAMERA_DEVICE};
use crate::shared::frame::Frame;

/// What to ask the capture device for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraRequest {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraRequest {
    fn default() -> Self {
        Self {
            device: DEFAULT_CAMERA_DEVICE.to_string(),
            width: CAMERA_WIDTH,
            height: CAMERA_HEIGHT,
            fps: CAMERA_FPS,
        }
    }
}

/// What the device actually delivers once opened.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub format: String,
}

/// A live stream of frames, typically a webcam.
///
/// The source is held open between `open` and `close`; callers must call
/// `close` when done so the device is released.
pub trait FrameSource: Send {
    fn open(&mut self, request: &CameraRequest) -> Result<CameraInfo, Box<dyn std::error::Error>>;

    /// Blocks until the next frame is decoded. `None` means the stream ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    fn close(&mut self);
}
