pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const COMPARE_ENDPOINT: &str = "/api/comparar_estudiante/";
pub const REGISTER_ENDPOINT: &str = "/api/registrar_estudiante/";

/// Side of the square still produced by the capture flow.
pub const CAPTURE_SIZE: u32 = 128;
pub const CAPTURE_MIME: &str = "image/jpeg";

pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;
pub const CAMERA_FPS: u32 = 30;

#[cfg(target_os = "linux")]
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
