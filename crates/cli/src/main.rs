use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use facecheck_core::capture::capture_photo_use_case::CapturePhotoUseCase;
use facecheck_core::capture::chosen_file_check::ChosenFileCheck;
use facecheck_core::capture::domain::frame_source::CameraRequest;
use facecheck_core::capture::domain::photo_capturer::PhotoCapturer;
use facecheck_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
use facecheck_core::capture::infrastructure::jpeg_image_encoder::JpegImageEncoder;
use facecheck_core::capture::live_capturer::LiveCapturer;
use facecheck_core::capture::live_preview::{DetectedFrame, LivePreview, PreviewEvent};
use facecheck_core::capture::overlay::draw_regions;
use facecheck_core::capture::still_capturer::StillCapturer;
use facecheck_core::detection::domain::detection_gate::{DetectionGate, MultiFacePolicy};
use facecheck_core::detection::domain::face_detector::{self, SharedDetector};
use facecheck_core::detection::infrastructure::model_resolver::{self, ModelSource};
use facecheck_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use facecheck_core::form::compare_form::CompareForm;
use facecheck_core::form::register_form::{PhotoSource, RegisterForm};
use facecheck_core::shared::constants::{
    CAMERA_FPS, CAMERA_HEIGHT, CAMERA_WIDTH, DEFAULT_BACKEND_URL, DEFAULT_CAMERA_DEVICE,
    FACE_MODEL_NAME, FACE_MODEL_URL, IMAGE_EXTENSIONS,
};
use facecheck_core::shared::photo::Photo;
use facecheck_core::submission::compare_student_use_case::{CompareError, CompareStudentUseCase};
use facecheck_core::submission::domain::student_backend::BackendConfig;
use facecheck_core::submission::infrastructure::http_student_backend::HttpStudentBackend;
use facecheck_core::submission::register_student_use_case::{RegisterError, RegisterStudentUseCase};

/// How long to wait for the camera before giving up.
const CAMERA_TIMEOUT: Duration = Duration::from_secs(10);

/// Compare or register students by face photo.
#[derive(Parser)]
#[command(name = "facecheck")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: CommonOptions,
}

#[derive(Args)]
struct CommonOptions {
    /// Base URL of the student backend.
    #[arg(long, global = true, default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Camera device to capture from.
    #[arg(long, global = true, default_value = DEFAULT_CAMERA_DEVICE)]
    camera: String,

    /// Face detection model (downloaded to the cache if omitted).
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Requested camera width.
    #[arg(long, global = true, default_value_t = CAMERA_WIDTH)]
    width: u32,

    /// Requested camera height.
    #[arg(long, global = true, default_value_t = CAMERA_HEIGHT)]
    height: u32,

    /// Camera frames to let through before taking the photo.
    #[arg(long, global = true, default_value = "15")]
    warmup: usize,

    /// Also write the submitted photo to this file.
    #[arg(long, global = true)]
    save_photo: Option<PathBuf>,

    /// Write the last preview frame with detection boxes to this file.
    #[arg(long, global = true)]
    save_preview: Option<PathBuf>,

    /// Refuse photos with more than one face.
    #[arg(long, global = true)]
    reject_multiple_faces: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compare a new photo against a registered student.
    Compare {
        /// Student ID.
        #[arg(long = "id")]
        student_id: String,

        /// Run the capture flow on this image instead of the camera.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Register a new student.
    Register {
        #[arg(long)]
        nombre: String,

        #[arg(long)]
        apellido: String,

        #[arg(long)]
        correo: String,

        #[arg(long = "matricula")]
        numero_matricula: String,

        /// Upload this file as is instead of taking a camera photo.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether the submission succeeded. Alerts have already been printed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    if let Some(alert) = missing_fields_alert(&cli.command) {
        eprintln!("{alert}");
        return Ok(false);
    }

    let options = cli.options;
    let detector = build_detector(options.model.as_deref())?;
    let gate = DetectionGate::new(if options.reject_multiple_faces {
        MultiFacePolicy::Reject
    } else {
        MultiFacePolicy::Allow
    });
    let backend = HttpStudentBackend::new(BackendConfig::new(options.backend_url.clone()))?;

    match cli.command {
        Command::Compare { student_id, photo } => {
            let use_case = CompareStudentUseCase::new(Box::new(backend));
            let mut form = CompareForm::with_student_id(student_id);
            let capture = capture_use_case(&detector, gate);

            let result = match photo {
                Some(path) => {
                    let mut capturer = StillCapturer::from_file(&path, capture)?;
                    use_case.execute(&mut form, &mut capturer)
                }
                None => {
                    let session = CameraSession::start(&options, &detector)?;
                    let mut capturer = LiveCapturer::new(session.preview.latest_handle(), capture);
                    let result = use_case.execute(&mut form, &mut capturer);
                    session.finish(options.save_preview.as_deref())?;
                    result
                }
            };
            save_photo(form.photo.as_ref(), options.save_photo.as_deref())?;
            Ok(report(result))
        }
        Command::Register {
            nombre,
            apellido,
            correo,
            numero_matricula,
            photo,
        } => {
            let use_case = RegisterStudentUseCase::new(Box::new(backend));
            let mut form = RegisterForm::with_identity(nombre, apellido, correo, numero_matricula);

            let result = match photo {
                Some(path) => {
                    form.set_source(PhotoSource::File);
                    match ChosenFileCheck::new(detector.clone(), gate).load(&path) {
                        Ok(chosen) => {
                            form.choose_file(chosen);
                            use_case.execute(&mut form, None)
                        }
                        Err(e) => Err(e.into()),
                    }
                }
                None => {
                    form.set_source(PhotoSource::Camera);
                    let session = CameraSession::start(&options, &detector)?;
                    let mut capturer = LiveCapturer::new(
                        session.preview.latest_handle(),
                        capture_use_case(&detector, gate),
                    );
                    let result =
                        use_case.execute(&mut form, Some(&mut capturer as &mut dyn PhotoCapturer));
                    session.finish(options.save_preview.as_deref())?;
                    result
                }
            };
            save_photo(form.photo(), options.save_photo.as_deref())?;
            Ok(report(result))
        }
    }
}

/// The alert for blank identity fields, before any model or camera work.
fn missing_fields_alert(command: &Command) -> Option<String> {
    match command {
        Command::Compare { student_id, .. } => {
            let form = CompareForm::with_student_id(student_id.clone());
            (!form.missing_fields().is_empty()).then(|| CompareError::MissingStudentId.to_string())
        }
        Command::Register {
            nombre,
            apellido,
            correo,
            numero_matricula,
            ..
        } => {
            let form = RegisterForm::with_identity(
                nombre.clone(),
                apellido.clone(),
                correo.clone(),
                numero_matricula.clone(),
            );
            let missing = form.missing_fields();
            (!missing.is_empty()).then(|| RegisterError::MissingFields(missing).to_string())
        }
    }
}

/// Prints the outcome on stdout or the alert on stderr.
fn report<T: Display, E: Display>(result: Result<T, E>) -> bool {
    match result {
        Ok(outcome) => {
            println!("{outcome}");
            true
        }
        Err(alert) => {
            eprintln!("{alert}");
            false
        }
    }
}

/// A running camera preview that has delivered at least `warmup` frames.
struct CameraSession {
    preview: LivePreview,
    last: Option<DetectedFrame>,
}

impl CameraSession {
    fn start(
        options: &CommonOptions,
        detector: &SharedDetector,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let request = CameraRequest {
            device: options.camera.clone(),
            width: options.width,
            height: options.height,
            fps: CAMERA_FPS,
        };
        let preview = LivePreview::start(Box::new(FfmpegCamera::new()), request, detector.clone());

        let mut last = None;
        let mut seen = 0usize;
        while seen < options.warmup.max(1) {
            match preview.events().recv_timeout(CAMERA_TIMEOUT) {
                Ok(PreviewEvent::Opened(info)) => {
                    log::info!("Camera ready: {}x{}", info.width, info.height);
                }
                Ok(PreviewEvent::Frame(detected)) => {
                    seen += 1;
                    eprint!("\rWarming up camera {seen}/{}", options.warmup.max(1));
                    last = Some(detected);
                }
                Ok(PreviewEvent::CameraError(e)) => {
                    return Err(format!("Camera unavailable: {e}").into());
                }
                Ok(PreviewEvent::Ended) => break,
                Err(_) => return Err("Timed out waiting for the camera".into()),
            }
        }
        eprintln!();

        Ok(Self { preview, last })
    }

    /// Stops the camera and optionally writes the annotated preview frame.
    fn finish(mut self, save_preview: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
        while let Ok(event) = self.preview.events().try_recv() {
            if let PreviewEvent::Frame(detected) = event {
                self.last = Some(detected);
            }
        }
        self.preview.stop();

        if let (Some(path), Some(detected)) = (save_preview, self.last) {
            let mut frame = detected.frame;
            draw_regions(&mut frame, &detected.regions);
            frame.to_rgb_image().save(path)?;
            log::info!(
                "Preview with {} face(s) written to {}",
                detected.regions.len(),
                path.display()
            );
        }
        Ok(())
    }
}

fn capture_use_case(detector: &SharedDetector, gate: DetectionGate) -> CapturePhotoUseCase {
    CapturePhotoUseCase::new(detector.clone(), gate, Box::new(JpegImageEncoder::new()))
}

fn build_detector(model: Option<&Path>) -> Result<SharedDetector, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let source = ModelSource {
        name: FACE_MODEL_NAME,
        url: FACE_MODEL_URL,
        explicit: model,
        bundled_dir: None,
    };
    let model_path = model_resolver::resolve(&source, Some(Box::new(download_progress)))?;
    Ok(face_detector::shared(Box::new(OnnxFaceDetector::new(
        &model_path,
    )?)))
}

fn save_photo(photo: Option<&Photo>, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(photo), Some(path)) = (photo, path) {
        fs::write(path, &photo.bytes)?;
        log::info!("Photo {} written to {}", photo.file_name, path.display());
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = &cli.options;
    if !options.backend_url.starts_with("http://") && !options.backend_url.starts_with("https://") {
        return Err(format!(
            "Backend URL must start with http:// or https://, got '{}'",
            options.backend_url
        )
        .into());
    }
    if options.width == 0 || options.height == 0 {
        return Err(format!(
            "Camera size must be positive, got {}x{}",
            options.width, options.height
        )
        .into());
    }
    if let Some(model) = &options.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    let photo = match &cli.command {
        Command::Compare { photo, .. } | Command::Register { photo, .. } => photo,
    };
    if let Some(photo) = photo {
        if !photo.exists() {
            return Err(format!("Photo not found: {}", photo.display()).into());
        }
        if !is_image(photo) {
            return Err(format!(
                "Photo must be one of: {}, got {}",
                IMAGE_EXTENSIONS.join(", "),
                photo.display()
            )
            .into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_compare_defaults() {
        let cli = parse(&["facecheck", "compare", "--id", "S123"]);
        assert_eq!(cli.options.backend_url, "http://localhost:8000");
        assert_eq!(cli.options.width, 640);
        assert!(!cli.options.reject_multiple_faces);
        assert!(matches!(
            cli.command,
            Command::Compare { ref student_id, photo: None } if student_id == "S123"
        ));
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "facecheck",
            "register",
            "--nombre",
            "Ana",
            "--apellido",
            "Pérez",
            "--correo",
            "ana@uni.edu",
            "--matricula",
            "2024-001",
            "--backend-url",
            "https://api.uni.edu",
            "--reject-multiple-faces",
        ]);
        assert_eq!(cli.options.backend_url, "https://api.uni.edu");
        assert!(cli.options.reject_multiple_faces);
    }

    #[test]
    fn test_compare_requires_id() {
        assert!(Cli::try_parse_from(["facecheck", "compare"]).is_err());
    }

    #[test]
    fn test_rejects_bad_backend_url() {
        let cli = parse(&["facecheck", "compare", "--id", "S1", "--backend-url", "localhost"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_rejects_missing_photo() {
        let cli = parse(&["facecheck", "compare", "--id", "S1", "--photo", "/nonexistent/a.jpg"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_blank_id_is_caught_before_setup() {
        let cli = parse(&["facecheck", "compare", "--id", "  "]);
        assert_eq!(
            missing_fields_alert(&cli.command).as_deref(),
            Some("Por favor, proporciona el ID del estudiante.")
        );
        let cli = parse(&["facecheck", "compare", "--id", "S1"]);
        assert!(missing_fields_alert(&cli.command).is_none());
    }

    #[test]
    fn test_blank_register_fields_are_listed() {
        let cli = parse(&[
            "facecheck",
            "register",
            "--nombre",
            "Ana",
            "--apellido",
            " ",
            "--correo",
            "ana@uni.edu",
            "--matricula",
            "",
        ]);
        let alert = missing_fields_alert(&cli.command).unwrap();
        assert!(alert.contains("apellido"));
        assert!(alert.contains("numero_matricula"));
        assert!(!alert.contains("nombre,"));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/b/foto.JPG")));
        assert!(!is_image(Path::new("notas.txt")));
    }
}
