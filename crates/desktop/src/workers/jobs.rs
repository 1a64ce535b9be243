use std::path::PathBuf;
use std::thread;

use crossbeam_channel::Receiver;

use facecheck_core::capture::capture_photo_use_case::CapturePhotoUseCase;
use facecheck_core::capture::chosen_file_check::ChosenFileCheck;
use facecheck_core::capture::domain::photo_capturer::PhotoCapturer;
use facecheck_core::capture::infrastructure::jpeg_image_encoder::JpegImageEncoder;
use facecheck_core::capture::live_capturer::LiveCapturer;
use facecheck_core::capture::live_preview::LatestFrame;
use facecheck_core::detection::domain::detection_gate::DetectionGate;
use facecheck_core::detection::domain::face_detector::SharedDetector;
use facecheck_core::form::compare_form::CompareForm;
use facecheck_core::form::register_form::RegisterForm;
use facecheck_core::shared::photo::Photo;
use facecheck_core::submission::compare_student_use_case::{CompareError, CompareStudentUseCase};
use facecheck_core::submission::domain::student_backend::BackendConfig;
use facecheck_core::submission::infrastructure::http_student_backend::HttpStudentBackend;
use facecheck_core::submission::register_student_use_case::{
    RegisterError, RegisterStudentUseCase,
};

/// Message shown for a finished job: the outcome on success, the alert otherwise.
pub type Outcome = Result<String, String>;

/// What a background job hands back to the UI.
pub enum JobResult {
    Compared { form: CompareForm, outcome: Outcome },
    Registered { form: RegisterForm, outcome: Outcome },
    PhotoTaken { form: RegisterForm, outcome: Outcome },
    FileChecked(Result<Photo, String>),
}

/// Everything needed to capture from the live preview on a worker thread.
#[derive(Clone)]
pub struct CaptureContext {
    pub latest: LatestFrame,
    pub detector: SharedDetector,
    pub gate: DetectionGate,
}

impl CaptureContext {
    fn capturer(self) -> LiveCapturer {
        let use_case = CapturePhotoUseCase::new(
            self.detector,
            self.gate,
            Box::new(JpegImageEncoder::new()),
        );
        LiveCapturer::new(self.latest, use_case)
    }
}

fn spawn_job(job: impl FnOnce() -> JobResult + Send + 'static) -> Receiver<JobResult> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    rx
}

pub fn compare(
    mut form: CompareForm,
    capture: CaptureContext,
    config: BackendConfig,
) -> Receiver<JobResult> {
    spawn_job(move || {
        let outcome = HttpStudentBackend::new(config)
            .map_err(|e| CompareError::Failed(e).to_string())
            .and_then(|backend| {
                let use_case = CompareStudentUseCase::new(Box::new(backend));
                use_case
                    .execute(&mut form, &mut capture.capturer())
                    .map(|o| o.to_string())
                    .map_err(|e| e.to_string())
            });
        JobResult::Compared { form, outcome }
    })
}

pub fn register(
    mut form: RegisterForm,
    capture: Option<CaptureContext>,
    config: BackendConfig,
) -> Receiver<JobResult> {
    spawn_job(move || {
        let outcome = HttpStudentBackend::new(config)
            .map_err(|e| RegisterError::Failed(e).to_string())
            .and_then(|backend| {
                let use_case = RegisterStudentUseCase::new(Box::new(backend));
                let mut capturer = capture.map(CaptureContext::capturer);
                use_case
                    .execute(
                        &mut form,
                        capturer.as_mut().map(|c| c as &mut dyn PhotoCapturer),
                    )
                    .map(|o| o.to_string())
                    .map_err(|e| e.to_string())
            });
        JobResult::Registered { form, outcome }
    })
}

pub fn take_photo(mut form: RegisterForm, capture: CaptureContext) -> Receiver<JobResult> {
    spawn_job(move || {
        let outcome = form
            .take_photo(&mut capture.capturer())
            .map(|photo| photo.file_name.clone())
            .map_err(|e| RegisterError::from(e).to_string());
        JobResult::PhotoTaken { form, outcome }
    })
}

pub fn check_file(path: PathBuf, detector: SharedDetector, gate: DetectionGate) -> Receiver<JobResult> {
    spawn_job(move || {
        let result = ChosenFileCheck::new(detector, gate)
            .load(&path)
            .map_err(|e| e.to_string());
        JobResult::FileChecked(result)
    })
}
