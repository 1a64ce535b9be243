use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::{button, column, container, image, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};

use facecheck_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
use facecheck_core::capture::live_preview::{LivePreview, PreviewEvent};
use facecheck_core::capture::overlay::draw_regions;
use facecheck_core::form::compare_form::CompareForm;
use facecheck_core::form::register_form::{PhotoSource, RegisterForm};
use facecheck_core::form::screen_state::ScreenEvent;
use facecheck_core::shared::constants::IMAGE_EXTENSIONS;
use facecheck_core::shared::photo::Photo;

use crate::screens;
use crate::settings::{Appearance, MultipleFaces, Settings};
use crate::theme;
use crate::workers::jobs::{self, CaptureContext, JobResult, Outcome};
use crate::workers::model_cache::{ModelCache, ModelStatus};

const TICK: Duration = Duration::from_millis(33);
const MODEL_NOT_READY: &str = "El modelo de detección todavía se está cargando.";

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Compare,
    Register,
    Settings,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Compare, Tab::Register, Tab::Settings];

    fn label(self) -> &'static str {
        match self {
            Tab::Compare => "Comparar",
            Tab::Register => "Registrar",
            Tab::Settings => "Ajustes",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    StudentIdChanged(String),
    CompareSubmit,
    NombreChanged(String),
    ApellidoChanged(String),
    CorreoChanged(String),
    MatriculaChanged(String),
    UseCamera,
    UseFile,
    TakePhoto,
    ChooseFile,
    FileChosen(Option<PathBuf>),
    RegisterSubmit,
    BackendUrlChanged(String),
    CameraDeviceChanged(String),
    MultipleFacesChanged(MultipleFaces),
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    RestoreDefaults,
    Tick,
    AlertClosed,
    PollSystemTheme,
}

// ---------------------------------------------------------------------------
// Screen-side state
// ---------------------------------------------------------------------------

/// The face detector as the screens see it.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelView {
    /// Download percentage, if known.
    Loading(Option<u32>),
    Ready,
    Failed(String),
}

impl ModelView {
    pub fn is_ready(&self) -> bool {
        *self == ModelView::Ready
    }
}

/// A running camera preview and the last frame rendered from it.
pub struct CameraView {
    preview: LivePreview,
    pub handle: Option<image::Handle>,
    pub faces: usize,
    pub error: Option<String>,
}

struct PendingJob {
    rx: Receiver<JobResult>,
    tab: Tab,
    generation: u64,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    models: Arc<ModelCache>,
    model: ModelView,
    compare: CompareForm,
    register: RegisterForm,
    register_thumbnail: Option<image::Handle>,
    camera: Option<CameraView>,
    jobs: Vec<PendingJob>,
    /// Bumped whenever a screen is left; results of older jobs are dropped.
    generation: u64,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        (
            Self::with_services(Settings::load(), ModelCache::new()),
            Task::none(),
        )
    }

    fn with_services(settings: Settings, models: Arc<ModelCache>) -> Self {
        Self {
            active_tab: Tab::Compare,
            settings,
            models,
            model: ModelView::Loading(None),
            compare: CompareForm::new(),
            register: RegisterForm::new(),
            register_thumbnail: None,
            camera: None,
            jobs: Vec::new(),
            generation: 0,
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                if tab != self.active_tab {
                    self.leave_screen();
                    self.active_tab = tab;
                }
            }
            Message::StudentIdChanged(value) => {
                self.compare.student_id = value;
            }
            Message::CompareSubmit => {
                if self.is_busy(Tab::Compare) {
                    return Task::none();
                }
                let Some(capture) = self.capture_context() else {
                    return alert(MODEL_NOT_READY);
                };
                let rx = jobs::compare(
                    self.compare.clone(),
                    capture,
                    self.settings.backend_config(),
                );
                self.track(rx, Tab::Compare);
            }
            Message::NombreChanged(value) => self.register.nombre = value,
            Message::ApellidoChanged(value) => self.register.apellido = value,
            Message::CorreoChanged(value) => self.register.correo = value,
            Message::MatriculaChanged(value) => self.register.numero_matricula = value,
            Message::UseCamera => {
                self.register.set_source(PhotoSource::Camera);
                self.register_thumbnail = None;
            }
            Message::UseFile => {
                self.register.set_source(PhotoSource::File);
                self.register_thumbnail = None;
                self.stop_camera();
            }
            Message::TakePhoto => {
                if self.is_busy(Tab::Register) {
                    return Task::none();
                }
                let Some(capture) = self.capture_context() else {
                    return alert(MODEL_NOT_READY);
                };
                let rx = jobs::take_photo(self.register.clone(), capture);
                self.track(rx, Tab::Register);
            }
            Message::ChooseFile => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Seleccionar foto")
                            .add_filter("Imágenes", IMAGE_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::FileChosen,
                );
            }
            Message::FileChosen(Some(path)) => {
                let Some(detector) = self.models.detector() else {
                    return alert(MODEL_NOT_READY);
                };
                let rx = jobs::check_file(path, detector, self.settings.gate());
                self.track(rx, Tab::Register);
            }
            Message::FileChosen(None) => {}
            Message::RegisterSubmit => {
                if self.is_busy(Tab::Register) {
                    return Task::none();
                }
                let capture = match self.register.source() {
                    PhotoSource::Camera => {
                        let capture = self.capture_context();
                        // Without a photo the job has to capture one.
                        if capture.is_none() && self.register.photo().is_none() {
                            return alert(MODEL_NOT_READY);
                        }
                        capture
                    }
                    PhotoSource::File => None,
                };
                let rx = jobs::register(
                    self.register.clone(),
                    capture,
                    self.settings.backend_config(),
                );
                self.track(rx, Tab::Register);
            }
            Message::BackendUrlChanged(url) => {
                self.settings.backend_url = url;
                self.settings.save();
            }
            Message::CameraDeviceChanged(device) => {
                self.settings.camera_device = device;
                self.settings.save();
            }
            Message::MultipleFacesChanged(policy) => {
                self.settings.multiple_faces = policy;
                self.settings.save();
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::RestoreDefaults => {
                self.settings = Settings::default();
                self.settings.save();
            }
            Message::Tick => {
                self.poll_model();
                self.ensure_camera();
                self.poll_camera();
                return self.poll_jobs();
            }
            Message::AlertClosed => {}
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;
        let theme = self.theme();

        // Tab bar
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        // Tab content
        let content: Element<'_, Message> = match self.active_tab {
            Tab::Compare => screens::compare_screen::view(
                fs,
                &self.compare,
                self.camera.as_ref(),
                &self.model,
                self.is_busy(Tab::Compare),
                &theme,
            ),
            Tab::Register => screens::register_screen::view(
                fs,
                &self.register,
                self.camera.as_ref(),
                self.register_thumbnail.as_ref(),
                &self.model,
                self.is_busy(Tab::Register),
                &theme,
            ),
            Tab::Settings => screens::settings_screen::view(&self.settings),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        column![tab_bar, tab_content]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let loading = matches!(self.model, ModelView::Loading(_));
        let camera_running = self.camera.as_ref().is_some_and(|c| c.preview.is_running());
        let tick = if camera_running || !self.jobs.is_empty() || loading || self.wants_camera() {
            iced::time::every(TICK).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };
        let system_theme = if self.settings.appearance == Appearance::System {
            iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme)
        } else {
            Subscription::none()
        };
        Subscription::batch([tick, system_theme])
    }

    // -----------------------------------------------------------------------
    // Camera
    // -----------------------------------------------------------------------

    fn wants_camera(&self) -> bool {
        match self.active_tab {
            Tab::Compare => true,
            Tab::Register => self.register.source() == PhotoSource::Camera,
            Tab::Settings => false,
        }
    }

    /// Starts the preview once the screen needs it and the detector is loaded.
    fn ensure_camera(&mut self) {
        if self.camera.is_some() || !self.wants_camera() {
            return;
        }
        let Some(detector) = self.models.detector() else {
            return;
        };
        let preview = LivePreview::start(
            Box::new(FfmpegCamera::new()),
            self.settings.camera_request(),
            detector,
        );
        self.camera = Some(CameraView {
            preview,
            handle: None,
            faces: 0,
            error: None,
        });
    }

    fn stop_camera(&mut self) {
        if self.camera.take().is_some() {
            self.compare.state.apply(ScreenEvent::CameraStopped);
            self.register.state.apply(ScreenEvent::CameraStopped);
        }
    }

    fn poll_camera(&mut self) {
        let Some(camera) = self.camera.as_mut() else {
            return;
        };

        let mut newest = None;
        while let Ok(event) = camera.preview.events().try_recv() {
            match event {
                PreviewEvent::Opened(_) => {
                    let form_state = match self.active_tab {
                        Tab::Compare => &mut self.compare.state,
                        _ => &mut self.register.state,
                    };
                    form_state.apply(ScreenEvent::CameraStarted);
                }
                PreviewEvent::Frame(detected) => newest = Some(detected),
                PreviewEvent::CameraError(e) => {
                    // Already logged by the preview worker; the well stays blank.
                    camera.error = Some(e);
                    camera.handle = None;
                }
                PreviewEvent::Ended => {
                    camera.error = Some("El video de la cámara terminó".to_string());
                }
            }
        }

        if let Some(detected) = newest {
            let mut frame = detected.frame;
            draw_regions(&mut frame, &detected.regions);
            camera.faces = detected.regions.len();
            camera.handle = Some(image::Handle::from_rgba(
                frame.width(),
                frame.height(),
                frame.to_rgba(),
            ));
        }
    }

    fn capture_context(&self) -> Option<CaptureContext> {
        let detector = self.models.detector()?;
        let latest = match &self.camera {
            Some(camera) => camera.preview.latest_handle(),
            None => Default::default(),
        };
        Some(CaptureContext {
            latest,
            detector,
            gate: self.settings.gate(),
        })
    }

    // -----------------------------------------------------------------------
    // Background work
    // -----------------------------------------------------------------------

    fn poll_model(&mut self) {
        self.model = match self.models.status() {
            ModelStatus::Loading(downloaded, total) => ModelView::Loading(
                (total > 0).then(|| (downloaded as f64 / total as f64 * 100.0) as u32),
            ),
            ModelStatus::Ready(_) => ModelView::Ready,
            ModelStatus::Failed(e) => ModelView::Failed(e),
        };
    }

    fn leave_screen(&mut self) {
        self.stop_camera();
        self.generation += 1;
    }

    fn track(&mut self, rx: Receiver<JobResult>, tab: Tab) {
        self.jobs.push(PendingJob {
            rx,
            tab,
            generation: self.generation,
        });
    }

    fn is_busy(&self, tab: Tab) -> bool {
        self.jobs
            .iter()
            .any(|job| job.tab == tab && job.generation == self.generation)
    }

    fn poll_jobs(&mut self) -> Task<Message> {
        let mut finished = Vec::new();
        self.jobs.retain(|job| match job.rx.try_recv() {
            Ok(result) => {
                finished.push((job.generation, result));
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => false,
        });

        let mut alerts = Vec::new();
        for (generation, result) in finished {
            if generation != self.generation {
                log::debug!("Discarding result of a job from a closed screen");
                continue;
            }
            if let Some(message) = self.apply_job(result) {
                alerts.push(alert(&message));
            }
        }
        Task::batch(alerts)
    }

    /// Merges a finished job into the screen state. Returns the alert to show.
    fn apply_job(&mut self, result: JobResult) -> Option<String> {
        match result {
            JobResult::Compared { form, outcome } => {
                self.compare.photo = form.photo;
                self.compare.result = form.result;
                self.compare.state = form.state;
                outcome.err()
            }
            JobResult::PhotoTaken { form, outcome } => {
                self.merge_register(form);
                outcome.err()
            }
            JobResult::Registered { form, outcome } => {
                self.merge_register(form);
                Some(flatten(outcome))
            }
            JobResult::FileChecked(Ok(photo)) => {
                self.set_register_photo(photo);
                None
            }
            JobResult::FileChecked(Err(e)) => Some(e),
        }
    }

    /// Keeps what the user typed meanwhile; takes photo and state from the job.
    fn merge_register(&mut self, mut form: RegisterForm) {
        if form.source() != self.register.source() {
            return;
        }
        form.nombre = std::mem::take(&mut self.register.nombre);
        form.apellido = std::mem::take(&mut self.register.apellido);
        form.correo = std::mem::take(&mut self.register.correo);
        form.numero_matricula = std::mem::take(&mut self.register.numero_matricula);
        self.register_thumbnail = form.photo().map(thumbnail);
        self.register = form;
    }

    fn set_register_photo(&mut self, photo: Photo) {
        let handle = thumbnail(&photo);
        if self.register.choose_file(photo) {
            self.register_thumbnail = Some(handle);
        }
    }
}

fn thumbnail(photo: &Photo) -> image::Handle {
    image::Handle::from_bytes(photo.bytes.clone())
}

fn flatten(outcome: Outcome) -> String {
    match outcome {
        Ok(message) | Err(message) => message,
    }
}

/// Shows a modal message box, like a browser `alert`.
fn alert(message: &str) -> Task<Message> {
    let message = message.to_string();
    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_title("FaceCheck")
                .set_description(message)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::AlertClosed,
    )
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(scaled(13.0, 1.25), 16.0);
        assert_eq!(scaled(14.0, 1.0), 14.0);
    }

    #[test]
    fn test_flatten_takes_either_side() {
        assert_eq!(flatten(Ok("listo".into())), "listo");
        assert_eq!(flatten(Err("Error: x".into())), "Error: x");
    }

    #[test]
    fn test_model_view_ready() {
        assert!(ModelView::Ready.is_ready());
        assert!(!ModelView::Loading(Some(40)).is_ready());
        assert!(!ModelView::Failed("x".into()).is_ready());
    }

    #[test]
    fn test_tab_labels() {
        let labels: Vec<_> = Tab::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Comparar", "Registrar", "Ajustes"]);
    }

    // --- Job results ---

    use facecheck_core::capture::domain::capture_error::CaptureError;
    use facecheck_core::capture::domain::photo_capturer::PhotoCapturer;

    struct Snapshot;

    impl PhotoCapturer for Snapshot {
        fn capture(&mut self, file_name: &str) -> Result<Photo, CaptureError> {
            Ok(Photo::jpeg(file_name, vec![0xFF, 0xD8, 0xFF, 0xD9]))
        }
    }

    fn app(status: ModelStatus) -> App {
        App::with_services(Settings::default(), ModelCache::with_status(status))
    }

    fn finished(result: JobResult) -> Receiver<JobResult> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.send(result).unwrap();
        rx
    }

    fn camera_form_with_photo(app: &App) -> RegisterForm {
        let mut form = app.register.clone();
        form.take_photo(&mut Snapshot).unwrap();
        form
    }

    #[test]
    fn test_compare_result_applied_on_same_screen() {
        let mut app = app(ModelStatus::Failed("sin modelo".into()));
        let mut done = app.compare.clone();
        done.result = Some("Las caras son similares".into());
        app.track(
            finished(JobResult::Compared {
                form: done,
                outcome: Ok("Las caras son similares".into()),
            }),
            Tab::Compare,
        );

        let _ = app.poll_jobs();
        assert_eq!(app.compare.result.as_deref(), Some("Las caras son similares"));
        assert!(app.jobs.is_empty());
    }

    #[test]
    fn test_compare_result_dropped_after_leaving_screen() {
        let mut app = app(ModelStatus::Failed("sin modelo".into()));
        let mut done = app.compare.clone();
        done.result = Some("Las caras son similares".into());
        app.track(
            finished(JobResult::Compared {
                form: done,
                outcome: Ok("Las caras son similares".into()),
            }),
            Tab::Compare,
        );

        let _ = app.update(Message::TabSelected(Tab::Register));
        assert!(!app.is_busy(Tab::Compare));
        let _ = app.poll_jobs();
        assert!(app.compare.result.is_none());
        assert!(app.jobs.is_empty());
    }

    #[test]
    fn test_photo_taken_dropped_after_switching_to_file() {
        let mut app = app(ModelStatus::Failed("sin modelo".into()));
        let _ = app.update(Message::TabSelected(Tab::Register));
        let _ = app.update(Message::UseCamera);
        let form = camera_form_with_photo(&app);
        app.track(
            finished(JobResult::PhotoTaken {
                form,
                outcome: Ok(String::new()),
            }),
            Tab::Register,
        );

        let _ = app.update(Message::UseFile);
        let _ = app.poll_jobs();
        assert_eq!(app.register.source(), PhotoSource::File);
        assert!(app.register.photo().is_none());
        assert!(app.register_thumbnail.is_none());
    }

    #[test]
    fn test_fields_typed_during_capture_survive_merge() {
        let mut app = app(ModelStatus::Failed("sin modelo".into()));
        let _ = app.update(Message::TabSelected(Tab::Register));
        let _ = app.update(Message::UseCamera);
        let _ = app.update(Message::NombreChanged("Ana".into()));
        let form = camera_form_with_photo(&app);
        app.track(
            finished(JobResult::PhotoTaken {
                form,
                outcome: Ok(String::new()),
            }),
            Tab::Register,
        );

        let _ = app.update(Message::NombreChanged("Anabel".into()));
        let _ = app.update(Message::CorreoChanged("anabel@uni.edu".into()));
        let _ = app.poll_jobs();
        assert_eq!(app.register.nombre, "Anabel");
        assert_eq!(app.register.correo, "anabel@uni.edu");
        assert_eq!(
            app.register.photo().map(|p| p.file_name.as_str()),
            Some("Ana_.jpg")
        );
        assert!(app.register_thumbnail.is_some());
    }

    #[test]
    fn test_camera_register_waits_for_model() {
        let mut app = app(ModelStatus::Loading(0, 0));
        let _ = app.update(Message::TabSelected(Tab::Register));
        let _ = app.update(Message::UseCamera);
        let _ = app.update(Message::NombreChanged("Ana".into()));
        let _ = app.update(Message::RegisterSubmit);
        assert!(app.jobs.is_empty());
    }
}
