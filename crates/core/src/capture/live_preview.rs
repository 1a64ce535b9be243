use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::capture::domain::frame_source::{CameraInfo, CameraRequest, FrameSource};
use crate::detection::domain::face_detector::{detect_shared, DetectorOptions, SharedDetector};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Preview frames buffered for the UI before new ones are dropped.
const EVENT_CAPACITY: usize = 4;

/// How long the worker waits to deliver a lifecycle event.
const CONTROL_SEND_TIMEOUT: Duration = Duration::from_millis(200);

/// A preview frame and the faces found on it.
#[derive(Clone, Debug)]
pub struct DetectedFrame {
    pub frame: Frame,
    pub regions: Vec<Region>,
}

#[derive(Clone, Debug)]
pub enum PreviewEvent {
    Opened(CameraInfo),
    Frame(DetectedFrame),
    /// The camera could not be opened or failed mid-stream. The preview stays blank.
    CameraError(String),
    Ended,
}

/// Most recent raw camera frame, shared with whoever takes the photo.
pub type LatestFrame = Arc<Mutex<Option<Frame>>>;

/// Live camera loop on a worker thread.
///
/// The worker owns the [`FrameSource`], runs the detector on every frame
/// and publishes the results. It stops when [`LivePreview::stop`] is called
/// or the preview is dropped, and always closes the source on the way out.
pub struct LivePreview {
    stop: Arc<AtomicBool>,
    events: Receiver<PreviewEvent>,
    latest: LatestFrame,
    handle: Option<JoinHandle<()>>,
}

impl LivePreview {
    pub fn start(
        source: Box<dyn FrameSource>,
        request: CameraRequest,
        detector: SharedDetector,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let latest: LatestFrame = Arc::new(Mutex::new(None));
        let (tx, rx) = crossbeam_channel::bounded(EVENT_CAPACITY);

        let worker = PreviewWorker {
            source,
            detector,
            tx,
            stop: stop.clone(),
            latest: latest.clone(),
        };
        let handle = std::thread::spawn(move || worker.run(&request));

        Self {
            stop,
            events: rx,
            latest,
            handle: Some(handle),
        }
    }

    pub fn events(&self) -> &Receiver<PreviewEvent> {
        &self.events
    }

    /// A copy of the newest camera frame, if one has arrived.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn latest_handle(&self) -> LatestFrame {
        self.latest.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the worker and waits for it to release the camera.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Preview worker panicked");
            }
        }
    }
}

impl Drop for LivePreview {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PreviewWorker {
    source: Box<dyn FrameSource>,
    detector: SharedDetector,
    tx: Sender<PreviewEvent>,
    stop: Arc<AtomicBool>,
    latest: LatestFrame,
}

impl PreviewWorker {
    fn run(mut self, request: &CameraRequest) {
        match self.source.open(request) {
            Ok(info) => {
                log::info!(
                    "Camera opened: {}x{} @ {:.1} fps ({})",
                    info.width,
                    info.height,
                    info.fps,
                    info.format
                );
                self.send_control(PreviewEvent::Opened(info));
                self.stream();
            }
            Err(e) => {
                log::error!("Failed to open camera {}: {e}", request.device);
                self.send_control(PreviewEvent::CameraError(e.to_string()));
            }
        }
        self.source.close();
    }

    fn stream(&mut self) {
        while !self.stop.load(Ordering::Relaxed) {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("Camera stream ended");
                    self.send_control(PreviewEvent::Ended);
                    return;
                }
                Err(e) => {
                    log::error!("Camera read failed: {e}");
                    self.send_control(PreviewEvent::CameraError(e.to_string()));
                    return;
                }
            };

            let regions = match detect_shared(&self.detector, &frame, &DetectorOptions::LIVE) {
                Ok(regions) => regions,
                Err(e) => {
                    log::warn!("Detection failed on frame {}: {e}", frame.index());
                    Vec::new()
                }
            };

            if let Ok(mut guard) = self.latest.lock() {
                *guard = Some(frame.clone());
            }

            match self
                .tx
                .try_send(PreviewEvent::Frame(DetectedFrame { frame, regions }))
            {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    fn send_control(&self, event: PreviewEvent) {
        if self.tx.send_timeout(event, CONTROL_SEND_TIMEOUT).is_err() {
            log::debug!("Preview event dropped, receiver not listening");
        }
    }
}
