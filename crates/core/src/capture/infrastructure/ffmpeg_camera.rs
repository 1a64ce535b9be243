use crate::capture::domain::frame_source::{CameraInfo, CameraRequest, FrameSource};
use crate::shared::frame::Frame;

/// Name of the libavdevice demuxer that talks to webcams on this platform.
#[cfg(target_os = "linux")]
pub const CAPTURE_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
pub const CAPTURE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
pub const CAPTURE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const CAPTURE_FORMAT: &str = "v4l2";

/// Webcam capture via ffmpeg-next's device layer (libavdevice).
///
/// Decoded frames are converted to RGB24 and wrapped in a [`Frame`].
/// Dropping the camera closes the device.
pub struct FfmpegCamera {
    state: Option<OpenCamera>,
}

struct OpenCamera {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    next_index: usize,
}

// Safety: FfmpegCamera is owned by one thread at a time (the preview worker).
// The raw pointers inside ffmpeg types are never shared.
unsafe impl Send for FfmpegCamera {}

impl FfmpegCamera {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// Consecutive `EAGAIN` reads tolerated before the device counts as gone.
const MAX_BUSY_READS: u32 = 200;
const BUSY_READ_BACKOFF: std::time::Duration = std::time::Duration::from_millis(5);

/// Outcome of one demuxer read.
#[derive(Debug, PartialEq)]
enum ReadStep {
    Packet,
    Ended,
    /// The device has no packet ready yet.
    Busy,
    Failed(ffmpeg_next::Error),
}

/// Every read error other than EOF and `EAGAIN` ends the stream with an error,
/// so an unplugged device surfaces instead of being retried forever.
fn read_step(result: Result<(), ffmpeg_next::Error>) -> ReadStep {
    match result {
        Ok(()) => ReadStep::Packet,
        Err(ffmpeg_next::Error::Eof) => ReadStep::Ended,
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
            ReadStep::Busy
        }
        Err(e) => ReadStep::Failed(e),
    }
}

fn find_capture_format() -> Result<ffmpeg_next::format::Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::input::video()
        .find(|f| f.name() == CAPTURE_FORMAT)
        .ok_or_else(|| format!("ffmpeg was built without the {CAPTURE_FORMAT} input device").into())
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}

impl OpenCamera {
    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegCamera {
    fn open(&mut self, request: &CameraRequest) -> Result<CameraInfo, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let format = find_capture_format()?;
        let mut options = ffmpeg_next::Dictionary::new();
        options.set("video_size", &format!("{}x{}", request.width, request.height));
        options.set("framerate", &request.fps.to_string());

        log::info!(
            "Opening camera {} ({CAPTURE_FORMAT}, {}x{} @ {} fps)",
            request.device,
            request.width,
            request.height,
            request.fps
        );
        let input = ffmpeg_next::format::open_with(
            &request.device,
            &ffmpeg_next::format::Format::Input(format),
            options,
        )?
        .input();

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("Camera provides no video stream")?;
        let stream_index = stream.index();
        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();
        let format_name = format!("{:?}", decoder.format());

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        if (width, height) != (request.width, request.height) {
            log::warn!(
                "Camera delivered {width}x{height} instead of {}x{}",
                request.width,
                request.height
            );
        }

        self.state = Some(OpenCamera {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            next_index: 0,
        });

        Ok(CameraInfo {
            width,
            height,
            fps,
            format: format_name,
        })
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(cam) = self.state.as_mut() else {
            return Err("FfmpegCamera: not opened".into());
        };

        let mut busy_reads = 0;
        loop {
            if let Some(frame) = cam.try_receive()? {
                return Ok(Some(frame));
            }

            let mut packet = ffmpeg_next::Packet::empty();
            match read_step(packet.read(&mut cam.input)) {
                ReadStep::Packet => busy_reads = 0,
                ReadStep::Ended => return Ok(None),
                ReadStep::Busy => {
                    busy_reads += 1;
                    if busy_reads > MAX_BUSY_READS {
                        return Err("camera stopped delivering frames".into());
                    }
                    std::thread::sleep(BUSY_READ_BACKOFF);
                    continue;
                }
                ReadStep::Failed(e) => return Err(format!("camera read failed: {e}").into()),
            }
            if packet.stream() != cam.stream_index {
                continue;
            }
            if let Err(e) = cam.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable camera packet: {e}");
            }
        }
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::info!("Camera closed");
        }
    }
}
