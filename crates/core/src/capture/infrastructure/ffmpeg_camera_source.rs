use crate::capture::domain::frame_source::{CaptureError, FrameSource, SourceStatus};
use crate::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH};
use crate::shared::frame::Frame;

#[cfg(target_os = "macos")]
const CAPTURE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAPTURE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CAPTURE_FORMAT: &str = "v4l2";

#[cfg(target_os = "macos")]
pub const DEFAULT_DEVICE: &str = "0";
#[cfg(target_os = "windows")]
pub const DEFAULT_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Captures from a local camera through ffmpeg-next's device demuxers
/// (v4l2, avfoundation or dshow depending on the platform).
///
/// Requests 640x480 and converts every decoded picture to BGR24.
pub struct FfmpegCameraSource {
    device: String,
    width: u32,
    height: u32,
    capture: Option<CameraCapture>,
    status: SourceStatus,
    frame_index: usize,
}

// Safety: FfmpegCameraSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCameraSource {}

impl FfmpegCameraSource {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            capture: None,
            status: SourceStatus::Closed,
            frame_index: 0,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    fn open_capture(&self) -> Result<CameraCapture, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let input_format = ffmpeg_next::device::input::video()
            .find(|fmt| fmt.name().split(',').any(|name| name == CAPTURE_FORMAT))
            .ok_or_else(|| format!("ffmpeg has no '{CAPTURE_FORMAT}' input device support"))?;

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("video_size", &format!("{}x{}", self.width, self.height));
        options.set("framerate", "30");

        let ictx = ffmpeg_next::format::open_with(&self.device, &input_format, options)?.input();

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream on capture device")?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        // Devices may not honor the requested size; trust what the decoder reports.
        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::BGR24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(CameraCapture {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        })
    }
}

impl Default for FfmpegCameraSource {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE)
    }
}

impl FrameSource for FfmpegCameraSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        if self.capture.is_some() {
            return Ok(());
        }
        match self.open_capture() {
            Ok(capture) => {
                log::info!(
                    "Opened camera {} via {CAPTURE_FORMAT} at {}x{}",
                    self.device,
                    capture.width,
                    capture.height
                );
                self.capture = Some(capture);
                self.status = SourceStatus::Open;
                Ok(())
            }
            Err(e) => {
                self.status = SourceStatus::Failed;
                Err(CaptureError::DeviceUnavailable(format!("{}: {e}", self.device)))
            }
        }
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let Some(capture) = self.capture.as_mut() else {
            return Err(CaptureError::NotOpen);
        };
        let frame = capture.next_frame(self.frame_index)?;
        if frame.is_some() {
            self.frame_index += 1;
        }
        Ok(frame)
    }

    fn close(&mut self) {
        if self.capture.take().is_some() {
            log::info!("Closed camera {}", self.device);
        }
        if self.status == SourceStatus::Open {
            self.status = SourceStatus::Closed;
        }
    }

    fn status(&self) -> SourceStatus {
        self.status
    }
}

impl Drop for FfmpegCameraSource {
    fn drop(&mut self) {
        self.close();
    }
}

struct CameraCapture {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Pulls at most one packet from the device.
    fn next_frame(&mut self, index: usize) -> Result<Option<Frame>, CaptureError> {
        // The decoder may still hold a picture from the previous packet.
        if let Some(frame) = self.try_receive(index)? {
            return Ok(Some(frame));
        }

        let Some((stream, packet)) = self.ictx.packets().next() else {
            return Ok(None);
        };
        if stream.index() != self.stream_index {
            return Ok(None);
        }
        self.decoder
            .send_packet(&packet)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;

        self.try_receive(index)
    }

    fn try_receive(&mut self, index: usize) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut bgr_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut bgr_frame)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;

        let pixels = extract_packed_pixels(&bgr_frame, self.width, self.height);
        Ok(Some(Frame::new(pixels, self.width, self.height, 3, index)))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous 3-byte-per-pixel
/// buffer, dropping any row padding (stride > width*3).
fn extract_packed_pixels(
    frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_source_is_closed() {
        let source = FfmpegCameraSource::new("/dev/does-not-exist");
        assert_eq!(source.status(), SourceStatus::Closed);
        assert!(!source.is_open());
    }

    #[test]
    fn test_open_missing_device_fails_and_is_not_open() {
        let mut source = FfmpegCameraSource::new("/dev/framelab-missing-camera");
        let result = source.open();
        assert!(matches!(result, Err(CaptureError::DeviceUnavailable(_))));
        assert_eq!(source.status(), SourceStatus::Failed);
        assert!(!source.is_open());
    }

    #[test]
    fn test_read_without_open_returns_not_open() {
        let mut source = FfmpegCameraSource::new("/dev/framelab-missing-camera");
        assert!(matches!(source.read_frame(), Err(CaptureError::NotOpen)));
    }

    #[test]
    fn test_close_idempotent_after_failed_open() {
        let mut source = FfmpegCameraSource::new("/dev/framelab-missing-camera");
        let _ = source.open();
        source.close();
        source.close();
        assert_eq!(source.status(), SourceStatus::Failed);
    }

    #[test]
    fn test_default_resolution_is_vga() {
        let source = FfmpegCameraSource::default();
        assert_eq!((source.width, source.height), (640, 480));
        assert_eq!(source.device(), DEFAULT_DEVICE);
    }
}
