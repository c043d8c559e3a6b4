use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("frame source is not open")]
    NotOpen,
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    Closed,
    Open,
    /// The last open attempt failed. Sources are not retried.
    Failed,
}

/// Produces raw frames on demand from a camera or camera-like device.
///
/// Implementations hide device details (drivers, pixel formats) and hand
/// the pipeline BGR [`Frame`]s.
pub trait FrameSource: Send {
    /// Acquires the device. On failure the source stays unopened and
    /// reports [`SourceStatus::Failed`].
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Makes one attempt to fetch the next frame. `Ok(None)` means nothing
    /// was ready this time.
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Releases device resources. Safe to call repeatedly and after a
    /// failed open.
    fn close(&mut self);

    fn status(&self) -> SourceStatus;

    fn is_open(&self) -> bool {
        self.status() == SourceStatus::Open
    }
}
