use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::{CaptureError, FrameSource, SourceStatus};
use crate::shared::frame::Frame;

/// Replays a still image as if it were a camera that always has a frame
/// ready.
///
/// The file is decoded once on `open`; every read hands out a fresh BGR
/// copy with an increasing index.
pub struct ImageFileSource {
    path: PathBuf,
    frame: Option<Frame>,
    status: SourceStatus,
    frame_index: usize,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
            status: SourceStatus::Closed,
            frame_index: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decodes an image file into a BGR frame.
pub fn load_bgr_frame(path: &Path) -> Result<Frame, CaptureError> {
    let rgb = image::open(path)
        .map_err(|source| CaptureError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut data = rgb.into_raw();
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    Ok(Frame::new(data, width, height, 3, 0))
}

impl FrameSource for ImageFileSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        if self.frame.is_some() {
            return Ok(());
        }
        match load_bgr_frame(&self.path) {
            Ok(frame) => {
                log::info!(
                    "Replaying {} ({}x{}) as frame source",
                    self.path.display(),
                    frame.width(),
                    frame.height()
                );
                self.frame = Some(frame);
                self.status = SourceStatus::Open;
                Ok(())
            }
            Err(e) => {
                self.status = SourceStatus::Failed;
                Err(e)
            }
        }
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let Some(still) = self.frame.as_ref() else {
            return Err(CaptureError::NotOpen);
        };
        let mut frame = still.clone();
        frame.set_index(self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.frame = None;
        if self.status == SourceStatus::Open {
            self.status = SourceStatus::Closed;
        }
    }

    fn status(&self) -> SourceStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join("still.png");
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb(rgb));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_loads_image_as_bgr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), [10, 20, 30]);

        let mut source = ImageFileSource::new(&path);
        source.open().unwrap();
        assert!(source.is_open());

        let frame = source.read_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (8, 6, 3));
        assert_eq!(&frame.data()[..3], &[30, 20, 10]);
    }

    #[test]
    fn test_reads_have_increasing_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), [0, 0, 0]);

        let mut source = ImageFileSource::new(&path);
        source.open().unwrap();
        let a = source.read_frame().unwrap().unwrap();
        let b = source.read_frame().unwrap().unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let mut source = ImageFileSource::new("/nonexistent/still.png");
        assert!(matches!(source.open(), Err(CaptureError::Image { .. })));
        assert_eq!(source.status(), SourceStatus::Failed);
    }

    #[test]
    fn test_read_before_open_is_error() {
        let mut source = ImageFileSource::new("/nonexistent/still.png");
        assert!(matches!(source.read_frame(), Err(CaptureError::NotOpen)));
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), [1, 2, 3]);
        let mut source = ImageFileSource::new(&path);
        source.open().unwrap();
        source.close();
        source.close();
        assert_eq!(source.status(), SourceStatus::Closed);
        assert!(matches!(source.read_frame(), Err(CaptureError::NotOpen)));
    }
}
