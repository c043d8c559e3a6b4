use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use framelab_core::events::pipeline_events::{FrameReady, HistogramUpdated};
use framelab_core::shared::frame::Frame;
use framelab_core::shared::histogram::Histogram;

/// Writes a BGR or single-channel frame to an image file.
pub fn save_frame(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match frame.channels() {
        1 => {
            let img = image::GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                .ok_or("Failed to create image from frame data")?;
            img.save(path)?;
        }
        3 => {
            let mut rgb = frame.data().to_vec();
            for px in rgb.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            let img = image::RgbImage::from_raw(frame.width(), frame.height(), rgb)
                .ok_or("Failed to create image from frame data")?;
            img.save(path)?;
        }
        n => return Err(format!("Cannot save a frame with {n} channels").into()),
    }
    Ok(())
}

/// Renders a histogram as a bar plot, one column band per bucket, scaled
/// to the tallest bucket.
pub fn render_histogram(histogram: &Histogram, width: u32, height: u32) -> image::RgbImage {
    let background = image::Rgb([32, 32, 32]);
    let bar = image::Rgb([200, 200, 200]);
    let mut img = image::RgbImage::from_pixel(width, height, background);

    let counts = histogram.counts();
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 || counts.is_empty() {
        return img;
    }

    for x in 0..width {
        let bin = (x as usize * counts.len()) / width as usize;
        let bar_height = (counts[bin] as u64 * height as u64 / max as u64) as u32;
        for y in (height - bar_height)..height {
            img.put_pixel(x, y, bar);
        }
    }
    img
}

/// `FrameReady` subscriber that saves every `every`-th final frame as
/// `frame_<tick>.png` under `dir`.
pub fn snapshot_writer(dir: PathBuf, every: u64) -> impl FnMut(&FrameReady) + Send + 'static {
    let every = every.max(1);
    move |event: &FrameReady| {
        if event.tick % every != 0 {
            return;
        }
        let path = dir.join(format!("frame_{:06}.png", event.tick));
        match save_frame(&path, &event.frame) {
            Ok(()) => log::debug!("Saved {:?} frame to {}", event.branch, path.display()),
            Err(e) => log::warn!("Failed to save snapshot {}: {e}", path.display()),
        }
    }
}

/// Most recent histogram seen on the bus, shared with the subscriber.
pub type LatestHistogram = Arc<Mutex<Option<Histogram>>>;

/// `HistogramUpdated` subscriber that logs mean and peak every `every`
/// ticks and keeps the latest histogram in `latest`.
pub fn histogram_reporter(
    every: u64,
    latest: LatestHistogram,
) -> impl FnMut(&HistogramUpdated) + Send + 'static {
    let every = every.max(1);
    move |event: &HistogramUpdated| {
        if event.tick % every == 0 {
            let peak = event
                .histogram
                .peak()
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            log::info!(
                "Tick {}: mean intensity {:.1}, peak {peak}",
                event.tick,
                event.histogram.mean()
            );
        }
        if let Ok(mut slot) = latest.lock() {
            *slot = Some(event.histogram.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framelab_core::events::pipeline_events::Branch;

    #[test]
    fn test_save_colour_frame_swaps_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("colour.png");
        let frame = Frame::filled(5, 4, &[10, 20, 30]);

        save_frame(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (5, 4));
        assert_eq!(img.get_pixel(0, 0).0, [30, 20, 10]);
    }

    #[test]
    fn test_save_gray_frame_as_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let frame = Frame::filled(3, 3, &[77]);

        save_frame(&path, &frame).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.color(), image::ColorType::L8);
        assert_eq!(img.to_luma8().get_pixel(2, 2).0, [77]);
    }

    #[test]
    fn test_save_rejects_unsupported_channel_count() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::filled(2, 2, &[1, 2]);
        assert!(save_frame(&dir.path().join("x.png"), &frame).is_err());
    }

    #[test]
    fn test_render_histogram_draws_tallest_bar_full_height() {
        let histogram = Histogram::from_samples(&[0, 0, 255]);
        let img = render_histogram(&histogram, 256, 100);

        assert_eq!(img.get_pixel(0, 0).0, [200, 200, 200]);
        assert_eq!(img.get_pixel(255, 99).0, [200, 200, 200]);
        assert_eq!(img.get_pixel(255, 0).0, [32, 32, 32]);
        assert_eq!(img.get_pixel(128, 99).0, [32, 32, 32]);
    }

    #[test]
    fn test_render_empty_histogram_is_blank() {
        let img = render_histogram(&Histogram::new(), 10, 10);
        assert!(img.pixels().all(|p| p.0 == [32, 32, 32]));
    }

    #[test]
    fn test_snapshot_writer_honours_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = snapshot_writer(dir.path().to_path_buf(), 2);

        for tick in 1..=4 {
            writer(&FrameReady {
                tick,
                branch: Branch::Unfiltered,
                frame: Frame::filled(2, 2, &[1, 2, 3]),
            });
        }

        assert!(!dir.path().join("frame_000001.png").exists());
        assert!(dir.path().join("frame_000002.png").exists());
        assert!(dir.path().join("frame_000004.png").exists());
    }

    #[test]
    fn test_histogram_reporter_keeps_latest() {
        let latest = LatestHistogram::default();
        let mut reporter = histogram_reporter(10, Arc::clone(&latest));

        reporter(&HistogramUpdated {
            tick: 1,
            histogram: Histogram::from_samples(&[5]),
        });
        reporter(&HistogramUpdated {
            tick: 2,
            histogram: Histogram::from_samples(&[9, 9]),
        });

        let kept = latest.lock().unwrap().clone().unwrap();
        assert_eq!(kept[9], 2);
        assert_eq!(kept.total(), 2);
    }
}
