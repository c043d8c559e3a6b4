use std::fs;
use std::path::{Path, PathBuf};

use framelab_core::capture::infrastructure::image_file_source::load_bgr_frame;
use framelab_core::filtering::filter_operation::FilterOperation;
use framelab_core::filtering::filter_settings::FilterSettings;
use framelab_core::histogram::histogram_engine::compute_histogram;
use framelab_core::shared::frame::Frame;
use framelab_core::shared::histogram::Histogram;

use crate::display::{render_histogram, save_frame};

const PLOT_WIDTH: u32 = 600;
const PLOT_HEIGHT: u32 = 200;
const SAMPLE_BLUR_SIZE: u32 = 11;

/// When a sample's image is written relative to the gray conversion.
enum Step {
    /// Apply a colour filter, save the colour result, then histogram it.
    ColourFilter(FilterOperation),
    /// Histogram (leaving the frame gray) and save the gray frame.
    Grayscale,
    /// Histogram, then run a filter on the gray frame and save that.
    GrayFilter(FilterOperation),
}

const SAMPLES: &[(&str, Step)] = &[
    ("Inverted1", Step::ColourFilter(FilterOperation::InvertHsv)),
    ("Inverted2", Step::ColourFilter(FilterOperation::InvertRgb)),
    ("Blurred", Step::ColourFilter(FilterOperation::GaussianBlur)),
    ("Grayscale", Step::Grayscale),
    ("Canny", Step::GrayFilter(FilterOperation::CannyEdge)),
];

/// Files written for one sample.
#[derive(Debug)]
pub struct SampleOutput {
    pub name: &'static str,
    pub image: PathBuf,
    pub plot: PathBuf,
    pub histogram: PathBuf,
}

/// Runs each showcase filter over `input` and writes, per filter, the
/// filtered image, a histogram plot and the raw histogram counts as JSON
/// into `output_dir/<Name>/`.
pub fn generate_samples(
    input: &Path,
    output_dir: &Path,
) -> Result<Vec<SampleOutput>, Box<dyn std::error::Error>> {
    let source = load_bgr_frame(input)?;
    let settings = FilterSettings {
        blur_size: SAMPLE_BLUR_SIZE,
        ..FilterSettings::default()
    };

    let mut outputs = Vec::with_capacity(SAMPLES.len());
    for &(name, ref step) in SAMPLES {
        let mut frame = source.clone();
        let histogram = run_step(step, &mut frame, &settings);

        let dir = output_dir.join(name);
        fs::create_dir_all(&dir)?;
        let output = SampleOutput {
            name,
            image: dir.join(format!("{name}.png")),
            plot: dir.join(format!("{name}Plot.png")),
            histogram: dir.join(format!("{name}Histogram.json")),
        };

        save_frame(&output.image, &frame)?;
        render_histogram(&histogram, PLOT_WIDTH, PLOT_HEIGHT).save(&output.plot)?;
        fs::write(&output.histogram, serde_json::to_string_pretty(&histogram)?)?;

        log::info!("Wrote {name} sample to {}", dir.display());
        outputs.push(output);
    }
    Ok(outputs)
}

fn run_step(step: &Step, frame: &mut Frame, settings: &FilterSettings) -> Histogram {
    match *step {
        Step::ColourFilter(op) => {
            op.apply(frame, settings);
            let mut gray = frame.clone();
            compute_histogram(&mut gray)
        }
        Step::Grayscale => compute_histogram(frame),
        Step::GrayFilter(op) => {
            let histogram = compute_histogram(frame);
            op.apply(frame, settings);
            histogram
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("input.png");
        let img = image::RgbImage::from_fn(32, 24, |x, y| {
            if x < 16 {
                image::Rgb([200, 40, 40])
            } else {
                image::Rgb([20, 20, (y * 5) as u8])
            }
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_generates_every_sample() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let out = dir.path().join("samples");

        let outputs = generate_samples(&input, &out).unwrap();

        let names: Vec<_> = outputs.iter().map(|o| o.name).collect();
        assert_eq!(names, ["Inverted1", "Inverted2", "Blurred", "Grayscale", "Canny"]);
        for output in &outputs {
            assert!(output.image.exists(), "{}", output.image.display());
            assert!(output.plot.exists());
            assert!(output.histogram.exists());
        }
        assert!(out.join("Canny").join("CannyPlot.png").exists());
    }

    #[test]
    fn test_colour_samples_stay_colour_and_gray_samples_are_gray() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let outputs = generate_samples(&input, &dir.path().join("samples")).unwrap();

        let colour = image::open(&outputs[1].image).unwrap();
        assert_eq!(colour.color(), image::ColorType::Rgb8);
        let gray = image::open(&outputs[3].image).unwrap();
        assert_eq!(gray.color(), image::ColorType::L8);
    }

    #[test]
    fn test_histogram_json_counts_every_pixel() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let outputs = generate_samples(&input, &dir.path().join("samples")).unwrap();

        for output in &outputs {
            let json = fs::read_to_string(&output.histogram).unwrap();
            let histogram: Histogram = serde_json::from_str(&json).unwrap();
            assert_eq!(histogram.len(), 256);
            assert_eq!(histogram.total(), 32 * 24);
        }
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(generate_samples(&dir.path().join("absent.png"), dir.path()).is_err());
    }
}
