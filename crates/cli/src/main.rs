mod display;
mod samples;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use crossbeam_channel::Sender;

use framelab_core::capture::domain::frame_source::FrameSource;
use framelab_core::capture::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
use framelab_core::capture::infrastructure::image_file_source::ImageFileSource;
use framelab_core::filtering::filter_operation::FilterOperation;
use framelab_core::pipeline::pipeline_control::ControlCommand;
use framelab_core::pipeline::pipeline_driver::PipelineDriver;
use framelab_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use framelab_core::pipeline::pipeline_settings::{PipelineSettings, SettingsError};
use framelab_core::pipeline::tick_scheduler::TickScheduler;
use framelab_core::shared::constants::IMAGE_EXTENSIONS;

use crate::display::LatestHistogram;

/// Live camera filtering with histogram output.
#[derive(Parser)]
#[command(name = "framelab", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live pipeline against a camera or a still image.
    Run(RunArgs),
    /// Write one filtered image, histogram plot and histogram JSON per
    /// showcase filter for a still image.
    Samples {
        /// Input image file.
        input: PathBuf,

        /// Directory that receives one sub-directory per sample.
        #[arg(long, default_value = "SampleOutputs")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Capture device (e.g. /dev/video0). Defaults to the saved device or
    /// the platform camera.
    #[arg(long, conflicts_with = "image")]
    device: Option<String>,

    /// Replay a still image instead of capturing from a camera.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Filters to enable, comma-separated
    /// (invert1, invert2, blur, erode, dilate, canny, threshold).
    #[arg(long, value_delimiter = ',')]
    filters: Option<Vec<FilterOperation>>,

    /// Gaussian blur kernel size (even sizes round up to odd).
    #[arg(long)]
    blur_size: Option<u32>,

    /// Erode iterations.
    #[arg(long)]
    erode: Option<u32>,

    /// Dilate iterations.
    #[arg(long)]
    dilate: Option<u32>,

    /// Binary threshold level (0-255).
    #[arg(long)]
    threshold: Option<u8>,

    /// Start with the camera disabled (replays the cached frame).
    #[arg(long)]
    no_camera: bool,

    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,

    /// Milliseconds between ticks.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Save final frames as PNG into this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Save every Nth final frame.
    #[arg(long, default_value = "30")]
    snapshot_every: u64,

    /// Log histogram statistics every N ticks.
    #[arg(long, default_value = "30")]
    report_every: u64,

    /// Write the last histogram as JSON to this file on exit.
    #[arg(long)]
    histogram_json: Option<PathBuf>,

    /// Persist the final configuration as the new defaults.
    #[arg(long)]
    save_settings: bool,

    /// Do not read control commands from stdin.
    #[arg(long)]
    no_stdin: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_pipeline(args),
        Command::Samples { input, output } => {
            validate_image(&input)?;
            let written = samples::generate_samples(&input, &output)?;
            log::info!("Wrote {} samples to {}", written.len(), output.display());
            Ok(())
        }
    }
}

fn run_pipeline(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate(&args)?;

    let settings = resolve_settings(PipelineSettings::load(), &args)?;

    let source: Box<dyn FrameSource> = match (&args.image, &settings.device) {
        (Some(path), _) => Box::new(ImageFileSource::new(path)),
        (None, Some(device)) => Box::new(FfmpegCameraSource::new(device.as_str())),
        (None, None) => Box::new(FfmpegCameraSource::default()),
    };

    let mut driver = PipelineDriver::new(source)
        .with_logger(Box::new(StdoutPipelineLogger::new(args.report_every)));
    settings.apply(&mut driver);

    let latest = LatestHistogram::default();
    driver
        .events_mut()
        .histogram_updated
        .subscribe(display::histogram_reporter(args.report_every, Arc::clone(&latest)));
    if let Some(dir) = &args.snapshot_dir {
        driver
            .events_mut()
            .frame_ready
            .subscribe(display::snapshot_writer(dir.clone(), args.snapshot_every));
    }

    driver.start()?;

    let (tx, rx) = crossbeam_channel::unbounded();
    if !args.no_stdin {
        spawn_command_reader(tx);
    }

    let mut scheduler =
        TickScheduler::new(Duration::from_millis(settings.tick_interval_ms)).with_commands(rx);
    if let Some(ticks) = args.ticks {
        scheduler = scheduler.with_max_ticks(ticks);
    }

    let report = scheduler.run(&mut driver);
    log::info!(
        "Ran {} ticks: {} published, {} empty reads, {} without a frame, {} overruns",
        report.ticks,
        report.published,
        report.empty_reads,
        report.no_cached_frame,
        report.overruns
    );

    if args.save_settings {
        let current =
            PipelineSettings::capture(&driver, settings.device.clone(), settings.tick_interval_ms);
        let path = current.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    driver.stop();

    if let Some(path) = &args.histogram_json {
        let histogram = latest
            .lock()
            .map_err(|_| "Histogram lock poisoned")?
            .clone()
            .ok_or("No histogram was produced")?;
        std::fs::write(path, serde_json::to_string_pretty(&histogram)?)?;
        log::info!("Histogram written to {}", path.display());
    }

    Ok(())
}

fn validate(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(image) = &args.image {
        validate_image(image)?;
    }
    if args.interval_ms == Some(0) {
        return Err("Tick interval must be at least 1 ms".into());
    }
    if args.snapshot_every == 0 {
        return Err("--snapshot-every must be at least 1".into());
    }
    if args.report_every == 0 {
        return Err("--report-every must be at least 1".into());
    }
    Ok(())
}

fn validate_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!(
            "Unsupported image type: {} (expected one of: {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Overlays the flags on the saved settings and checks the result.
fn resolve_settings(
    mut settings: PipelineSettings,
    args: &RunArgs,
) -> Result<PipelineSettings, SettingsError> {
    merge_args(&mut settings, args);
    settings.validate()?;
    Ok(settings)
}

/// Command-line flags override the saved settings.
fn merge_args(settings: &mut PipelineSettings, args: &RunArgs) {
    if let Some(device) = &args.device {
        settings.device = Some(device.clone());
    }
    if let Some(filters) = &args.filters {
        settings.filters = filters.clone();
    }
    if let Some(size) = args.blur_size {
        settings.parameters.blur_size = size;
    }
    if let Some(n) = args.erode {
        settings.parameters.erode_iterations = n;
    }
    if let Some(n) = args.dilate {
        settings.parameters.dilate_iterations = n;
    }
    if let Some(level) = args.threshold {
        settings.parameters.threshold_level = level;
    }
    if args.no_camera {
        settings.camera_enabled = false;
    }
    if let Some(ms) = args.interval_ms {
        settings.tick_interval_ms = ms;
    }
}

/// Forwards stdin lines to the scheduler as control commands.
fn spawn_command_reader(tx: Sender<ControlCommand>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ControlCommand>() {
                Ok(command) => {
                    let stop = command == ControlCommand::Stop;
                    if tx.send(command).is_err() || stop {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(flags: &[&str]) -> RunArgs {
        let argv = ["framelab", "run"].iter().chain(flags);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            Command::Samples { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_flags_override_saved_settings() {
        let args = run_args(&["--blur-size", "7", "--no-camera", "--interval-ms", "20"]);
        let settings = resolve_settings(PipelineSettings::default(), &args).unwrap();

        assert_eq!(settings.parameters.blur_size, 7);
        assert!(!settings.camera_enabled);
        assert_eq!(settings.tick_interval_ms, 20);
    }

    #[test]
    fn test_saved_zero_interval_is_rejected_after_merge() {
        let saved = PipelineSettings {
            tick_interval_ms: 0,
            ..PipelineSettings::default()
        };

        let err = resolve_settings(saved.clone(), &run_args(&[])).unwrap_err();
        assert!(matches!(err, SettingsError::ZeroTickInterval));

        let fixed = resolve_settings(saved, &run_args(&["--interval-ms", "10"])).unwrap();
        assert_eq!(fixed.tick_interval_ms, 10);
    }

    #[test]
    fn test_zero_interval_flag_is_rejected() {
        assert!(validate(&run_args(&["--interval-ms", "0"])).is_err());
    }
}
