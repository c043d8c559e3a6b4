/// Capture resolution requested from camera devices.
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

/// Pipeline cadence (~30 fps).
pub const TICK_INTERVAL_MS: u64 = 33;

pub const HISTOGRAM_BINS: usize = 256;

/// Sigma used by the blur filter regardless of kernel size.
pub const GAUSSIAN_SIGMA: f64 = 5.0;

/// Canny hysteresis thresholds.
pub const CANNY_LOW_THRESHOLD: i32 = 75;
pub const CANNY_HIGH_THRESHOLD: i32 = 175;

/// Buffers kept around by the frame pool between ticks.
pub const FRAME_POOL_CAPACITY: usize = 4;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
