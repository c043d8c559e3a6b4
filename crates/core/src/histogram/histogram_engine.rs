use crate::imaging::color::bgr_to_gray;
use crate::shared::frame::Frame;
use crate::shared::histogram::Histogram;

/// Converts `frame` to a single intensity channel in place and returns the
/// distribution of its pixel values.
///
/// The conversion is destructive: clone the frame first if the colour data
/// is still needed. `histogram.total()` always equals the pixel count.
pub fn compute_histogram(frame: &mut Frame) -> Histogram {
    bgr_to_gray(frame);
    Histogram::from_samples(frame.data())
}
