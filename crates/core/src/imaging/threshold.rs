use crate::shared::frame::Frame;

/// Binary threshold in place: samples strictly above `level` become 255,
/// the rest 0. Applied to every channel.
pub fn binary_threshold(frame: &mut Frame, level: u8) {
    for sample in frame.data_mut() {
        *sample = if *sample > level { 255 } else { 0 };
    }
}
