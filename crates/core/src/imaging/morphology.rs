use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MorphOp {
    Erode,
    Dilate,
}

/// Shrinks bright regions: each sample becomes the minimum of its 3x3
/// neighborhood, repeated `iterations` times or until a pass changes
/// nothing.
pub fn erode(frame: &mut Frame, iterations: u32) {
    morph(frame, iterations, MorphOp::Erode);
}

/// Grows bright regions: each sample becomes the maximum of its 3x3
/// neighborhood, repeated `iterations` times or until a pass changes
/// nothing.
pub fn dilate(frame: &mut Frame, iterations: u32) {
    morph(frame, iterations, MorphOp::Dilate);
}

fn morph(frame: &mut Frame, iterations: u32, op: MorphOp) {
    if iterations == 0 || frame.is_empty() {
        return;
    }
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let channels = frame.channels() as usize;
    let mut scratch = frame.data().to_vec();

    for pass in 0..iterations {
        morph_pass(frame.data(), &mut scratch, width, height, channels, op);
        if scratch.as_slice() == frame.data() {
            log::trace!("{op:?} settled after {pass} of {iterations} passes");
            break;
        }
        frame.data_mut().copy_from_slice(&scratch);
    }
}

/// One 3x3 pass from `src` into `dst`. Out-of-frame neighbors repeat the
/// nearest edge sample, so borders never pull in foreign values.
fn morph_pass(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    op: MorphOp,
) {
    for y in 0..height {
        let rows = [y.saturating_sub(1), y, (y + 1).min(height - 1)];
        for x in 0..width {
            let cols = [x.saturating_sub(1), x, (x + 1).min(width - 1)];
            for c in 0..channels {
                let mut acc = src[(y * width + x) * channels + c];
                for &ry in &rows {
                    for &cx in &cols {
                        let v = src[(ry * width + cx) * channels + c];
                        acc = match op {
                            MorphOp::Erode => acc.min(v),
                            MorphOp::Dilate => acc.max(v),
                        };
                    }
                }
                dst[(y * width + x) * channels + c] = acc;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot_frame(size: u32, background: u8, dot: u8) -> Frame {
        let mut frame = Frame::filled(size, size, &[background]);
        let center = (size / 2) as usize;
        let idx = center * size as usize + center;
        frame.data_mut()[idx] = dot;
        frame
    }

    fn count(frame: &Frame, value: u8) -> usize {
        frame.data().iter().filter(|&&v| v == value).count()
    }

    #[test]
    fn test_dilate_grows_dot_to_3x3() {
        let mut frame = dot_frame(9, 0, 255);
        dilate(&mut frame, 1);
        assert_eq!(count(&frame, 255), 9);
    }

    #[test]
    fn test_dilate_two_iterations_grows_to_5x5() {
        let mut frame = dot_frame(9, 0, 255);
        dilate(&mut frame, 2);
        assert_eq!(count(&frame, 255), 25);
    }

    #[test]
    fn test_erode_removes_single_dot() {
        let mut frame = dot_frame(9, 0, 255);
        erode(&mut frame, 1);
        assert_eq!(count(&frame, 255), 0);
    }

    #[test]
    fn test_erode_grows_dark_dot() {
        let mut frame = dot_frame(9, 200, 10);
        erode(&mut frame, 1);
        assert_eq!(count(&frame, 10), 9);
    }

    #[test]
    fn test_huge_iteration_count_stops_once_settled() {
        let mut grown = dot_frame(9, 0, 200);
        dilate(&mut grown, u32::MAX);
        assert_eq!(count(&grown, 200), 81);

        let mut shrunk = dot_frame(9, 120, 0);
        erode(&mut shrunk, u32::MAX);
        assert_eq!(count(&shrunk, 0), 81);
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let mut frame = dot_frame(5, 0, 255);
        let original = frame.clone();
        erode(&mut frame, 0);
        dilate(&mut frame, 0);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_uniform_frame_unchanged_at_borders() {
        let mut frame = Frame::filled(4, 3, &[30, 60, 90]);
        erode(&mut frame, 3);
        dilate(&mut frame, 3);
        assert_eq!(frame, Frame::filled(4, 3, &[30, 60, 90]));
    }

    #[test]
    fn test_channels_processed_independently() {
        let mut frame = Frame::filled(3, 3, &[0, 100, 0]);
        frame.data_mut()[4 * 3] = 255; // center pixel, blue channel
        dilate(&mut frame, 1);
        assert!(frame.data().chunks(3).all(|px| px == [255, 100, 0]));
    }
}
