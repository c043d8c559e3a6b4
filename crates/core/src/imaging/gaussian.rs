use crate::shared::constants::GAUSSIAN_SIGMA;
use crate::shared::frame::Frame;

/// Precompute a normalized 1D Gaussian kernel.
///
/// `kernel_size` must be odd and >= 1.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Kernel size implied by `sigma` alone: three sigmas each side for 8-bit
/// data, forced odd.
pub fn kernel_size_for_sigma(sigma: f64) -> usize {
    ((sigma * 3.0 * 2.0 + 1.0).round() as usize) | 1
}

/// Rounds a requested kernel size up to the nearest odd size. 0 asks for
/// the size implied by the blur sigma.
pub fn normalize_kernel_size(requested: u32) -> usize {
    if requested == 0 {
        return kernel_size_for_sigma(GAUSSIAN_SIGMA);
    }
    let size = requested as usize;
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Blurs `frame` in place with a `kernel_size` square Gaussian (sigma 5).
///
/// Size 1 leaves the frame untouched; 0 derives the size from sigma.
/// Kernels never grow past `2 * max(width, height) + 1`, beyond which the
/// mirrored border only repeats samples.
pub fn gaussian_blur(frame: &mut Frame, kernel_size: u32) {
    if frame.is_empty() {
        return;
    }
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let kernel_size = normalize_kernel_size(kernel_size).min(2 * width.max(height) + 1);
    if kernel_size <= 1 {
        return;
    }
    let kernel = gaussian_kernel_1d(kernel_size, GAUSSIAN_SIGMA);
    let channels = frame.channels() as usize;
    let mut temp = Vec::new();
    separable_gaussian_blur_with_kernel(
        frame.data_mut(),
        width,
        height,
        channels,
        &kernel,
        &mut temp,
    );
}

/// Apply a separable Gaussian blur using a pre-computed kernel, reusing `temp`.
///
/// Borders mirror without repeating the edge sample (`gfedcb|abcdefgh|gfedcba`).
pub fn separable_gaussian_blur_with_kernel(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    let kernel_size = kernel.len();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = kernel_size as isize / 2;

    let needed = width * height * channels;
    temp.resize(needed, 0.0);

    // Horizontal pass: data → temp
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - half, width);
                    sum += data[(y * width + sx) * channels + c] as f32 * w;
                }
                temp[(y * width + x) * channels + c] = sum;
            }
        }
    }

    // Vertical pass: temp → data
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - half, height);
                    sum += temp[(sy * width + x) * channels + c] * w;
                }
                data[(y * width + x) * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Maps an out-of-range coordinate back into `0..len` by mirroring.
pub(crate) fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    // Kernels wider than the image need more than one bounce.
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_kernel_sums_to_one() {
        let k = gaussian_kernel_1d(7, GAUSSIAN_SIGMA);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_kernel_is_symmetric() {
        let k = gaussian_kernel_1d(7, GAUSSIAN_SIGMA);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[rstest]
    #[case::zero_uses_sigma(0, 31)]
    #[case::one(1, 1)]
    #[case::even(4, 5)]
    #[case::odd(11, 11)]
    fn test_normalize_kernel_size(#[case] requested: u32, #[case] expected: usize) {
        assert_eq!(normalize_kernel_size(requested), expected);
    }

    #[rstest]
    #[case::inside(3, 10, 3)]
    #[case::before_start(-1, 10, 1)]
    #[case::past_end(10, 10, 8)]
    #[case::far_past_end(25, 4, 1)]
    #[case::single(-3, 1, 0)]
    fn test_reflect_101(#[case] i: isize, #[case] len: usize, #[case] expected: usize) {
        assert_eq!(reflect_101(i, len), expected);
    }

    #[test]
    fn test_blur_uniform_image_unchanged() {
        let mut frame = Frame::filled(10, 10, &[128, 128, 128]);
        gaussian_blur(&mut frame, 5);
        assert!(frame.data().iter().all(|&v| (v as i32 - 128).abs() <= 1));
    }

    #[test]
    fn test_blur_spreads_bright_pixel() {
        let mut frame = Frame::filled(10, 10, &[0, 0, 0]);
        let cx = (5 * 10 + 5) * 3;
        frame.data_mut()[cx..cx + 3].copy_from_slice(&[255, 255, 255]);
        let original = frame.clone();

        gaussian_blur(&mut frame, 5);

        assert!(frame.data()[cx] < 255);
        let neighbor = (5 * 10 + 6) * 3;
        assert!(frame.data()[neighbor] > 0);
        assert_ne!(frame, original);
    }

    #[test]
    fn test_kernel_size_1_is_identity() {
        let mut frame = Frame::filled(5, 5, &[42, 7, 200]);
        let original = frame.clone();
        gaussian_blur(&mut frame, 1);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_kernel_size_for_sigma_five() {
        assert_eq!(kernel_size_for_sigma(5.0), 31);
        assert_eq!(kernel_size_for_sigma(1.0), 7);
    }

    #[test]
    fn test_size_zero_blurs_with_sigma_derived_kernel() {
        let mut frame = Frame::filled(41, 41, &[0]);
        frame.data_mut()[20 * 41 + 20] = 255;
        let before = frame.clone();

        gaussian_blur(&mut frame, 0);

        assert_ne!(frame, before);
        assert!(frame.data()[20 * 41 + 20] < 255);
    }

    #[test]
    fn test_size_zero_reaches_fifteen_pixels() {
        // Bright from column 20 on; column 8 is 12 away, column 4 is 16.
        let mut frame = Frame::filled(41, 3, &[0]);
        for row in frame.data_mut().chunks_exact_mut(41) {
            row[20..].fill(255);
        }

        gaussian_blur(&mut frame, 0);

        assert!(frame.data()[8] > 0);
        assert_eq!(frame.data()[4], 0);
    }

    #[test]
    fn test_huge_kernel_is_capped_to_frame_size() {
        let mut capped = Frame::filled(4, 3, &[0, 0, 0]);
        capped.data_mut()[0..3].copy_from_slice(&[255, 255, 255]);
        let mut reference = capped.clone();

        gaussian_blur(&mut capped, 4_000_000_000);
        gaussian_blur(&mut reference, 9);

        assert_eq!(capped, reference);
    }

    #[test]
    fn test_blur_handles_single_channel() {
        let mut frame = Frame::filled(6, 6, &[90]);
        gaussian_blur(&mut frame, 3);
        assert_eq!(frame.channels(), 1);
        assert!(frame.data().iter().all(|&v| (v as i32 - 90).abs() <= 1));
    }
}
