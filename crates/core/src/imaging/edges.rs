use ndarray::Array2;

use super::color::gray_plane;
use super::gaussian::reflect_101;
use crate::shared::frame::Frame;

// tan(22.5°) in 15-bit fixed point, used to bucket gradient directions.
const TAN_22_5_Q15: i64 = 13573;

const NOT_EDGE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Canny edge detection in place.
///
/// Multi-channel frames are reduced to intensity first. The result is a
/// single-channel map with edges at 255 and everything else at 0.
pub fn canny(frame: &mut Frame, low_threshold: i32, high_threshold: i32) {
    if frame.is_empty() {
        return;
    }
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let gray = gray_plane(frame);
    let edges = canny_plane(&gray, width, height, low_threshold, high_threshold);
    frame.replace_data(edges, 1);
}

fn canny_plane(gray: &[u8], width: usize, height: usize, low: i32, high: i32) -> Vec<u8> {
    let (dx, dy) = sobel(gray, width, height);
    let magnitude = Array2::from_shape_fn((height, width), |(y, x)| {
        dx[[y, x]].abs() + dy[[y, x]].abs()
    });

    let mut marks = Array2::<u8>::from_elem((height, width), NOT_EDGE);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let m = magnitude[[y, x]];
            if m <= low || !is_local_maximum(&magnitude, &dx, &dy, y, x) {
                continue;
            }
            if m > high {
                marks[[y, x]] = STRONG;
                stack.push((y, x));
            } else {
                marks[[y, x]] = WEAK;
            }
        }
    }

    // Hysteresis: weak pixels survive only when 8-connected to a strong one.
    while let Some((y, x)) = stack.pop() {
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                if marks[[ny, nx]] == WEAK {
                    marks[[ny, nx]] = STRONG;
                    stack.push((ny, nx));
                }
            }
        }
    }

    marks
        .iter()
        .map(|&mark| if mark == STRONG { 255 } else { 0 })
        .collect()
}

/// 3x3 Sobel derivatives with mirrored borders.
fn sobel(gray: &[u8], width: usize, height: usize) -> (Array2<i32>, Array2<i32>) {
    let at = |y: isize, x: isize| -> i32 {
        let sy = reflect_101(y, height);
        let sx = reflect_101(x, width);
        gray[sy * width + sx] as i32
    };

    let dx = Array2::from_shape_fn((height, width), |(y, x)| {
        let (y, x) = (y as isize, x as isize);
        (at(y - 1, x + 1) + 2 * at(y, x + 1) + at(y + 1, x + 1))
            - (at(y - 1, x - 1) + 2 * at(y, x - 1) + at(y + 1, x - 1))
    });
    let dy = Array2::from_shape_fn((height, width), |(y, x)| {
        let (y, x) = (y as isize, x as isize);
        (at(y + 1, x - 1) + 2 * at(y + 1, x) + at(y + 1, x + 1))
            - (at(y - 1, x - 1) + 2 * at(y - 1, x) + at(y - 1, x + 1))
    });
    (dx, dy)
}

/// Non-maximum suppression along the quantized gradient direction.
///
/// Ties resolve toward the earlier neighbor so a two-pixel-wide ridge keeps
/// exactly one pixel.
fn is_local_maximum(
    magnitude: &Array2<i32>,
    dx: &Array2<i32>,
    dy: &Array2<i32>,
    y: usize,
    x: usize,
) -> bool {
    let (height, width) = magnitude.dim();
    let mag_at = |yy: isize, xx: isize| -> i32 {
        if yy < 0 || xx < 0 || yy >= height as isize || xx >= width as isize {
            0
        } else {
            magnitude[[yy as usize, xx as usize]]
        }
    };

    let m = magnitude[[y, x]];
    let gx = dx[[y, x]] as i64;
    let gy = dy[[y, x]] as i64;
    let (yi, xi) = (y as isize, x as isize);

    let tg22x = gx.abs() * TAN_22_5_Q15;
    let y_shift = gy.abs() << 15;

    if y_shift < tg22x {
        // Mostly horizontal gradient: compare left/right.
        m > mag_at(yi, xi - 1) && m >= mag_at(yi, xi + 1)
    } else {
        let tg67x = tg22x + (gx.abs() << 16);
        if y_shift > tg67x {
            m > mag_at(yi - 1, xi) && m >= mag_at(yi + 1, xi)
        } else {
            let s: isize = if (gx ^ gy) < 0 { -1 } else { 1 };
            m > mag_at(yi - 1, xi - s) && m >= mag_at(yi + 1, xi + s)
        }
    }
}
