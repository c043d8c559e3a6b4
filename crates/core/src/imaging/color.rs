use crate::shared::frame::Frame;

// BT.601 luma weights in 14-bit fixed point; they sum to 1 << 14.
const GRAY_B: u32 = 1868;
const GRAY_G: u32 = 9617;
const GRAY_R: u32 = 4899;
const GRAY_SHIFT: u32 = 14;

/// Luma of one BGR pixel.
pub fn luma(b: u8, g: u8, r: u8) -> u8 {
    let y = b as u32 * GRAY_B + g as u32 * GRAY_G + r as u32 * GRAY_R + (1 << (GRAY_SHIFT - 1));
    (y >> GRAY_SHIFT) as u8
}

/// Intensity plane of `frame` without touching it.
///
/// Single-channel frames are copied as-is. Two-channel frames are read as
/// gray plus alpha and keep their first sample; wider frames take the luma
/// of their leading BGR samples.
pub fn gray_plane(frame: &Frame) -> Vec<u8> {
    match frame.channels() {
        0 | 1 => frame.data().to_vec(),
        2 => frame.data().iter().step_by(2).copied().collect(),
        channels => frame
            .data()
            .chunks_exact(channels as usize)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect(),
    }
}

/// Converts a BGR frame to a single intensity channel in place.
pub fn bgr_to_gray(frame: &mut Frame) {
    if frame.channels() == 1 {
        return;
    }
    let gray = gray_plane(frame);
    frame.replace_data(gray, 1);
}

/// Rewrites a BGR frame as HSV (H halved into 0..180, S and V in 0..255).
///
/// Single-channel frames have no hue and are left alone.
pub fn bgr_to_hsv(frame: &mut Frame) {
    if frame.channels() != 3 {
        log::debug!("HSV conversion skipped for {}-channel frame", frame.channels());
        return;
    }
    for px in frame.data_mut().chunks_exact_mut(3) {
        let (h, s, v) = hsv_of(px[0], px[1], px[2]);
        px[0] = h;
        px[1] = s;
        px[2] = v;
    }
}

/// Swaps the blue and red samples of every pixel.
pub fn swap_red_blue(frame: &mut Frame) {
    if frame.channels() != 3 {
        log::debug!("Channel swap skipped for {}-channel frame", frame.channels());
        return;
    }
    for px in frame.data_mut().chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

fn hsv_of(b: u8, g: u8, r: u8) -> (u8, u8, u8) {
    let (bf, gf, rf) = (b as f32, g as f32, r as f32);
    let v = bf.max(gf).max(rf);
    let min = bf.min(gf).min(rf);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h8 = ((h / 2.0).round() as u32 % 180) as u8;
    (h8, s.round() as u8, v as u8)
}
