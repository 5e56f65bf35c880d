use crate::shared::frame::{Frame, CHANNELS};

/// 3×3 sharpening kernel: centre 9, neighbours -1 (sums to 1).
const SHARPEN_CENTER: i32 = 9;
const SHARPEN_NEIGHBOR: i32 = -1;

/// Contrast/brightness boost followed by sharpening, for low-light webcams.
///
/// `alpha` scales and `beta` offsets every channel (`|alpha * p + beta|`,
/// saturated to `u8`). The sharpened result keeps the input dimensions.
pub fn enhance(frame: &Frame, alpha: f64, beta: f64) -> Frame {
    let boosted = scale_abs(frame, alpha, beta);
    sharpen(&boosted)
}

fn scale_abs(frame: &Frame, alpha: f64, beta: f64) -> Frame {
    let data = frame
        .data()
        .iter()
        .map(|&p| saturate((alpha * p as f64 + beta).abs()))
        .collect();
    Frame::new(data, frame.width(), frame.height())
}

fn sharpen(frame: &Frame) -> Frame {
    let w = frame.width() as usize;
    let h = frame.height() as usize;
    if w == 0 || h == 0 {
        return frame.clone();
    }

    let src = frame.data();
    let mut out = vec![0u8; src.len()];

    for y in 0..h {
        for x in 0..w {
            for c in 0..CHANNELS {
                let mut acc = 0i32;
                for dy in -1isize..=1 {
                    let sy = reflect_101(y as isize + dy, h);
                    for dx in -1isize..=1 {
                        let sx = reflect_101(x as isize + dx, w);
                        let weight = if dx == 0 && dy == 0 {
                            SHARPEN_CENTER
                        } else {
                            SHARPEN_NEIGHBOR
                        };
                        acc += weight * src[(sy * w + sx) * CHANNELS + c] as i32;
                    }
                }
                out[(y * w + x) * CHANNELS + c] = acc.clamp(0, 255) as u8;
            }
        }
    }

    Frame::new(out, frame.width(), frame.height())
}

/// Mirror index across the border without repeating the edge pixel
/// (`-1 → 1`, `n → n - 2`).
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * n - 2 - i;
    }
    i.clamp(0, n - 1) as usize
}

fn saturate(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
