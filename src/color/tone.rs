use image::RgbImage;

use crate::filter::to_u8;

/// Parametric tone curve as a 256-entry lookup table.
///
/// The S-curve `x^a / (x^a + (1 - x)^a)` uses `a = 1 + contrast` for positive
/// contrast and `a = 1 / (1 - contrast)` for negative, then the result is
/// remapped to `[lift / 2, 1 - roll_off / 2]`. Returns `None` when all three
/// controls are zero.
pub fn build_tone_lut(lift: f64, roll_off: f64, contrast: f64) -> Option<[u8; 256]> {
    if lift == 0.0 && roll_off == 0.0 && contrast == 0.0 {
        return None;
    }
    let alpha = if contrast < 0.0 {
        1.0 / (1.0 - contrast)
    } else {
        1.0 + contrast
    };
    let low = (lift / 2.0).clamp(0.0, 0.5);
    let high = (1.0 - roll_off / 2.0).clamp(0.5, 1.0);

    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let curve = s_curve(i as f64 / 255.0, alpha);
        *entry = to_u8((low + curve * (high - low)) * 255.0);
    }
    Some(lut)
}

/// `x^a / (x^a + (1 - x)^a)`, evaluated as `1 / (1 + ((1 - x) / x)^a)` so that
/// large exponents saturate to 0 or 1 instead of dividing zero by zero.
fn s_curve(x: f64, alpha: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + ((1.0 - x) / x).powf(alpha))
}

/// Apply the same LUT to every channel.
pub fn apply_tone_curve(mut img: RgbImage, lut: &[u8; 256]) -> RgbImage {
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            pixel[c] = lut[pixel[c] as usize];
        }
    }
    img
}
