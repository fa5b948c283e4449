use image::{Rgb, RgbImage};

use crate::error::{GrainError, Result};
use crate::filter::to_u8;

/// Overlay blend of one normalized channel: grain `g` over base `b`.
///
/// `overlay(0, g) == 0`, `overlay(1, g) == 1`, continuous at `b = 0.5` and
/// non-decreasing in `g`.
pub fn overlay(b: f64, g: f64) -> f64 {
    if b <= 0.5 {
        2.0 * b * g
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - g)
    }
}

/// Composite a grain plate over a background of the same size.
pub fn composite_overlay(background: &RgbImage, plate: &RgbImage) -> Result<RgbImage> {
    if background.dimensions() != plate.dimensions() {
        let (bw, bh) = background.dimensions();
        let (pw, ph) = plate.dimensions();
        return Err(GrainError::parameter(
            "background",
            format!("{bw}x{bh} does not match the {pw}x{ph} grain plate"),
        ));
    }

    let mut out = RgbImage::new(plate.width(), plate.height());
    for (o, (b, g)) in out.pixels_mut().zip(background.pixels().zip(plate.pixels())) {
        let mut px = [0u8; 3];
        for c in 0..3 {
            let v = overlay(b[c] as f64 / 255.0, g[c] as f64 / 255.0);
            px[c] = to_u8(v * 255.0);
        }
        *o = Rgb(px);
    }
    Ok(out)
}

/// Compositor stage: without a background the plate passes through untouched.
pub fn composite(background: Option<&RgbImage>, plate: RgbImage) -> Result<RgbImage> {
    match background {
        Some(bg) => composite_overlay(bg, &plate),
        None => Ok(plate),
    }
}
