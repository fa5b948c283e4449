use rand::Rng;

use crate::color::spectral;

/// Lower bound of each raw firefly channel before coloration, in [0, 1].
const FIREFLY_FLOOR: f64 = 0.6;

/// Number of firefly draws for a frame: `round(width * height * density)`.
pub fn firefly_count(width: usize, height: usize, density: f64) -> usize {
    ((width * height) as f64 * density).round() as usize
}

/// Overwrite randomly chosen pixels with bright, optionally tinted values.
///
/// Positions are drawn with replacement. `coloration` 0 yields neutral pixels,
/// 1 keeps the drawn tint, 2 exaggerates it. `intensity` scales full white.
pub fn scatter_fireflies(
    rgb: &mut [[f64; 3]],
    width: usize,
    height: usize,
    density: f64,
    intensity: f64,
    coloration: f64,
    rng: &mut impl Rng,
) {
    if density <= 0.0 || width == 0 || height == 0 {
        return;
    }
    let count = firefly_count(width, height, density);
    for _ in 0..count {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        let raw = [
            rng.random_range(FIREFLY_FLOOR..=1.0),
            rng.random_range(FIREFLY_FLOOR..=1.0),
            rng.random_range(FIREFLY_FLOOR..=1.0),
        ];
        rgb[y * width + x] = firefly_color(raw, intensity, coloration);
    }
}

/// Blend a raw tint toward its luma-derived gray by `1 - coloration`,
/// then scale to 8-bit units.
pub fn firefly_color(raw: [f64; 3], intensity: f64, coloration: f64) -> [f64; 3] {
    let gray = spectral::luma(raw);
    let scale = 255.0 * intensity;
    [
        (gray + (raw[0] - gray) * coloration) * scale,
        (gray + (raw[1] - gray) * coloration) * scale,
        (gray + (raw[2] - gray) * coloration) * scale,
    ]
}
