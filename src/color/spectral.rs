/// Rec. 601 luma of an RGB triple, in the same units as the input.
pub fn luma(rgb: [f64; 3]) -> f64 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

/// RGB in [0, 1] to (hue in [0, 6), saturation, value).
pub fn rgb_to_hsv(rgb: [f64; 3]) -> [f64; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    [h, s, max]
}

pub fn hsv_to_rgb(hsv: [f64; 3]) -> [f64; 3] {
    let [h, s, v] = hsv;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}

/// Scale chroma (distance from luma) by `1 + percent / 100`.
/// `rgb` is in 8-bit units.
pub fn apply_saturation(rgb: &mut [[f64; 3]], percent: f64) {
    if percent == 0.0 {
        return;
    }
    let factor = 1.0 + percent / 100.0;
    for pixel in rgb.iter_mut() {
        let gray = luma(*pixel);
        for c in 0..3 {
            pixel[c] = gray + (pixel[c] - gray) * factor;
        }
    }
}

/// Steepness and knees of the filmic roll-off curves on the value channel.
const FILMIC_STEEPNESS: f64 = 14.0;
const FILMIC_SHADOW_KNEE: f64 = 0.15;
const FILMIC_HIGHLIGHT_KNEE: f64 = 0.85;

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Weight in [0, 1] that is high in mid-tones and falls off toward black and white.
pub fn filmic_midtone_mask(value: f64) -> f64 {
    let shadows = logistic((value - FILMIC_SHADOW_KNEE) * FILMIC_STEEPNESS);
    let highlights = logistic((FILMIC_HIGHLIGHT_KNEE - value) * FILMIC_STEEPNESS);
    shadows * highlights
}

/// Attenuate saturation in deep shadows and highlights, mimicking film shoulder
/// and toe compression. `strength` in [0, 1]; `rgb` is in 8-bit units.
pub fn apply_filmic_saturation(rgb: &mut [[f64; 3]], strength: f64) {
    if strength == 0.0 {
        return;
    }
    for pixel in rgb.iter_mut() {
        let norm = [
            (pixel[0] / 255.0).clamp(0.0, 1.0),
            (pixel[1] / 255.0).clamp(0.0, 1.0),
            (pixel[2] / 255.0).clamp(0.0, 1.0),
        ];
        let [h, s, v] = rgb_to_hsv(norm);
        let mask = filmic_midtone_mask(v);
        let scale = 1.0 - (1.0 - mask) * strength;
        let out = hsv_to_rgb([h, s * scale, v]);
        *pixel = [out[0] * 255.0, out[1] * 255.0, out[2] * 255.0];
    }
}
