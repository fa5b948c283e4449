use image::RgbImage;
use image::imageops::{self, FilterType};
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

use crate::color::spectral;
use crate::error::{GrainError, Result};

/// Photons collected per 8-bit intensity level for the shot-noise draw.
/// Calibration constant: at mid-gray and strength 1 this gives a standard
/// deviation of about 11 levels.
pub const PHOTONS_PER_LEVEL: f64 = 1.0;

/// Size of the layer actually sampled when grain coarsening is active.
pub fn coarse_dims(width: usize, height: usize, grain_size: u32) -> (usize, usize) {
    let g = grain_size.max(1) as usize;
    ((width / g).max(1), (height / g).max(1))
}

/// Nearest-neighbour upsample of a coarse layer.
///
/// Values are stretched to [0, 1] before resampling and restored afterwards,
/// so the output spans exactly the input range.
pub fn upsample_nearest(
    layer: &[f64],
    coarse_w: usize,
    coarse_h: usize,
    width: usize,
    height: usize,
) -> Vec<f64> {
    let min = layer.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = layer.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let normalized: Vec<f64> = if range > 0.0 {
        layer.iter().map(|v| (v - min) / range).collect()
    } else {
        vec![0.0; layer.len()]
    };

    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = (y * coarse_h / height).min(coarse_h - 1);
        for x in 0..width {
            let sx = (x * coarse_w / width).min(coarse_w - 1);
            out.push(normalized[sy * coarse_w + sx] * range + min);
        }
    }
    out
}

/// Sample a noise layer at `1 / grain_size` resolution and bring it back up.
///
/// `draw(cx, cy)` is called once per coarse pixel, row-major, so the random
/// stream is consumed in a fixed order.
fn coarsened_layer(
    width: usize,
    height: usize,
    grain_size: u32,
    mut draw: impl FnMut(usize, usize) -> f64,
) -> Vec<f64> {
    if grain_size <= 1 {
        let mut layer = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                layer.push(draw(x, y));
            }
        }
        return layer;
    }
    let (cw, ch) = coarse_dims(width, height, grain_size);
    let mut coarse = Vec::with_capacity(cw * ch);
    for cy in 0..ch {
        for cx in 0..cw {
            coarse.push(draw(cx, cy));
        }
    }
    upsample_nearest(&coarse, cw, ch, width, height)
}

/// Multiply a noise layer by the shadow mask, if any.
pub fn apply_mask(layer: &mut [f64], mask: Option<&[f64]>) {
    if let Some(mask) = mask {
        for (v, m) in layer.iter_mut().zip(mask.iter()) {
            *v *= m;
        }
    }
}

/// Photon shot noise around the current signal, as an additive layer.
///
/// Each sample draws a Poisson photon count for the signal level, converts it
/// back to intensity and keeps the deviation, scaled by `strength`.
pub fn shot_noise_layer(
    signal: &[f64],
    width: usize,
    height: usize,
    grain_size: u32,
    strength: f64,
    rng: &mut impl Rng,
) -> Result<Vec<f64>> {
    let g = grain_size.max(1) as usize;
    let mut failure = None;
    let layer = coarsened_layer(width, height, grain_size, |cx, cy| {
        let x = (cx * g).min(width - 1);
        let y = (cy * g).min(height - 1);
        let level = signal[y * width + x].max(0.0);
        let lambda = level * PHOTONS_PER_LEVEL;
        if lambda <= 0.0 {
            return 0.0;
        }
        match Poisson::new(lambda) {
            Ok(dist) => {
                let photons: f64 = dist.sample(&mut *rng);
                (photons / PHOTONS_PER_LEVEL - level) * strength
            }
            Err(e) => {
                failure.get_or_insert_with(|| e.to_string());
                0.0
            }
        }
    });
    match failure {
        Some(reason) => Err(GrainError::Distribution(reason)),
        None => Ok(layer),
    }
}

/// Zero-mean gaussian layer with standard deviation `sigma`.
pub fn gaussian_layer(
    width: usize,
    height: usize,
    grain_size: u32,
    sigma: f64,
    rng: &mut impl Rng,
) -> Result<Vec<f64>> {
    let dist = Normal::new(0.0, sigma).map_err(|e| GrainError::Distribution(e.to_string()))?;
    Ok(coarsened_layer(width, height, grain_size, |_, _| {
        dist.sample(&mut *rng)
    }))
}

/// Noise amplification for dark regions of the background:
/// `1 + (1 - luminance) * strength`, at the render resolution.
pub fn shadow_mask(background: &RgbImage, width: u32, height: u32, strength: f64) -> Vec<f64> {
    let resized;
    let source = if background.dimensions() == (width, height) {
        background
    } else {
        resized = imageops::resize(background, width, height, FilterType::Triangle);
        &resized
    };
    source
        .pixels()
        .map(|p| {
            let lum = spectral::luma([p[0] as f64, p[1] as f64, p[2] as f64]) / 255.0;
            1.0 + (1.0 - lum) * strength
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stats(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn coarse_dims_floor_at_one_pixel() {
        assert_eq!(coarse_dims(10, 3, 4), (2, 1));
        assert_eq!(coarse_dims(2, 2, 8), (1, 1));
        assert_eq!(coarse_dims(9, 9, 1), (9, 9));
    }

    #[test]
    fn upsample_keeps_range_and_blocks() {
        let coarse = vec![-3.0, 1.0, 5.0, 2.0];
        let up = upsample_nearest(&coarse, 2, 2, 4, 4);
        assert_eq!(up.len(), 16);
        assert_eq!(up[0], -3.0);
        assert_eq!(up[1], -3.0);
        assert_eq!(up[3], 1.0);
        assert_eq!(up[15], 2.0);
        assert_eq!(up.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 5.0);
    }

    #[test]
    fn gaussian_layer_matches_sigma() {
        let mut rng = StdRng::seed_from_u64(11);
        let layer = gaussian_layer(200, 200, 1, 10.0, &mut rng).unwrap();
        let (mean, std) = stats(&layer);
        assert!(mean.abs() < 0.2);
        assert!((std - 10.0).abs() < 0.3);
    }

    #[test]
    fn coarse_grain_repeats_samples() {
        let mut rng = StdRng::seed_from_u64(12);
        let layer = gaussian_layer(8, 8, 2, 5.0, &mut rng).unwrap();
        assert_eq!(layer[0], layer[1]);
        assert_eq!(layer[0], layer[8]);
        assert_ne!(layer[0], layer[2]);
    }

    #[test]
    fn shot_noise_scales_with_signal() {
        let mut rng = StdRng::seed_from_u64(13);
        let bright = vec![200.0; 10_000];
        let dim = vec![20.0; 10_000];
        let (_, std_bright) = stats(&shot_noise_layer(&bright, 100, 100, 1, 1.0, &mut rng).unwrap());
        let (_, std_dim) = stats(&shot_noise_layer(&dim, 100, 100, 1, 1.0, &mut rng).unwrap());
        assert!((std_bright - 200f64.sqrt()).abs() < 1.0);
        assert!(std_dim < std_bright);
    }

    #[test]
    fn black_signal_has_no_shot_noise() {
        let mut rng = StdRng::seed_from_u64(14);
        let layer = shot_noise_layer(&[0.0; 16], 4, 4, 1, 1.0, &mut rng).unwrap();
        assert!(layer.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn shadow_mask_boosts_dark_pixels() {
        let mut bg = RgbImage::from_pixel(2, 1, Rgb([255, 255, 255]));
        bg.put_pixel(0, 0, Rgb([0, 0, 0]));
        let mask = shadow_mask(&bg, 2, 1, 2.0);
        assert!((mask[0] - 3.0).abs() < 1e-9);
        assert!((mask[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shadow_mask_is_resampled_to_render_size() {
        let bg = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let mask = shadow_mask(&bg, 8, 8, 1.0);
        assert_eq!(mask.len(), 64);
        assert!(mask.iter().all(|m| (m - 2.0).abs() < 1e-9));
    }
}
