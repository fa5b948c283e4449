//! Fixed-pattern noise maps: the per-sensor defects that stay put across frames.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::error::{GrainError, Result, check_dimensions};
use crate::filter;
use crate::rng;
use crate::sensor::banding;

/// Standard deviation of the per-pixel gain (PRNU) map around 1.0.
pub const GAIN_SIGMA: f64 = 0.005;

/// Linear downscale of the random field behind the texture map.
pub const TEXTURE_CELL: u32 = 64;

/// Blur applied to the coarse texture field, in coarse cells.
pub const TEXTURE_BLUR_SIGMA: f64 = 1.5;

/// Resolution-keyed defect maps. All buffers are row-major `width * height`,
/// except banding, which holds one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPatternMaps {
    pub width: usize,
    pub height: usize,
    /// Multiplicative gain non-uniformity (PRNU), about 1.0.
    pub gain: Vec<f64>,
    /// Additive offset non-uniformity (DSNU), zero-mean unit variance.
    pub offset: Vec<f64>,
    /// Row readout banding, broadcast across columns.
    pub banding_rows: Vec<f64>,
    /// Smooth texture field normalized to [0, 1].
    pub texture: Vec<f64>,
}

impl FixedPatternMaps {
    /// Banding value shared by every pixel in row `y`.
    pub fn banding_at_row(&self, y: usize) -> f64 {
        self.banding_rows[y]
    }

    pub fn matches(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }
}

/// Draw every fixed-pattern map for one resolution from the fixed stream.
///
/// Depends only on `(width, height, seed)`.
pub fn generate_fixed_pattern_maps(width: u32, height: u32, seed: u64) -> Result<FixedPatternMaps> {
    check_dimensions(width, height)?;
    log::info!("Generating fixed-pattern noise maps for {width}x{height} (seed {seed})");

    let w = width as usize;
    let h = height as usize;
    let n = w * h;
    let mut rng = rng::fixed_stream(seed);

    let gain_dist =
        Normal::new(1.0, GAIN_SIGMA).map_err(|e| GrainError::Distribution(e.to_string()))?;
    let gain: Vec<f64> = (0..n).map(|_| gain_dist.sample(&mut rng)).collect();
    let offset: Vec<f64> = (0..n)
        .map(|_| -> f64 { StandardNormal.sample(&mut rng) })
        .collect();
    let banding_rows = banding::banding_rows(&mut rng, h);
    let texture = texture_map(&mut rng, width, height)?;

    Ok(FixedPatternMaps {
        width: w,
        height: h,
        gain,
        offset,
        banding_rows,
        texture,
    })
}

/// Coarse uniform field, blurred, upsampled and stretched to [0, 1].
fn texture_map(rng: &mut impl Rng, width: u32, height: u32) -> Result<Vec<f64>> {
    let cw = width / TEXTURE_CELL + 1;
    let ch = height / TEXTURE_CELL + 1;
    let coarse: Vec<f64> = (0..cw * ch).map(|_| rng.random::<f64>()).collect();
    let smoothed = filter::gaussian_blur(&coarse, cw as usize, ch as usize, TEXTURE_BLUR_SIGMA);

    let field: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(cw, ch, smoothed.iter().map(|&v| v as f32).collect()).ok_or_else(
            || GrainError::parameter("texture", "coarse field does not match its dimensions"),
        )?;
    let full = imageops::resize(&field, width, height, FilterType::Triangle);

    let values: Vec<f64> = full.into_raw().into_iter().map(f64::from).collect();
    Ok(normalize_min_max(values))
}

/// Stretch values so the minimum maps to 0 and the maximum to 1.
/// A constant field maps to 0.5.
pub fn normalize_min_max(mut values: Vec<f64>) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.is_nan() || range <= 0.0 {
        values.iter_mut().for_each(|v| *v = 0.5);
        return values;
    }
    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
    values
}
