//! Shared raster helpers: float/8-bit conversion and separable gaussian blur.
//!
//! Float buffers are row-major, one entry per pixel, in 8-bit intensity units.

use image::{Rgb, RgbImage};
use rayon::prelude::*;

/// A pixel value the blur can accumulate: one plane or three channels.
pub trait Lane: Copy + Send + Sync {
    const ZERO: Self;
    fn add_scaled(self, other: Self, weight: f64) -> Self;
}

impl Lane for f64 {
    const ZERO: Self = 0.0;
    fn add_scaled(self, other: Self, weight: f64) -> Self {
        self + other * weight
    }
}

impl Lane for [f64; 3] {
    const ZERO: Self = [0.0; 3];
    fn add_scaled(self, other: Self, weight: f64) -> Self {
        [
            self[0] + other[0] * weight,
            self[1] + other[1] * weight,
            self[2] + other[2] * weight,
        ]
    }
}

/// Normalized gaussian taps covering +-3 sigma.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut taps: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / denom).exp())
        .collect();
    let sum: f64 = taps.iter().sum();
    for t in taps.iter_mut() {
        *t /= sum;
    }
    taps
}

/// Separable gaussian blur with clamp-to-edge borders.
///
/// Rows are processed in parallel; every output row reads only the source
/// buffer, so the result does not depend on scheduling.
pub fn gaussian_blur<T: Lane>(src: &[T], width: usize, height: usize, sigma: f64) -> Vec<T> {
    if width == 0 || height == 0 || sigma <= 0.0 {
        return src.to_vec();
    }
    let taps = gaussian_kernel(sigma);
    let radius = (taps.len() / 2) as isize;

    let mut horizontal = vec![T::ZERO; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row = &src[y * width..(y + 1) * width];
            for (x, out) in row_out.iter_mut().enumerate() {
                let mut acc = T::ZERO;
                for (k, &w) in taps.iter().enumerate() {
                    let sx = (x as isize + k as isize - radius).clamp(0, width as isize - 1);
                    acc = acc.add_scaled(row[sx as usize], w);
                }
                *out = acc;
            }
        });

    let mut result = vec![T::ZERO; width * height];
    result
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row_out)| {
            for (x, out) in row_out.iter_mut().enumerate() {
                let mut acc = T::ZERO;
                for (k, &w) in taps.iter().enumerate() {
                    let sy = (y as isize + k as isize - radius).clamp(0, height as isize - 1);
                    acc = acc.add_scaled(horizontal[sy as usize * width + x], w);
                }
                *out = acc;
            }
        });
    result
}

/// Expand an 8-bit image into float RGB triples.
pub fn image_to_rgb(img: &RgbImage) -> Vec<[f64; 3]> {
    img.pixels()
        .map(|p| [p[0] as f64, p[1] as f64, p[2] as f64])
        .collect()
}

/// Round, clip and pack float RGB triples into an 8-bit image.
pub fn rgb_to_image(rgb: &[[f64; 3]], width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    for (pixel, value) in img.pixels_mut().zip(rgb.iter()) {
        *pixel = Rgb([to_u8(value[0]), to_u8(value[1]), to_u8(value[2])]);
    }
    img
}

pub fn to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Linear blend of two equally sized images, `percent` of the way to `toward`.
pub fn blend_images(base: &RgbImage, toward: &RgbImage, percent: f64) -> RgbImage {
    let t = (percent / 100.0).clamp(0.0, 1.0);
    if t >= 1.0 {
        return toward.clone();
    }
    let mut out = base.clone();
    for (o, (a, b)) in out
        .pixels_mut()
        .zip(base.pixels().zip(toward.pixels()))
    {
        for c in 0..3 {
            let va = a[c] as f64;
            o[c] = to_u8(va + (b[c] as f64 - va) * t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let taps = gaussian_kernel(3.0);
        let sum: f64 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(taps.len(), 19);
        assert!((taps[0] - taps[18]).abs() < 1e-15);
    }

    #[test]
    fn blur_preserves_flat_field() {
        let src = vec![42.0f64; 20 * 10];
        let out = gaussian_blur(&src, 20, 10, 2.0);
        assert!(out.iter().all(|v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn blur_spreads_an_impulse() {
        let mut src = vec![[0.0f64; 3]; 9 * 9];
        src[4 * 9 + 4] = [90.0, 0.0, 0.0];
        let out = gaussian_blur(&src, 9, 9, 1.0);
        assert!(out[4 * 9 + 4][0] < 90.0);
        assert!(out[4 * 9 + 5][0] > 0.0);
        assert_eq!(out[4 * 9 + 5][1], 0.0);
    }

    #[test]
    fn blend_endpoints() {
        let a = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let b = RgbImage::from_pixel(2, 2, Rgb([200, 100, 50]));
        assert_eq!(blend_images(&a, &b, 0.0), a);
        assert_eq!(blend_images(&a, &b, 100.0), b);
        assert_eq!(blend_images(&a, &b, 50.0).get_pixel(0, 0), &Rgb([100, 50, 25]));
    }
}
