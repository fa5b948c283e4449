//! Denoise stage: non-local means ("Photographic") and bilateral plus unsharp
//! mask ("Edge-Aware").

use image::RgbImage;
use rayon::prelude::*;

use crate::filter::{self, blend_images, image_to_rgb, rgb_to_image};
use crate::params::DenoiseMode;

/// Half-size of the patch compared by non-local means.
pub const NLM_PATCH_RADIUS: i32 = 1;
/// Half-size of the window searched for similar patches.
pub const NLM_SEARCH_RADIUS: i32 = 5;

/// Spatial half-size and sigma of the bilateral filter.
pub const BILATERAL_RADIUS: i32 = 4;
pub const BILATERAL_SIGMA_SPACE: f64 = 4.0;

/// Blur sigma of the unsharp mask that follows the bilateral pass.
pub const UNSHARP_SIGMA: f64 = 1.0;

/// Run the selected denoiser and blend it with the input at `mix` percent.
pub fn denoise(img: RgbImage, mode: DenoiseMode, mix: f64) -> RgbImage {
    if mode.is_neutral() || mix <= 0.0 || img.width() == 0 || img.height() == 0 {
        return img;
    }
    let filtered = match mode {
        DenoiseMode::Off => return img,
        DenoiseMode::Photographic { strength, detail } => non_local_means(&img, strength, detail),
        DenoiseMode::EdgeAware {
            smoothing,
            sharpening,
        } => {
            let smoothed = if smoothing > 0.0 {
                bilateral(&img, smoothing)
            } else {
                img.clone()
            };
            if sharpening > 0.0 {
                unsharp_mask(&smoothed, sharpening, UNSHARP_SIGMA)
            } else {
                smoothed
            }
        }
    };
    blend_images(&img, &filtered, mix)
}

fn to_ycc(p: [f64; 3]) -> [f64; 3] {
    let y = 0.299 * p[0] + 0.587 * p[1] + 0.114 * p[2];
    [y, (p[2] - y) * 0.564, (p[0] - y) * 0.713]
}

fn from_ycc(p: [f64; 3]) -> [f64; 3] {
    let [y, cb, cr] = p;
    [
        y + 1.403 * cr,
        y - 0.344 * cb - 0.714 * cr,
        y + 1.773 * cb,
    ]
}

/// Colour non-local means in a luma/chroma space.
///
/// Chroma is filtered with `strength`; luma with `strength * (1 - detail)`, so
/// `detail = 1` keeps luminance texture intact while still cleaning colour
/// speckle.
pub fn non_local_means(img: &RgbImage, strength: f64, detail: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || strength <= 0.0 {
        return img.clone();
    }

    let ycc: Vec<[f64; 3]> = image_to_rgb(img).into_iter().map(to_ycc).collect();
    let h_luma = strength * (1.0 - detail.clamp(0.0, 1.0));
    let h_chroma = strength;
    let patch_area = ((2 * NLM_PATCH_RADIUS + 1) * (2 * NLM_PATCH_RADIUS + 1)) as f64;

    let at = |x: i32, y: i32| -> [f64; 3] {
        let cx = x.clamp(0, w as i32 - 1) as usize;
        let cy = y.clamp(0, h as i32 - 1) as usize;
        ycc[cy * w + cx]
    };

    let mut out = vec![[0.0f64; 3]; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        let y = y as i32;
        for (x, o) in row_out.iter_mut().enumerate() {
            let x = x as i32;
            let mut luma_sum = 0.0;
            let mut luma_weight = 0.0;
            let mut chroma_sum = [0.0f64; 2];
            let mut chroma_weight = 0.0;

            for sy in -NLM_SEARCH_RADIUS..=NLM_SEARCH_RADIUS {
                for sx in -NLM_SEARCH_RADIUS..=NLM_SEARCH_RADIUS {
                    let mut d_luma = 0.0;
                    let mut d_chroma = 0.0;
                    for py in -NLM_PATCH_RADIUS..=NLM_PATCH_RADIUS {
                        for px in -NLM_PATCH_RADIUS..=NLM_PATCH_RADIUS {
                            let a = at(x + px, y + py);
                            let b = at(x + sx + px, y + sy + py);
                            d_luma += (a[0] - b[0]).powi(2);
                            d_chroma += (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2);
                        }
                    }
                    d_luma /= patch_area;
                    d_chroma /= patch_area * 2.0;

                    let q = at(x + sx, y + sy);
                    if h_luma > 0.0 {
                        let wl = (-d_luma / (h_luma * h_luma)).exp();
                        luma_sum += q[0] * wl;
                        luma_weight += wl;
                    }
                    let wc = (-d_chroma / (h_chroma * h_chroma)).exp();
                    chroma_sum[0] += q[1] * wc;
                    chroma_sum[1] += q[2] * wc;
                    chroma_weight += wc;
                }
            }

            let center = at(x, y);
            let luma = if luma_weight > 0.0 {
                luma_sum / luma_weight
            } else {
                center[0]
            };
            // The centre patch always contributes weight 1.
            *o = from_ycc([
                luma,
                chroma_sum[0] / chroma_weight,
                chroma_sum[1] / chroma_weight,
            ]);
        }
    });

    rgb_to_image(&out, width, height)
}

/// Edge-preserving bilateral filter; `sigma_color` is in 8-bit levels.
pub fn bilateral(img: &RgbImage, sigma_color: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || sigma_color <= 0.0 {
        return img.clone();
    }
    let src = image_to_rgb(img);
    let r = BILATERAL_RADIUS;
    let space_denom = 2.0 * BILATERAL_SIGMA_SPACE * BILATERAL_SIGMA_SPACE;
    let color_denom = 2.0 * sigma_color * sigma_color;

    let mut out = vec![[0.0f64; 3]; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        for (x, o) in row_out.iter_mut().enumerate() {
            let center = src[y * w + x];
            let mut sum = [0.0f64; 3];
            let mut weight_sum = 0.0;
            for dy in -r..=r {
                let sy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                for dx in -r..=r {
                    let sx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                    let p = src[sy * w + sx];
                    let spatial = (dx * dx + dy * dy) as f64 / space_denom;
                    let range = ((center[0] - p[0]).powi(2)
                        + (center[1] - p[1]).powi(2)
                        + (center[2] - p[2]).powi(2))
                        / color_denom;
                    let weight = (-spatial - range).exp();
                    for c in 0..3 {
                        sum[c] += p[c] * weight;
                    }
                    weight_sum += weight;
                }
            }
            *o = if weight_sum > 0.0 {
                [sum[0] / weight_sum, sum[1] / weight_sum, sum[2] / weight_sum]
            } else {
                center
            };
        }
    });

    rgb_to_image(&out, width, height)
}

/// `original + amount * (original - blurred)`.
pub fn unsharp_mask(img: &RgbImage, amount: f64, sigma: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || amount == 0.0 {
        return img.clone();
    }
    let src = image_to_rgb(img);
    let blurred = filter::gaussian_blur(&src, width as usize, height as usize, sigma);
    let sharpened: Vec<[f64; 3]> = src
        .iter()
        .zip(blurred.iter())
        .map(|(s, b)| {
            [
                s[0] + amount * (s[0] - b[0]),
                s[1] + amount * (s[1] - b[1]),
                s[2] + amount * (s[2] - b[2]),
            ]
        })
        .collect();
    rgb_to_image(&sharpened, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noisy(seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(24, 24, |_, _| {
            let n: i32 = rng.random_range(-20..=20);
            let v = (128 + n) as u8;
            Rgb([v, (128 + rng.random_range(-20..=20)) as u8, v])
        })
    }

    fn variance(img: &RgbImage, c: usize) -> f64 {
        let vals: Vec<f64> = img.pixels().map(|p| p[c] as f64).collect();
        let mean = vals.iter().sum::<f64>() / vals.len() as f64;
        vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64
    }

    #[test]
    fn photographic_reduces_variance() {
        let img = noisy(1);
        let out = denoise(
            img.clone(),
            DenoiseMode::Photographic {
                strength: 30.0,
                detail: 0.0,
            },
            100.0,
        );
        assert!(variance(&out, 1) < variance(&img, 1) * 0.5);
    }

    #[test]
    fn edge_aware_reduces_variance() {
        let img = noisy(2);
        let out = denoise(
            img.clone(),
            DenoiseMode::EdgeAware {
                smoothing: 40.0,
                sharpening: 0.0,
            },
            100.0,
        );
        assert!(variance(&out, 0) < variance(&img, 0) * 0.5);
    }

    #[test]
    fn bilateral_keeps_hard_edges() {
        let img = RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 { Rgb([20, 20, 20]) } else { Rgb([230, 230, 230]) }
        });
        let out = bilateral(&img, 10.0);
        assert_eq!(out.get_pixel(7, 8), &Rgb([20, 20, 20]));
        assert_eq!(out.get_pixel(8, 8), &Rgb([230, 230, 230]));
    }

    #[test]
    fn flat_image_is_unchanged_by_every_mode() {
        let img = RgbImage::from_pixel(12, 12, Rgb([90, 120, 150]));
        for mode in [
            DenoiseMode::Photographic {
                strength: 10.0,
                detail: 0.5,
            },
            DenoiseMode::EdgeAware {
                smoothing: 10.0,
                sharpening: 1.0,
            },
        ] {
            let out = denoise(img.clone(), mode, 100.0);
            for p in out.pixels() {
                for c in 0..3 {
                    assert!((p[c] as i32 - img.get_pixel(0, 0)[c] as i32).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn zero_mix_or_off_is_passthrough() {
        let img = noisy(3);
        let mode = DenoiseMode::Photographic {
            strength: 30.0,
            detail: 0.0,
        };
        assert_eq!(denoise(img.clone(), mode, 0.0), img);
        assert_eq!(denoise(img.clone(), DenoiseMode::Off, 100.0), img);
    }

    #[test]
    fn unsharp_increases_edge_contrast() {
        let img = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([100, 100, 100]) } else { Rgb([150, 150, 150]) }
        });
        let out = unsharp_mask(&img, 1.0, 1.0);
        assert!(out.get_pixel(4, 5)[0] < 100);
        assert!(out.get_pixel(5, 5)[0] > 150);
    }
}
