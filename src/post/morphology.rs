use image::RgbImage;
use rayon::prelude::*;

use crate::filter::blend_images;
use crate::params::MAX_BLOOM;

/// Offsets of an elliptical (disk) structuring element of size `2 * radius + 1`.
pub fn elliptical_kernel(radius: u32) -> Vec<(i32, i32)> {
    let r = i64::from(radius);
    let r_sq = r * r;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r_sq {
                offsets.push((dx as i32, dy as i32));
            }
        }
    }
    offsets
}

/// Per-channel grayscale dilation (`dilate = true`) or erosion over the kernel,
/// with edge pixels replicated.
pub fn morph(img: &RgbImage, kernel: &[(i32, i32)], dilate: bool) -> RgbImage {
    let (width, height) = img.dimensions();
    let w = width as usize;
    let h = height as usize;
    let src = img.as_raw();
    let mut dst = vec![0u8; w * h * 3];

    dst.par_chunks_mut(w * 3).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = if dilate { [0u8; 3] } else { [255u8; 3] };
            for &(dx, dy) in kernel {
                let sx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                let sy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                let si = (sy * w + sx) * 3;
                for c in 0..3 {
                    acc[c] = if dilate {
                        acc[c].max(src[si + c])
                    } else {
                        acc[c].min(src[si + c])
                    };
                }
            }
            row_out[x * 3..x * 3 + 3].copy_from_slice(&acc);
        }
    });

    RgbImage::from_raw(width, height, dst).unwrap_or_else(|| img.clone())
}

/// Bloom (`value > 0`, dilation) or crush (`value < 0`, erosion) with a kernel
/// of size `2 * |value| + 1`, blended with the input at `strength` percent.
/// The radius is capped at [`MAX_BLOOM`].
pub fn bloom_crush(img: RgbImage, value: i32, strength: f64) -> RgbImage {
    if value == 0 || strength <= 0.0 || img.width() == 0 || img.height() == 0 {
        return img;
    }
    let kernel = elliptical_kernel(value.unsigned_abs().min(MAX_BLOOM as u32));
    let morphed = morph(&img, &kernel, value > 0);
    blend_images(&img, &morphed, strength)
}
