use image::RgbImage;

use crate::filter::{self, image_to_rgb, rgb_to_image};

/// Blur sigma separating fine detail from the base image.
pub const DETAIL_SIGMA: f64 = 3.0;

/// Boost local contrast: `image + (image - blur(image)) * mask * strength * 2`.
///
/// The mask is flat where `texture_variation` is 0 and follows the texture map
/// where it is 1. A missing or mismatched texture map is treated as flat.
pub fn micro_contrast(
    img: RgbImage,
    strength: f64,
    texture: Option<&[f64]>,
    texture_variation: f64,
) -> RgbImage {
    let (width, height) = img.dimensions();
    let n = (width as usize) * (height as usize);
    if strength == 0.0 || n == 0 {
        return img;
    }

    let texture = match texture {
        Some(t) if t.len() == n => Some(t),
        Some(t) => {
            log::warn!("Texture map has {} values for {n} pixels, using a flat mask", t.len());
            None
        }
        None => None,
    };

    let src = image_to_rgb(&img);
    let blurred = filter::gaussian_blur(&src, width as usize, height as usize, DETAIL_SIGMA);
    let gain = strength * 2.0;

    let out: Vec<[f64; 3]> = src
        .iter()
        .zip(blurred.iter())
        .enumerate()
        .map(|(i, (s, b))| {
            let mask = match texture {
                Some(t) if texture_variation != 0.0 => {
                    (1.0 - texture_variation) + t[i] * texture_variation
                }
                _ => 1.0,
            };
            let k = mask * gain;
            [
                s[0] + (s[0] - b[0]) * k,
                s[1] + (s[1] - b[1]) * k,
                s[2] + (s[2] - b[2]) * k,
            ]
        })
        .collect();

    rgb_to_image(&out, width, height)
}
