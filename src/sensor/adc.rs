use image::RgbImage;

/// Snap an 8-bit-unit value to the nearest of `2^bit_depth` evenly spaced
/// levels over [0, 255]. Depths of 8 and above pass through.
pub fn quantize_level(value: f64, bit_depth: u8) -> f64 {
    if bit_depth >= 8 {
        return value;
    }
    let steps = ((1u32 << bit_depth) - 1) as f64;
    (value / 255.0 * steps).round() * (255.0 / steps)
}

/// Simulate a coarse ADC on a float RGB buffer.
pub fn quantize(rgb: &mut [[f64; 3]], bit_depth: u8) {
    if bit_depth >= 8 {
        return;
    }
    for pixel in rgb.iter_mut() {
        for c in 0..3 {
            pixel[c] = quantize_level(pixel[c], bit_depth);
        }
    }
}

/// Re-quantize an 8-bit image, e.g. after a resampling filter produced
/// in-between levels.
pub fn quantize_image(img: &mut RgbImage, bit_depth: u8) {
    if bit_depth >= 8 {
        return;
    }
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let q = quantize_level(pixel[c] as f64, bit_depth);
            pixel[c] = q.round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn four_bit_levels_are_multiples_of_seventeen() {
        assert_eq!(quantize_level(0.0, 4), 0.0);
        assert_eq!(quantize_level(128.0, 4), 136.0);
        assert_eq!(quantize_level(255.0, 4), 255.0);
        assert_eq!(quantize_level(9.0, 4), 17.0);
    }

    #[test]
    fn eight_bits_pass_through() {
        assert_eq!(quantize_level(127.3, 8), 127.3);
    }

    #[test]
    fn image_quantization_bounds_distinct_levels() {
        for depth in 4..8u8 {
            let mut img = RgbImage::from_fn(256, 1, |x, _| image::Rgb([x as u8, 255 - x as u8, 7]));
            quantize_image(&mut img, depth);
            let levels: HashSet<u8> = img.pixels().map(|p| p[0]).collect();
            assert_eq!(levels.len(), 1usize << depth);
        }
    }
}
