//! Grain plate generator: layers every noise source over a mid-gray field.

use image::RgbImage;

use crate::error::{GrainError, Result, check_dimensions};
use crate::filter;
use crate::params::GrainParams;
use crate::rng;
use crate::sensor::adc;
use crate::sensor::firefly;
use crate::sensor::fixed_pattern::FixedPatternMaps;
use crate::sensor::noise;

/// Level the accumulator starts from before any noise is added.
pub const BASE_LEVEL: f64 = 128.0;

/// Render one grain plate at `width x height`.
///
/// `maps` must have been generated for the same resolution and `shadow_mask`,
/// when present, must hold one multiplier per pixel. The per-frame random
/// stream is seeded from `params.seed + frame_offset`, so the output is a pure
/// function of the arguments.
pub fn generate_grain_plate(
    width: u32,
    height: u32,
    frame_offset: u64,
    params: &GrainParams,
    maps: &FixedPatternMaps,
    shadow_mask: Option<&[f64]>,
) -> Result<RgbImage> {
    check_dimensions(width, height)?;
    let w = width as usize;
    let h = height as usize;
    let n = w * h;

    if !maps.matches(w, h) {
        return Err(GrainError::parameter(
            "maps",
            format!(
                "generated for {}x{}, requested {w}x{h}",
                maps.width, maps.height
            ),
        ));
    }
    if let Some(mask) = shadow_mask
        && mask.len() != n
    {
        return Err(GrainError::parameter(
            "shadow_mask",
            format!("{} values for {n} pixels", mask.len()),
        ));
    }

    let mut frame_rng = rng::frame_stream(params.seed, frame_offset);
    let mut luma = vec![BASE_LEVEL; n];

    // Step 1: PRNU gain
    if params.gain_strength != 0.0 {
        for (v, g) in luma.iter_mut().zip(maps.gain.iter()) {
            *v *= 1.0 + (g - 1.0) * params.gain_strength;
        }
    }

    // Step 2: DSNU offset
    if params.offset_strength != 0.0 {
        for (v, o) in luma.iter_mut().zip(maps.offset.iter()) {
            *v += o * params.offset_strength;
        }
    }

    // Step 3: Shot noise
    if params.shot_strength > 0.0 {
        let mut layer = noise::shot_noise_layer(
            &luma,
            w,
            h,
            params.grain_size,
            params.shot_strength,
            &mut frame_rng,
        )?;
        noise::apply_mask(&mut layer, shadow_mask);
        add_layer(&mut luma, &layer);
    }

    // Step 4: Read noise
    if params.read_strength > 0.0 {
        let mut layer =
            noise::gaussian_layer(w, h, params.grain_size, params.read_strength, &mut frame_rng)?;
        noise::apply_mask(&mut layer, shadow_mask);
        add_layer(&mut luma, &layer);
    }

    // Step 5: Row banding
    if params.banding_strength != 0.0 {
        let scale = 255.0 * params.banding_strength;
        for (y, row) in luma.chunks_mut(w).enumerate() {
            let band = maps.banding_at_row(y) * scale;
            for v in row.iter_mut() {
                *v += band;
            }
        }
    }

    // Step 6: Replicate to three channels
    let mut rgb: Vec<[f64; 3]> = luma.iter().map(|&v| [v, v, v]).collect();

    // Step 7: Chroma noise, independent per channel
    if params.chroma_strength > 0.0 {
        for c in 0..3 {
            let mut layer = noise::gaussian_layer(
                w,
                h,
                params.grain_size,
                params.chroma_strength,
                &mut frame_rng,
            )?;
            noise::apply_mask(&mut layer, shadow_mask);
            for (pixel, n) in rgb.iter_mut().zip(layer.iter()) {
                pixel[c] += n;
            }
        }
    }

    // Step 8: Fireflies
    if params.firefly_density > 0.0 {
        firefly::scatter_fireflies(
            &mut rgb,
            w,
            h,
            params.firefly_density,
            params.firefly_intensity,
            params.firefly_coloration,
            &mut frame_rng,
        );
    }

    // Step 9: Bit depth
    adc::quantize(&mut rgb, params.bit_depth);

    // Step 10: Clip and pack
    Ok(filter::rgb_to_image(&rgb, width, height))
}

fn add_layer(acc: &mut [f64], layer: &[f64]) {
    for (v, n) in acc.iter_mut().zip(layer.iter()) {
        *v += n;
    }
}
