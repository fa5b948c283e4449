//! Post-processing chain.
//!
//! Stages run in a fixed order and each one is skipped outright when its
//! controlling value is neutral. Zero-area images pass through untouched.

pub mod denoise;
pub mod detail;
pub mod morphology;

use image::RgbImage;

use crate::color::{spectral, tone};
use crate::filter::{image_to_rgb, rgb_to_image};
use crate::params::GrainParams;

/// Apply bloom/crush, denoise, micro-contrast, saturation and tone curve.
///
/// `texture` is the fixed-pattern texture map at the image resolution; it only
/// matters when micro-contrast and texture variation are both active.
pub fn post_process(image: RgbImage, params: &GrainParams, texture: Option<&[f64]>) -> RgbImage {
    if image.width() == 0 || image.height() == 0 {
        return image;
    }
    let mut img = image;

    // Step 1: Bloom / crush
    if params.bloom != 0 && params.bloom_strength > 0.0 {
        img = morphology::bloom_crush(img, params.bloom, params.bloom_strength);
    }

    // Step 2: Denoise
    if !params.denoise.is_neutral() && params.denoise_mix > 0.0 {
        log::debug!("Denoise: {} at {}%", params.denoise.name(), params.denoise_mix);
        img = denoise::denoise(img, params.denoise, params.denoise_mix);
    }

    // Step 3: Micro-contrast
    if params.micro_contrast != 0.0 {
        img = detail::micro_contrast(img, params.micro_contrast, texture, params.texture_variation);
    }

    // Step 4: Saturation and filmic saturation
    if params.saturation != 0.0 || params.filmic_saturation != 0.0 {
        let mut rgb = image_to_rgb(&img);
        spectral::apply_saturation(&mut rgb, params.saturation);
        spectral::apply_filmic_saturation(&mut rgb, params.filmic_saturation);
        img = rgb_to_image(&rgb, img.width(), img.height());
    }

    // Step 5: Tone curve
    if let Some(lut) = tone::build_tone_lut(params.lift, params.roll_off, params.contrast) {
        img = tone::apply_tone_curve(img, &lut);
    }

    img
}
