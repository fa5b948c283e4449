//! Supersampling: render the plate at an integer multiple of the target size
//! and shrink it with a windowed-sinc filter.

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::error::{GrainError, Result, check_dimensions};

/// Resolution the generator runs at for a given supersampling factor.
pub fn render_dimensions(width: u32, height: u32, factor: u32) -> Result<(u32, u32)> {
    check_dimensions(width, height)?;
    let factor = factor.max(1);
    match (width.checked_mul(factor), height.checked_mul(factor)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(GrainError::parameter(
            "supersample",
            format!("{width}x{height} at {factor}x overflows"),
        )),
    }
}

/// Downsample a rendered plate to the target size with Lanczos3.
/// A plate already at the target size is returned as is.
pub fn resample(plate: RgbImage, target_width: u32, target_height: u32) -> RgbImage {
    if plate.dimensions() == (target_width, target_height) {
        return plate;
    }
    log::debug!(
        "Downsampling plate {}x{} -> {target_width}x{target_height}",
        plate.width(),
        plate.height()
    );
    imageops::resize(&plate, target_width, target_height, FilterType::Lanczos3)
}
