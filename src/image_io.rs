use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::{Result, check_dimensions};

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Resample a decoded background to exactly the target resolution.
///
/// The aspect ratio is not preserved: the background always covers the whole
/// frame, matching the plate it is composited with.
pub fn fit_to_target(img: &DynamicImage, width: u32, height: u32) -> Result<RgbImage> {
    check_dimensions(width, height)?;
    let (iw, ih) = img.dimensions();
    if (iw, ih) == (width, height) {
        return Ok(img.to_rgb8());
    }
    log::debug!("Resampling background {iw}x{ih} -> {width}x{height}");
    Ok(img.resize_exact(width, height, FilterType::Lanczos3).to_rgb8())
}

/// Decode a background image and resample it to the target resolution.
pub fn load_background(path: &Path, width: u32, height: u32) -> Result<RgbImage> {
    let img = load_image(path)?;
    fit_to_target(&img, width, height)
}

/// Encode by file extension (PNG, JPEG, TIFF, ...).
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)?;
    Ok(())
}

/// Output path of one frame of an exported sequence.
pub fn frame_path(dir: &Path, frame: u64) -> PathBuf {
    dir.join(format!("frame_{frame:05}.png"))
}
