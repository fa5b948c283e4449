use std::sync::Arc;

use image::RgbImage;

use crate::color;
use crate::error::{GrainError, Result, check_dimensions};
use crate::params::GrainParams;
use crate::post;
use crate::resample;
use crate::sensor::adc;
use crate::sensor::noise;
use crate::sensor::plate;
use crate::sensor::{FixedPatternCache, FixedPatternMaps, MapKey};

/// One unit of work: everything that determines a single output frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
    pub width: u32,
    pub height: u32,
    pub frame: u64,
    pub params: &'a GrainParams,
    /// Background already resampled to `width x height`.
    pub background: Option<&'a RgbImage>,
}

impl<'a> FrameRequest<'a> {
    pub fn new(width: u32, height: u32, params: &'a GrainParams) -> Self {
        Self {
            width,
            height,
            frame: 0,
            params,
            background: None,
        }
    }

    pub fn with_frame(mut self, frame: u64) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_background(mut self, background: Option<&'a RgbImage>) -> Self {
        self.background = background;
        self
    }

    /// Reject the request before any computation if it cannot be rendered.
    pub fn validate(&self) -> Result<()> {
        check_dimensions(self.width, self.height)?;
        self.params.validate()?;
        if let Some(bg) = self.background
            && bg.dimensions() != (self.width, self.height)
        {
            return Err(GrainError::parameter(
                "background",
                format!(
                    "{}x{} does not match the {}x{} target",
                    bg.width(),
                    bg.height(),
                    self.width,
                    self.height
                ),
            ));
        }
        Ok(())
    }
}

/// Pipeline context: owns the fixed-pattern cache and runs requests through
/// generation, supersampling, compositing and post-processing.
///
/// The cache only holds the map sets the latest request needs, so changing
/// seed, supersampling or resolution releases the old maps.
///
/// Shareable across threads; rendering takes `&self`.
#[derive(Debug, Default)]
pub struct GrainRenderer {
    cache: FixedPatternCache,
}

impl GrainRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &FixedPatternCache {
        &self.cache
    }

    /// Cached fixed-pattern maps for one render resolution and seed.
    pub fn fixed_pattern_maps(&self, width: u32, height: u32, seed: u64) -> Result<Arc<FixedPatternMaps>> {
        self.cache.get_or_generate(width, height, seed)
    }

    /// Map sets a request reads: the render-resolution maps, plus the
    /// target-resolution texture when micro-contrast follows it.
    fn active_keys(request: &FrameRequest<'_>, render_w: u32, render_h: u32) -> Vec<MapKey> {
        let seed = request.params.seed;
        let mut keys = vec![MapKey {
            width: render_w,
            height: render_h,
            seed,
        }];
        let supersampled = (render_w, render_h) != (request.width, request.height);
        if supersampled && uses_texture(request.params) {
            keys.push(MapKey {
                width: request.width,
                height: request.height,
                seed,
            });
        }
        keys
    }

    /// Generate the grain plate for a request at the target resolution.
    ///
    /// With supersampling the generator and its fixed-pattern maps run at the
    /// multiplied resolution; the plate is then downsampled and re-quantized so
    /// the bit depth still holds.
    pub fn render_plate(&self, request: &FrameRequest<'_>) -> Result<RgbImage> {
        request.validate()?;

        let params = request.params;
        let (render_w, render_h) =
            resample::render_dimensions(request.width, request.height, params.supersample)?;
        self.cache.retain_only(&Self::active_keys(request, render_w, render_h));
        let maps = self.cache.get_or_generate(render_w, render_h, params.seed)?;

        let mask = match request.background {
            Some(bg) if params.shadow_bias > 0.0 => {
                Some(noise::shadow_mask(bg, render_w, render_h, params.shadow_bias))
            }
            None if params.shadow_bias > 0.0 => {
                log::debug!("Shadow bias requested without a background, ignoring");
                None
            }
            _ => None,
        };

        let rendered = plate::generate_grain_plate(
            render_w,
            render_h,
            request.frame,
            params,
            &maps,
            mask.as_deref(),
        )?;

        let mut plate = resample::resample(rendered, request.width, request.height);
        if params.supersample > 1 {
            adc::quantize_image(&mut plate, params.bit_depth);
        }
        Ok(plate)
    }

    /// Run the full pipeline for one frame.
    pub fn render_frame(&self, request: &FrameRequest<'_>) -> Result<RgbImage> {
        let plate = self.render_plate(request)?;
        let composited = color::composite(request.background, plate)?;

        let params = request.params;
        let texture_maps = if uses_texture(params) {
            Some(
                self.cache
                    .get_or_generate(request.width, request.height, params.seed)?,
            )
        } else {
            None
        };
        let texture = texture_maps.as_ref().map(|m| m.texture.as_slice());

        Ok(post::post_process(composited, params, texture))
    }
}

fn uses_texture(params: &GrainParams) -> bool {
    params.micro_contrast != 0.0 && params.texture_variation != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn request_validation_runs_first() {
        let renderer = GrainRenderer::new();
        let params = GrainParams::default();
        let err = renderer.render_frame(&FrameRequest::new(0, 10, &params));
        assert!(matches!(err, Err(GrainError::InvalidDimensions { .. })));
        assert!(renderer.cache().is_empty());
    }

    #[test]
    fn mismatched_background_is_rejected() {
        let renderer = GrainRenderer::new();
        let params = GrainParams::default();
        let bg = RgbImage::new(5, 5);
        let request = FrameRequest::new(6, 6, &params).with_background(Some(&bg));
        assert!(renderer.render_frame(&request).is_err());
    }

    #[test]
    fn supersampled_maps_are_cached_at_render_resolution() {
        let renderer = GrainRenderer::new();
        let params = GrainParams {
            read_strength: 4.0,
            supersample: 2,
            ..GrainParams::default()
        };
        let plate = renderer
            .render_plate(&FrameRequest::new(10, 8, &params))
            .unwrap();
        assert_eq!(plate.dimensions(), (10, 8));
        let key = crate::sensor::MapKey {
            width: 20,
            height: 16,
            seed: 0,
        };
        assert!(renderer.cache().lookup(&key).is_some());
    }

    #[test]
    fn resolution_change_invalidates_cache() {
        let renderer = GrainRenderer::new();
        let params = GrainParams::default();
        renderer.render_frame(&FrameRequest::new(8, 8, &params)).unwrap();
        renderer.render_frame(&FrameRequest::new(8, 8, &params)).unwrap();
        assert_eq!(renderer.cache().len(), 1);
        renderer.render_frame(&FrameRequest::new(9, 8, &params)).unwrap();
        assert_eq!(renderer.cache().len(), 1);
    }

    #[test]
    fn cache_stays_bounded_across_seed_and_supersample_changes() {
        let renderer = GrainRenderer::new();
        for seed in 0..6 {
            let params = GrainParams {
                read_strength: 3.0,
                seed,
                ..GrainParams::default()
            };
            renderer.render_frame(&FrameRequest::new(16, 16, &params)).unwrap();
            assert_eq!(renderer.cache().len(), 1);
        }
        for supersample in 1..=4 {
            let params = GrainParams {
                supersample,
                micro_contrast: 0.5,
                texture_variation: 1.0,
                ..GrainParams::default()
            };
            renderer.render_frame(&FrameRequest::new(16, 16, &params)).unwrap();
            let expected = if supersample == 1 { 1 } else { 2 };
            assert_eq!(renderer.cache().len(), expected, "supersample {supersample}");
        }
    }

    #[test]
    fn texture_maps_survive_repeated_supersampled_frames() {
        let renderer = GrainRenderer::new();
        let params = GrainParams {
            supersample: 2,
            micro_contrast: 0.5,
            texture_variation: 1.0,
            ..GrainParams::default()
        };
        renderer.render_frame(&FrameRequest::new(12, 12, &params)).unwrap();
        let texture_key = MapKey {
            width: 12,
            height: 12,
            seed: 0,
        };
        let first = renderer.cache().lookup(&texture_key).unwrap();
        renderer.render_frame(&FrameRequest::new(12, 12, &params).with_frame(1)).unwrap();
        let second = renderer.cache().lookup(&texture_key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn shadow_bias_without_background_is_ignored() {
        let renderer = GrainRenderer::new();
        let biased = GrainParams {
            read_strength: 5.0,
            shadow_bias: 2.0,
            ..GrainParams::default()
        };
        let plain = GrainParams {
            shadow_bias: 0.0,
            ..biased.clone()
        };
        let a = renderer.render_frame(&FrameRequest::new(16, 16, &biased)).unwrap();
        let b = renderer.render_frame(&FrameRequest::new(16, 16, &plain)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn black_background_composites_to_black() {
        let renderer = GrainRenderer::new();
        let params = GrainParams {
            read_strength: 20.0,
            shadow_bias: 1.0,
            ..GrainParams::default()
        };
        let bg = RgbImage::from_pixel(12, 12, Rgb([0, 0, 0]));
        let out = renderer
            .render_frame(&FrameRequest::new(12, 12, &params).with_background(Some(&bg)))
            .unwrap();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
