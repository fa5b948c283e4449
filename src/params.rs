use crate::error::{GrainError, Result};

/// Denoise algorithm applied in the post-processing chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DenoiseMode {
    #[default]
    Off,
    /// Non-local means over luma and chroma.
    /// `strength` is the filtering strength in 8-bit levels, `detail` in [0, 1]
    /// protects luminance texture (1.0 leaves luma untouched).
    Photographic { strength: f64, detail: f64 },
    /// Bilateral smoothing with range sigma `smoothing` (8-bit levels),
    /// followed by an unsharp mask of amount `sharpening` when it is positive.
    EdgeAware { smoothing: f64, sharpening: f64 },
}

impl DenoiseMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Photographic { .. } => "Photographic",
            Self::EdgeAware { .. } => "Edge-Aware",
        }
    }

    /// True when the mode cannot change any pixel.
    pub fn is_neutral(&self) -> bool {
        match *self {
            Self::Off => true,
            Self::Photographic { strength, .. } => strength == 0.0,
            Self::EdgeAware {
                smoothing,
                sharpening,
            } => smoothing == 0.0 && sharpening == 0.0,
        }
    }
}

/// Largest bloom / crush kernel radius, in pixels.
pub const MAX_BLOOM: i32 = 20;

/// Immutable snapshot of every tunable in the pipeline.
///
/// Strengths are in 8-bit intensity units unless noted. Every strength at zero
/// turns its stage into an exact passthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainParams {
    // Fixed pattern
    pub gain_strength: f64,
    pub offset_strength: f64,
    pub banding_strength: f64,

    // Temporal noise
    pub shot_strength: f64,
    pub read_strength: f64,
    pub chroma_strength: f64,
    pub shadow_bias: f64,
    pub grain_size: u32,

    // Fireflies
    pub firefly_density: f64,
    pub firefly_intensity: f64,
    pub firefly_coloration: f64,

    // Output
    pub bit_depth: u8,
    pub supersample: u32,

    // Bloom / crush (percent blend)
    pub bloom: i32,
    pub bloom_strength: f64,

    // Denoise (percent blend)
    pub denoise: DenoiseMode,
    pub denoise_mix: f64,

    // Micro-contrast
    pub micro_contrast: f64,
    pub texture_variation: f64,

    // Color (saturation in percent, filmic in [0, 1])
    pub saturation: f64,
    pub filmic_saturation: f64,

    // Tone curve
    pub lift: f64,
    pub roll_off: f64,
    pub contrast: f64,

    pub seed: u64,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            gain_strength: 0.0,
            offset_strength: 0.0,
            banding_strength: 0.0,

            shot_strength: 0.0,
            read_strength: 0.0,
            chroma_strength: 0.0,
            shadow_bias: 0.0,
            grain_size: 1,

            firefly_density: 0.0,
            firefly_intensity: 1.0,
            firefly_coloration: 1.0,

            bit_depth: 8,
            supersample: 1,

            bloom: 0,
            bloom_strength: 100.0,

            denoise: DenoiseMode::Off,
            denoise_mix: 100.0,

            micro_contrast: 0.0,
            texture_variation: 0.0,

            saturation: 0.0,
            filmic_saturation: 0.0,

            lift: 0.0,
            roll_off: 0.0,
            contrast: 0.0,

            seed: 0,
        }
    }
}

impl GrainParams {
    /// Check every tunable against its documented range.
    pub fn validate(&self) -> Result<()> {
        non_negative("gain_strength", self.gain_strength)?;
        non_negative("offset_strength", self.offset_strength)?;
        non_negative("banding_strength", self.banding_strength)?;
        non_negative("shot_strength", self.shot_strength)?;
        non_negative("read_strength", self.read_strength)?;
        non_negative("chroma_strength", self.chroma_strength)?;
        non_negative("shadow_bias", self.shadow_bias)?;
        non_negative("firefly_intensity", self.firefly_intensity)?;
        non_negative("micro_contrast", self.micro_contrast)?;

        in_range("firefly_density", self.firefly_density, 0.0, 1.0)?;
        in_range("firefly_coloration", self.firefly_coloration, 0.0, 2.0)?;
        in_range("bloom_strength", self.bloom_strength, 0.0, 100.0)?;
        in_range("denoise_mix", self.denoise_mix, 0.0, 100.0)?;
        in_range("texture_variation", self.texture_variation, 0.0, 1.0)?;
        in_range("saturation", self.saturation, -100.0, f64::MAX)?;
        in_range("filmic_saturation", self.filmic_saturation, 0.0, 1.0)?;
        in_range("lift", self.lift, 0.0, 1.0)?;
        in_range("roll_off", self.roll_off, 0.0, 1.0)?;
        finite("contrast", self.contrast)?;

        if !(-MAX_BLOOM..=MAX_BLOOM).contains(&self.bloom) {
            return Err(GrainError::parameter(
                "bloom",
                format!("{} is outside -{MAX_BLOOM}..={MAX_BLOOM}", self.bloom),
            ));
        }
        if self.grain_size == 0 {
            return Err(GrainError::parameter("grain_size", "must be at least 1"));
        }
        if !(4..=8).contains(&self.bit_depth) {
            return Err(GrainError::parameter(
                "bit_depth",
                format!("{} is outside 4..=8", self.bit_depth),
            ));
        }
        if !(1..=4).contains(&self.supersample) {
            return Err(GrainError::parameter(
                "supersample",
                format!("{} is outside 1..=4", self.supersample),
            ));
        }

        match self.denoise {
            DenoiseMode::Off => {}
            DenoiseMode::Photographic { strength, detail } => {
                non_negative("denoise.strength", strength)?;
                in_range("denoise.detail", detail, 0.0, 1.0)?;
            }
            DenoiseMode::EdgeAware {
                smoothing,
                sharpening,
            } => {
                non_negative("denoise.smoothing", smoothing)?;
                non_negative("denoise.sharpening", sharpening)?;
            }
        }
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(GrainError::parameter(name, "must be finite"));
    }
    Ok(())
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(GrainError::parameter(name, format!("{value} is negative")));
    }
    Ok(())
}

fn in_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    finite(name, value)?;
    if value < min || value > max {
        return Err(GrainError::parameter(
            name,
            format!("{value} is outside [{min}, {max}]"),
        ));
    }
    Ok(())
}

/// Named starting points for the parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrainPreset {
    Clean,
    FineFilm,
    Iso3200,
    Camcorder,
}

impl GrainPreset {
    pub const ALL: &[GrainPreset] = &[
        GrainPreset::Clean,
        GrainPreset::FineFilm,
        GrainPreset::Iso3200,
        GrainPreset::Camcorder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GrainPreset::Clean => "Clean",
            GrainPreset::FineFilm => "Fine Film",
            GrainPreset::Iso3200 => "ISO 3200",
            GrainPreset::Camcorder => "Camcorder",
        }
    }

    pub fn params(self) -> GrainParams {
        match self {
            GrainPreset::Clean => GrainParams::default(),
            GrainPreset::FineFilm => GrainParams {
                shot_strength: 0.3,
                read_strength: 4.0,
                chroma_strength: 1.5,
                supersample: 2,
                micro_contrast: 0.2,
                texture_variation: 0.5,
                filmic_saturation: 0.4,
                roll_off: 0.1,
                ..GrainParams::default()
            },
            GrainPreset::Iso3200 => GrainParams {
                gain_strength: 2.0,
                offset_strength: 3.0,
                banding_strength: 0.01,
                shot_strength: 1.2,
                read_strength: 12.0,
                chroma_strength: 6.0,
                shadow_bias: 1.0,
                firefly_density: 0.0005,
                firefly_coloration: 0.6,
                ..GrainParams::default()
            },
            GrainPreset::Camcorder => GrainParams {
                banding_strength: 0.03,
                read_strength: 8.0,
                chroma_strength: 4.0,
                grain_size: 2,
                bit_depth: 6,
                saturation: -20.0,
                lift: 0.1,
                contrast: 0.2,
                ..GrainParams::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_presets_validate() {
        for &preset in GrainPreset::ALL {
            preset.params().validate().unwrap();
        }
    }

    #[test]
    fn bloom_is_limited_to_slider_range() {
        for bloom in [MAX_BLOOM + 1, 46_341, -MAX_BLOOM - 1, i32::MIN, i32::MAX] {
            let params = GrainParams {
                bloom,
                ..GrainParams::default()
            };
            assert!(matches!(
                params.validate(),
                Err(GrainError::InvalidParameter { name: "bloom", .. })
            ));
        }
        for bloom in [-MAX_BLOOM, -1, 0, 1, MAX_BLOOM] {
            let params = GrainParams {
                bloom,
                ..GrainParams::default()
            };
            params.validate().unwrap();
        }
    }

    #[test]
    fn rejects_out_of_range_bit_depth() {
        let params = GrainParams {
            bit_depth: 3,
            ..GrainParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(GrainError::InvalidParameter {
                name: "bit_depth",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_grain_size_and_bad_supersample() {
        let zero_grain = GrainParams {
            grain_size: 0,
            ..GrainParams::default()
        };
        assert!(zero_grain.validate().is_err());

        let big_ss = GrainParams {
            supersample: 5,
            ..GrainParams::default()
        };
        assert!(big_ss.validate().is_err());
    }

    #[test]
    fn rejects_negative_and_nan_strengths() {
        let negative = GrainParams {
            read_strength: -1.0,
            ..GrainParams::default()
        };
        assert!(negative.validate().is_err());

        let nan = GrainParams {
            shot_strength: f64::NAN,
            ..GrainParams::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn neutral_denoise_modes() {
        assert!(DenoiseMode::Off.is_neutral());
        assert!(
            DenoiseMode::Photographic {
                strength: 0.0,
                detail: 0.5
            }
            .is_neutral()
        );
        assert!(
            !DenoiseMode::EdgeAware {
                smoothing: 0.0,
                sharpening: 0.5
            }
            .is_neutral()
        );
    }
}
