use std::collections::HashSet;

use image::{Rgb, RgbImage};
use organic_grain::color::tone::build_tone_lut;
use organic_grain::{
    FrameRequest, GrainParams, GrainRenderer, composite_overlay, generate_fixed_pattern_maps,
    generate_grain_plate,
};

fn plate(width: u32, height: u32, frame: u64, params: &GrainParams) -> RgbImage {
    let maps = generate_fixed_pattern_maps(width, height, params.seed).unwrap();
    generate_grain_plate(width, height, frame, params, &maps, None).unwrap()
}

fn everything_on() -> GrainParams {
    GrainParams {
        gain_strength: 1.5,
        offset_strength: 2.0,
        banding_strength: 0.02,
        shot_strength: 0.8,
        read_strength: 7.0,
        chroma_strength: 3.0,
        grain_size: 2,
        firefly_density: 0.002,
        seed: 1234,
        ..GrainParams::default()
    }
}

fn distinct_per_channel(img: &RgbImage) -> [usize; 3] {
    let mut sets: [HashSet<u8>; 3] = Default::default();
    for p in img.pixels() {
        for c in 0..3 {
            sets[c].insert(p[c]);
        }
    }
    [sets[0].len(), sets[1].len(), sets[2].len()]
}

#[test]
fn independent_runs_are_byte_identical() {
    let params = everything_on();
    let a = plate(64, 48, 5, &params);
    let b = plate(64, 48, 5, &params);
    assert_eq!(a.as_raw(), b.as_raw());

    let ra = GrainRenderer::new()
        .render_frame(&FrameRequest::new(40, 30, &params).with_frame(9))
        .unwrap();
    let rb = GrainRenderer::new()
        .render_frame(&FrameRequest::new(40, 30, &params).with_frame(9))
        .unwrap();
    assert_eq!(ra, rb);
}

#[test]
fn neutral_parameters_give_flat_mid_gray() {
    let out = plate(37, 21, 3, &GrainParams::default());
    assert!(out.pixels().all(|p| p.0 == [128, 128, 128]));
}

#[test]
fn overlay_boundaries_ignore_the_plate() {
    let grain = plate(32, 32, 0, &everything_on());
    let black = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
    let white = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
    assert_eq!(composite_overlay(&black, &grain).unwrap(), black);
    assert_eq!(composite_overlay(&white, &grain).unwrap(), white);
}

#[test]
fn mid_gray_is_an_overlay_fixed_point() {
    let gray = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
    assert_eq!(composite_overlay(&gray, &gray).unwrap(), gray);
}

#[test]
fn reduced_bit_depth_limits_distinct_values() {
    for depth in 4..8u8 {
        let params = GrainParams {
            bit_depth: depth,
            ..everything_on()
        };
        let out = plate(64, 64, 0, &params);
        for count in distinct_per_channel(&out) {
            assert!(count <= 1 << depth, "depth {depth}: {count} values");
        }
    }
}

#[test]
fn firefly_count_tracks_density() {
    let params = GrainParams {
        firefly_density: 0.01,
        seed: 77,
        ..GrainParams::default()
    };
    let out = plate(200, 200, 0, &params);
    let lit = out.pixels().filter(|p| p.0 != [128, 128, 128]).count();
    // 400 expected; binomial sd is about 20.
    assert!((340..=460).contains(&lit), "{lit} fireflies");
}

#[test]
fn tone_lut_is_monotonic_everywhere() {
    let steps = [0.0, 0.25, 0.5, 0.75, 1.0];
    for &lift in &steps {
        for &roll_off in &steps {
            for &contrast in &[-1e9, -40.0, -1.0, -0.5, 0.0, 0.5, 1.0, 3.0, 500.0, 2000.0, 1e9] {
                if let Some(lut) = build_tone_lut(lift, roll_off, contrast) {
                    assert!(
                        lut.windows(2).all(|w| w[0] <= w[1]),
                        "lift {lift} roll_off {roll_off} contrast {contrast}"
                    );
                }
            }
        }
    }
}

#[test]
fn supersampling_lowers_variance() {
    let renderer = GrainRenderer::new();
    let variance = |supersample: u32| {
        let params = GrainParams {
            read_strength: 10.0,
            supersample,
            seed: 5,
            ..GrainParams::default()
        };
        let img = renderer.render_plate(&FrameRequest::new(64, 64, &params)).unwrap();
        let vals: Vec<f64> = img.pixels().map(|p| p[0] as f64).collect();
        let mean = vals.iter().sum::<f64>() / vals.len() as f64;
        vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64
    };
    let single = variance(1);
    let quad = variance(4);
    assert!(quad < single, "4x {quad} vs 1x {single}");
}
