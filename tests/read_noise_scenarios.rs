use std::collections::HashSet;

use organic_grain::{FrameRequest, GrainParams, GrainRenderer};

fn read_noise_only(bit_depth: u8) -> GrainParams {
    GrainParams {
        read_strength: 10.0,
        bit_depth,
        supersample: 1,
        seed: 42,
        ..GrainParams::default()
    }
}

#[test]
fn read_noise_alone_has_expected_moments() {
    let params = read_noise_only(8);
    let img = GrainRenderer::new()
        .render_frame(&FrameRequest::new(100, 100, &params))
        .unwrap();

    for c in 0..3 {
        let vals: Vec<f64> = img.pixels().map(|p| p[c] as f64).collect();
        let n = vals.len() as f64;
        let mean = vals.iter().sum::<f64>() / n;
        let std = (vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!((mean - 128.0).abs() <= 1.0, "channel {c} mean {mean}");
        assert!((std - 10.0).abs() <= 1.0, "channel {c} std {std}");
    }
}

#[test]
fn read_noise_is_luma_only() {
    let params = read_noise_only(8);
    let img = GrainRenderer::new()
        .render_frame(&FrameRequest::new(50, 50, &params))
        .unwrap();
    assert!(img.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
}

#[test]
fn four_bit_output_has_at_most_sixteen_levels() {
    let params = read_noise_only(4);
    let img = GrainRenderer::new()
        .render_frame(&FrameRequest::new(100, 100, &params))
        .unwrap();
    for c in 0..3 {
        let levels: HashSet<u8> = img.pixels().map(|p| p[c]).collect();
        assert!(levels.len() <= 16, "channel {c}: {} levels", levels.len());
    }
}

#[test]
fn four_bit_holds_with_supersampling() {
    let params = GrainParams {
        supersample: 3,
        ..read_noise_only(4)
    };
    let img = GrainRenderer::new()
        .render_frame(&FrameRequest::new(40, 40, &params))
        .unwrap();
    let levels: HashSet<u8> = img.pixels().map(|p| p[0]).collect();
    assert!(levels.len() <= 16);
}
