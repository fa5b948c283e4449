use rand::Rng;

const TABLE_SIZE: usize = 256;

/// Row spacing in noise-space units between adjacent sensor rows.
pub const ROW_FREQUENCY: f64 = 0.1;

/// Fractal 1-D gradient noise used for row readout banding.
///
/// Output is roughly zero-mean and stays within [-0.5, 0.5].
pub struct CoherentNoise1d {
    gradients: Vec<f64>,
    octaves: u32,
}

impl CoherentNoise1d {
    pub fn new(rng: &mut impl Rng, octaves: u32) -> Self {
        let gradients = (0..TABLE_SIZE)
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect();
        Self {
            gradients,
            octaves: octaves.max(1),
        }
    }

    pub fn sample(&self, x: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;
        for octave in 0..self.octaves {
            // Shift each octave so lattice points do not line up.
            let shift = octave as f64 * 17.31;
            total += self.gradient_noise(x * frequency + shift) * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / norm
    }

    fn gradient_noise(&self, x: f64) -> f64 {
        let cell = x.floor();
        let f = x - cell;
        let i = cell as i64;
        let g0 = self.gradients[i.rem_euclid(TABLE_SIZE as i64) as usize];
        let g1 = self.gradients[(i + 1).rem_euclid(TABLE_SIZE as i64) as usize];
        let n0 = g0 * f;
        let n1 = g1 * (f - 1.0);
        let t = f * f * f * (f * (f * 6.0 - 15.0) + 10.0);
        n0 + (n1 - n0) * t
    }
}

/// One banding value per row; the map is broadcast across columns.
pub fn banding_rows(rng: &mut impl Rng, height: usize) -> Vec<f64> {
    let noise = CoherentNoise1d::new(rng, 6);
    (0..height)
        .map(|y| noise.sample(y as f64 * ROW_FREQUENCY))
        .collect()
}
