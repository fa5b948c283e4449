//! Deterministic random streams.
//!
//! Every request draws from two streams: the fixed-pattern stream, seeded with
//! the master seed alone, and the per-frame stream, seeded with the master
//! seed plus the frame offset. Replaying a seed replays the output bit for bit.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{GrainError, Result};

/// Seed of the stream that produces sensor-stable maps.
pub fn fixed_stream_seed(master_seed: u64) -> u64 {
    master_seed
}

/// Seed of the stream that produces temporal noise for one frame.
pub fn frame_stream_seed(master_seed: u64, frame_offset: u64) -> u64 {
    master_seed.wrapping_add(frame_offset)
}

pub fn fixed_stream(master_seed: u64) -> StdRng {
    StdRng::seed_from_u64(fixed_stream_seed(master_seed))
}

/// Per-frame stream. The generator is seeded with
/// `frame_stream_seed(master_seed, frame_offset) ^ FRAME_STREAM_SALT`, not the
/// bare `master_seed + frame_offset`, so frame 0 does not replay the
/// fixed-pattern stream. Equal `(master_seed, frame_offset)` pairs still give
/// equal streams.
pub fn frame_stream(master_seed: u64, frame_offset: u64) -> StdRng {
    StdRng::seed_from_u64(frame_stream_seed(master_seed, frame_offset) ^ FRAME_STREAM_SALT)
}

/// Mixed into every per-frame seed.
pub const FRAME_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Parse a seed typed by a user. Anything that is not an unsigned integer
/// falls back to 0.
pub fn seed_from_input(text: &str) -> u64 {
    match parse_seed(text) {
        Ok(seed) => seed,
        Err(_) => {
            log::warn!("Seed {text:?} is not numeric, using 0");
            0
        }
    }
}

/// Strict seed parsing for callers that must reject bad input.
pub fn parse_seed(text: &str) -> Result<u64> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| GrainError::InvalidSeed(text.to_string()))
}
