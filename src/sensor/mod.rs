//! Synthetic sensor: fixed-pattern defects, temporal noise layers and the
//! grain plate generator that stacks them.

pub mod adc;
pub mod banding;
pub mod cache;
pub mod firefly;
pub mod fixed_pattern;
pub mod noise;
pub mod plate;

pub use cache::{FixedPatternCache, MapKey};
pub use fixed_pattern::{FixedPatternMaps, generate_fixed_pattern_maps};
pub use plate::generate_grain_plate;
