//! Organic Grain - library crate.
//!
//! Synthesizes film-grain and sensor-noise plates, overlays them on an optional
//! background and runs the post-processing chain. Used by the command-line
//! front end and the integration tests.

pub mod color;
pub mod error;
pub mod filter;
pub mod image_io;
pub mod params;
pub mod pipeline;
pub mod post;
pub mod resample;
pub mod rng;
pub mod sensor;
pub mod sequence;

pub use color::composite_overlay;
pub use error::{GrainError, Result};
pub use params::{DenoiseMode, GrainParams, GrainPreset};
pub use pipeline::{FrameRequest, GrainRenderer};
pub use post::post_process;
pub use resample::resample;
pub use sensor::{
    FixedPatternCache, FixedPatternMaps, MapKey, generate_fixed_pattern_maps, generate_grain_plate,
};
pub use sequence::{FrameProgress, NoProgress, ProgressSink, SequenceRun, run_sequence};
