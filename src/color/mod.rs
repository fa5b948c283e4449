pub mod overlay;
pub mod spectral;
pub mod tone;

pub use overlay::{composite, composite_overlay};
