//! Data models

pub mod feature;
pub mod prediction;
pub mod wire;

pub use feature::*;
pub use prediction::*;
pub use wire::*;
