//! Collaborator seams
//!
//! Pixel-level colorspace math, pseudo-color tables and per-point
//! temperature resolution belong to the camera vendor's SDK. The pipeline
//! only depends on the traits here; `software` provides a pure-Rust
//! implementation used by default and in tests.

mod software;
pub mod traits;

pub use software::{PlaneTemperatureLookup, SoftwareIrProcessor};
pub use traits::{
    ColorTable, ColorspaceConverter, FrameExtremes, PlaneDims, Point, PseudoColorMapper,
    TemperatureExtremes, TemperatureLookup,
};
