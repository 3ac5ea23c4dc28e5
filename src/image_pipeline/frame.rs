//! Frame description module
//!
//! Plane descriptions shared between the acquisition layer and the pipeline.

mod stream;
pub mod types;

pub use stream::{CameraParams, StreamFrame};
pub use types::{FrameInfo, InputFormat, MirrorFlip, OutputFormat, Rotation, Y14_MAX, Y14_MID};
