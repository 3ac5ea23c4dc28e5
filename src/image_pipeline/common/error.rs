use thiserror::Error;

use crate::image_pipeline::frame::{InputFormat, OutputFormat};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to allocate {bytes} bytes of scratch memory")]
    OutOfMemory { bytes: usize },

    #[error("Invalid frame dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Scratch buffers are not initialized")]
    NotInitialized,

    #[error(
        "Scratch buffers sized for {allocated_width}x{allocated_height}, requested {width}x{height}; release before reinitializing"
    )]
    ResolutionMismatch {
        allocated_width: usize,
        allocated_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Convert error: no mapping from {input:?} to {output:?} (pseudo color: {pseudo_color})")]
    UnsupportedConversion {
        input: InputFormat,
        output: OutputFormat,
        pseudo_color: bool,
    },

    #[error("Buffer too small: needed {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Invalid temperature band: {min}..={max} °C")]
    InvalidBand { min: f32, max: f32 },

    #[error("Image processing call failed: {0}")]
    Vendor(String),

    #[error("Presentation sink failed: {0}")]
    Sink(String),

    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("Frame handoff closed")]
    HandoffClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
