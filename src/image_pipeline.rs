//! Thermal image pipeline module
//!
//! This module turns camera frames into displayable images, with separate
//! modules for format conversion, geometric transforms, temperature
//! segmentation, presentation and the acquisition/render handoff.

pub mod buffers;
pub mod color_bar;
pub mod common;
pub mod conversions;
pub mod display;
pub mod frame;
pub mod segmentation;
pub mod sink;
pub mod sync;
pub mod temperature;
pub mod transform;
pub mod vendor;

pub use common::{
    PipelineError,
    Result,
};

pub use frame::{
    FrameInfo,
    InputFormat,
    MirrorFlip,
    OutputFormat,
    Rotation,
    StreamFrame,
};

pub use display::{
    DisplayConfig,
    DisplayConfigBuilder,
    DisplayPipeline,
    FrameMode,
    ModeSwitch,
};

pub use sink::{
    PresentationSink,
    RenderedFrame,
    SinkEvent,
    TiffCompression,
    TiffFrameSink,
    TiffSinkConfig,
};

pub use sync::{
    frame_handoff,
    run_render_loop,
    spawn_acquisition,
    FrameSource,
    RenderBudget,
    RenderLoopConfig,
    SyntheticSource,
};

pub use temperature::TemperatureBand;
