//! Acquisition/render synchronization module
//!
//! Acquisition fills the single [`StreamFrame`](crate::image_pipeline::frame::StreamFrame)
//! and render consumes it, strictly alternating through [`frame_handoff`].
//! [`run_render_loop`] drives the display pipeline and a presentation sink
//! until a budget, the source, or the sink ends it.

mod acquisition;
mod handoff;
mod render_loop;

pub use acquisition::{
    run_acquisition, spawn_acquisition, AcquisitionReport, FrameSource, SyntheticSource,
};
pub use handoff::{frame_handoff, AcquisitionSide, Received, RenderSide};
pub use render_loop::{
    run_render_loop, spawn_render, ExitReason, RenderBudget, RenderLoopConfig, RenderReport,
};
