//! Pipeline orchestration module
//!
//! [`DisplayPipeline`] drives one frame at a time through either the
//! normal path (format conversion, then mirror/flip and rotation) or the
//! temperature segmentation path, and owns the scratch buffers, the mode
//! toggle and the frame-rate bookkeeping.

mod config;
mod mode;
mod pipeline;
mod timing;

pub use config::{DisplayConfig, DisplayConfigBuilder};
pub use mode::{FrameMode, ModeSwitch};
pub use pipeline::DisplayPipeline;
pub use timing::{FrameRateMeter, PipelineTimings, StageTiming, Timer};
