//! Presentation sink module
//!
//! The render loop hands every finished frame to a [`PresentationSink`].
//! On-screen display is left to embedders; [`TiffFrameSink`] stores frames
//! as TIFF files with various compression options.

mod rendered;
mod tiff_sink;
pub mod types;
mod writer;

pub use rendered::{RenderedFrame, SinkEvent};
pub use tiff_sink::TiffFrameSink;
pub use types::{TiffCompression, TiffSinkConfig, TiffSinkConfigBuilder};
pub use writer::PresentationSink;
