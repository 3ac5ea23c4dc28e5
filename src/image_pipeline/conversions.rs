//! Pipeline conversions module
//!
//! Turns a raw visual plane into the requested output format: optional
//! contrast stretch, then a grayscale, pseudo-color or packed-YUV route
//! through the pipeline's two scratch buffers.

mod enhance;
mod format_converter;
mod route;

pub use enhance::{enhance, intensity_range, stretch_to_y14, Enhancement};
pub use format_converter::{convert_frame, ConversionReport};
pub use route::{ConversionRoute, IntensitySource, IntensityTarget, PackedTarget, PseudoTarget};
