//! Common utilities module
//!
//! Error taxonomy shared by every pipeline stage.

pub mod error;

pub use error::{PipelineError, Result};
