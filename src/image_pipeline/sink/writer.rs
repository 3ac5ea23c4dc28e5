use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::sink::rendered::{RenderedFrame, SinkEvent};

/// Receives finished frames from the render loop.
pub trait PresentationSink {
    /// Shows or stores one frame and returns any input gathered meanwhile.
    fn present(&mut self, frame: &RenderedFrame<'_>) -> Result<Vec<SinkEvent>>;

    /// Called exactly once when the render loop exits.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: PresentationSink + ?Sized> PresentationSink for Box<S> {
    fn present(&mut self, frame: &RenderedFrame<'_>) -> Result<Vec<SinkEvent>> {
        (**self).present(frame)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
