use crate::image_pipeline::color_bar::{ColorBar, TemperatureLabel};
use crate::image_pipeline::display::FrameMode;
use crate::image_pipeline::frame::OutputFormat;
use crate::image_pipeline::segmentation::SegmentationStats;

/// A finished frame as handed to the presentation sink.
///
/// Borrows the pipeline's output buffer, so it must be consumed before the
/// next frame is processed.
#[derive(Debug, Clone)]
pub struct RenderedFrame<'a> {
    /// Exactly `byte_size` bytes in `format` layout
    pub data: &'a [u8],
    /// Displayed width, already swapped for quarter-turn rotations
    pub width: usize,
    pub height: usize,
    pub byte_size: usize,
    pub format: OutputFormat,
    pub mode: FrameMode,
    pub sequence: u64,
    pub fps: Option<f32>,
    /// Whole-frame `(max, min)` in °C, when the camera reports it
    pub extremes_celsius: Option<(f32, f32)>,
    /// Legend in the same channel order as `data`
    pub color_bar: Option<&'a ColorBar>,
    pub labels: Vec<TemperatureLabel>,
    /// Band and pixel counts, segmentation mode only
    pub segmentation: Option<SegmentationStats>,
}

impl RenderedFrame<'_> {
    /// One-line overlay text in the spirit of the on-screen readout.
    pub fn overlay_text(&self) -> String {
        let mut text = match self.fps {
            Some(fps) => format!("fps:{fps:.1}"),
            None => "fps:--".to_string(),
        };
        if let Some((max, min)) = self.extremes_celsius {
            text.push_str(&format!(" Max: {max:.2} C Min: {min:.2} C"));
        }
        if let Some(stats) = &self.segmentation {
            text.push_str(&format!(
                " [{:.1}-{:.1} C: {:.1}%]",
                stats.band.min_celsius(),
                stats.band.max_celsius(),
                stats.in_band_percent()
            ));
        }
        text
    }
}

/// Input the sink collected while presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    /// Switch between normal and segmentation rendering from the next frame on
    ToggleSegmentation,
    /// End the render loop
    Stop,
}
