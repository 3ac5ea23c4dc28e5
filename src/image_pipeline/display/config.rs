//! Display pipeline configuration types

use crate::image_pipeline::color_bar::ColorBarConfig;
use crate::image_pipeline::temperature::TemperatureBand;

/// Configuration for the per-frame display pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Temperatures rendered in segmentation mode
    pub segmentation_band: TemperatureBand,
    /// Whether the first frame is processed in segmentation mode
    pub start_in_segmentation: bool,
    /// Weight of the newest sample in the frame-rate average, in (0, 1].
    /// 1.0 reports the instantaneous rate.
    pub fps_smoothing: f32,
    /// Color bar attached to pseudo-colored frames; `None` disables it
    pub color_bar: Option<ColorBarConfig>,
    /// Whether to check plane dimensions against the buffers on every frame
    pub validate_dimensions: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            segmentation_band: TemperatureBand::HUMAN,
            start_in_segmentation: false,
            fps_smoothing: 1.0,
            color_bar: Some(ColorBarConfig::default()),
            validate_dimensions: true,
        }
    }
}

impl DisplayConfig {
    pub fn builder() -> DisplayConfigBuilder {
        DisplayConfigBuilder::default()
    }
}

/// Builder for DisplayConfig
#[derive(Default)]
pub struct DisplayConfigBuilder {
    segmentation_band: Option<TemperatureBand>,
    start_in_segmentation: Option<bool>,
    fps_smoothing: Option<f32>,
    color_bar: Option<Option<ColorBarConfig>>,
    validate_dimensions: Option<bool>,
}

impl DisplayConfigBuilder {
    pub fn segmentation_band(mut self, band: TemperatureBand) -> Self {
        self.segmentation_band = Some(band);
        self
    }

    pub fn start_in_segmentation(mut self, enable: bool) -> Self {
        self.start_in_segmentation = Some(enable);
        self
    }

    /// Out-of-range or non-finite factors fall back to the default.
    pub fn fps_smoothing(mut self, factor: f32) -> Self {
        self.fps_smoothing = Some(factor);
        self
    }

    pub fn color_bar(mut self, color_bar: Option<ColorBarConfig>) -> Self {
        self.color_bar = Some(color_bar);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> DisplayConfig {
        let default = DisplayConfig::default();
        DisplayConfig {
            segmentation_band: self.segmentation_band.unwrap_or(default.segmentation_band),
            start_in_segmentation: self.start_in_segmentation.unwrap_or(default.start_in_segmentation),
            fps_smoothing: self
                .fps_smoothing
                .filter(|f| f.is_finite() && *f > 0.0 && *f <= 1.0)
                .unwrap_or(default.fps_smoothing),
            color_bar: self.color_bar.unwrap_or(default.color_bar),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}
