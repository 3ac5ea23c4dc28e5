//! Color bar legend shown next to pseudo-colored frames.
//!
//! The bar is a vertical Y14 gradient from 16383 at the top row to 0 at
//! the bottom row, colorized with the same table as the frame it belongs
//! to. Labels spread the current whole-frame max/min temperature evenly
//! over the bar's height.

use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::{OutputFormat, Y14_MAX};
use crate::image_pipeline::vendor::{ColorTable, ColorspaceConverter, PseudoColorMapper};

/// Width in pixels of the left tick mark; the right one is one shorter.
const TICK_LEFT_SPAN: usize = 6;
const TICK_RIGHT_SPAN: usize = 5;
const TICK_COLOR: [u8; 3] = [255, 255, 255];

/// Bar geometry. Only [`ColorBarConfig::new`] and `Default` construct
/// one, so every config has a non-zero width, at least two rows and at
/// least two labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBarConfig {
    width: usize,
    height: usize,
    label_count: usize,
}

impl Default for ColorBarConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 256,
            label_count: 11,
        }
    }
}

impl ColorBarConfig {
    pub fn new(width: usize, height: usize, label_count: usize) -> Result<Self> {
        let config = Self {
            width,
            height,
            label_count,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn label_count(&self) -> usize {
        self.label_count
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height < 2 || self.label_count < 2 {
            return Err(PipelineError::InvalidDimensions(self.width, self.height));
        }
        Ok(())
    }

    /// Bar rows that carry a tick mark and a label, top to bottom.
    pub fn label_rows(&self) -> impl Iterator<Item = usize> + '_ {
        let last_row = self.height.saturating_sub(1);
        let last_label = self.label_count.saturating_sub(1).max(1);
        (0..self.label_count).map(move |i| i * last_row / last_label)
    }
}

/// One temperature label next to the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureLabel {
    pub row: usize,
    pub celsius: f32,
}

impl TemperatureLabel {
    pub fn text(&self) -> String {
        format!("{:.1}", self.celsius)
    }
}

/// Labels from `max_celsius` on the top row down to `min_celsius` on the
/// bottom row.
pub fn temperature_labels(config: &ColorBarConfig, max_celsius: f32, min_celsius: f32) -> Vec<TemperatureLabel> {
    let steps = config.label_count.saturating_sub(1).max(1) as f32;
    config
        .label_rows()
        .enumerate()
        .map(|(i, row)| TemperatureLabel {
            row,
            celsius: max_celsius - (max_celsius - min_celsius) * i as f32 / steps,
        })
        .collect()
}

/// Y14 value of bar row `y`. A bar shorter than two rows is all full scale.
pub fn gradient_value(y: usize, height: usize) -> u16 {
    if height < 2 {
        return Y14_MAX;
    }
    let y = y.min(height - 1);
    (Y14_MAX as usize - y * Y14_MAX as usize / (height - 1)) as u16
}

/// A colorized bar, packed 3 bytes per pixel in `format` channel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBar {
    pub width: usize,
    pub height: usize,
    pub format: OutputFormat,
    pub table: ColorTable,
    pub pixels: Vec<u8>,
}

impl ColorBar {
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * 3;
        Some([self.pixels[offset], self.pixels[offset + 1], self.pixels[offset + 2]])
    }
}

/// Renders the bar for a frame produced in `frame_format`.
///
/// BGR888 frames get a BGR bar colorized with the BGR table; every other
/// format gets an RGB bar from the RGB table.
pub fn render_color_bar<V>(vendor: &V, config: &ColorBarConfig, frame_format: OutputFormat) -> Result<ColorBar>
where
    V: PseudoColorMapper + ColorspaceConverter,
{
    config.validate()?;
    let table = ColorTable::for_output(frame_format);
    let pixels = config.width * config.height;

    let mut gradient = Vec::with_capacity(pixels);
    for y in 0..config.height {
        let value = gradient_value(y, config.height);
        gradient.extend(std::iter::repeat_n(value, config.width));
    }

    let mut yuyv = vec![0u8; pixels * 2];
    let mut rgb = vec![0u8; pixels * 3];
    vendor.map_to_yuyv(&gradient, table, &mut yuyv)?;
    vendor.yuv422_to_rgb(&yuyv, &mut rgb)?;

    let (format, mut pixels) = match table {
        ColorTable::BgrOrdered => {
            let mut bgr = vec![0u8; rgb.len()];
            vendor.rgb_to_bgr(&rgb, &mut bgr)?;
            (OutputFormat::Bgr888, bgr)
        }
        ColorTable::RgbOrdered => (OutputFormat::Rgb888, rgb),
    };

    draw_ticks(&mut pixels, config);
    debug!(width = config.width, height = config.height, table = table.vendor_index(), "Color bar rendered");

    Ok(ColorBar {
        width: config.width,
        height: config.height,
        format,
        table,
        pixels,
    })
}

fn draw_ticks(pixels: &mut [u8], config: &ColorBarConfig) {
    let width = config.width;
    let left = 0..TICK_LEFT_SPAN.min(width);
    let right = width.saturating_sub(TICK_RIGHT_SPAN)..width;
    for row in config.label_rows() {
        for x in left.clone().chain(right.clone()) {
            let offset = (row * width + x) * 3;
            pixels[offset..offset + 3].copy_from_slice(&TICK_COLOR);
        }
    }
}
