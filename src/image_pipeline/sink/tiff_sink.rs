use std::io::Cursor;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::image_pipeline::color_bar::ColorBar;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::OutputFormat;
use crate::image_pipeline::sink::rendered::{RenderedFrame, SinkEvent};
use crate::image_pipeline::sink::types::{TiffCompression, TiffSinkConfig};
use crate::image_pipeline::sink::writer::PresentationSink;

/// Gap between the frame and the color bar in a composed image.
const COLOR_BAR_MARGIN: usize = 20;

/// Writes rendered frames to numbered TIFF files.
///
/// RGB888 is written as is, BGR888 is swapped back to RGB and Y14 becomes
/// a Gray16 image. YUV frames have no TIFF color type here and are skipped.
pub struct TiffFrameSink {
    config: TiffSinkConfig,
    rgb: Vec<u8>,
    written: Vec<PathBuf>,
    closed: bool,
}

impl TiffFrameSink {
    pub fn new(config: TiffSinkConfig) -> Self {
        Self {
            config,
            rgb: Vec::new(),
            written: Vec::new(),
            closed: false,
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn path_for(&self, sequence: u64) -> PathBuf {
        self.config
            .directory
            .join(format!("{}_{:06}.tiff", self.config.prefix, sequence))
    }

    fn compression(&self) -> tiff::encoder::Compression {
        use tiff::encoder::compression::DeflateLevel;
        use tiff::encoder::Compression;

        match self.config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }

    fn encoder<'b>(&self, buffer: &'b mut Vec<u8>) -> Result<tiff::encoder::TiffEncoder<Cursor<&'b mut Vec<u8>>>> {
        let mut encoder = tiff::encoder::TiffEncoder::new(Cursor::new(buffer))
            .map_err(|e| PipelineError::Sink(e.to_string()))?
            .with_compression(self.compression());

        if let Some(predictor_val) = self.config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }
        Ok(encoder)
    }

    /// Fills `self.rgb` with the frame (and optionally its color bar) in
    /// RGB order. Returns the image dimensions.
    fn stage_rgb(&mut self, frame: &RenderedFrame<'_>) -> (usize, usize) {
        let bar = frame.color_bar.filter(|_| self.config.compose_color_bar);
        let (width, height) = match bar {
            Some(bar) => compose(&mut self.rgb, frame, bar),
            None => {
                self.rgb.clear();
                self.rgb.extend_from_slice(frame.data);
                (frame.width, frame.height)
            }
        };

        if frame.format == OutputFormat::Bgr888 {
            for pixel in self.rgb.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
        }
        (width, height)
    }

    fn encode(&mut self, frame: &RenderedFrame<'_>) -> Result<Option<Vec<u8>>> {
        let mut buffer = Vec::new();
        match frame.format {
            OutputFormat::Rgb888 | OutputFormat::Bgr888 => {
                let (width, height) = self.stage_rgb(frame);
                self.encoder(&mut buffer)?
                    .write_image::<tiff::encoder::colortype::RGB8>(width as u32, height as u32, &self.rgb)
                    .map_err(|e| PipelineError::Sink(e.to_string()))?;
            }
            OutputFormat::Y14 => {
                let words: Vec<u16> = frame
                    .data
                    .chunks_exact(2)
                    .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                    .collect();
                self.encoder(&mut buffer)?
                    .write_image::<tiff::encoder::colortype::Gray16>(frame.width as u32, frame.height as u32, &words)
                    .map_err(|e| PipelineError::Sink(e.to_string()))?;
            }
            OutputFormat::Yuv422 | OutputFormat::Yuv444 => {
                warn!(format = ?frame.format, sequence = frame.sequence, "No TIFF layout for format, frame skipped");
                return Ok(None);
            }
        }
        Ok(Some(buffer))
    }
}

/// Lays out frame, margin and vertically centered bar on a black canvas.
/// Both inputs share the frame's three-byte channel order.
fn compose(canvas: &mut Vec<u8>, frame: &RenderedFrame<'_>, bar: &ColorBar) -> (usize, usize) {
    let width = frame.width + COLOR_BAR_MARGIN + bar.width;
    let height = frame.height.max(bar.height);
    canvas.clear();
    canvas.resize(width * height * 3, 0);

    let stride = width * 3;
    let frame_row = frame.width * 3;
    for (y, row) in frame.data.chunks_exact(frame_row).take(frame.height).enumerate() {
        canvas[y * stride..y * stride + frame_row].copy_from_slice(row);
    }

    let bar_x = (frame.width + COLOR_BAR_MARGIN) * 3;
    let bar_y = (height - bar.height) / 2;
    let bar_row = bar.width * 3;
    for (y, row) in bar.pixels.chunks_exact(bar_row).enumerate() {
        let start = (bar_y + y) * stride + bar_x;
        canvas[start..start + bar_row].copy_from_slice(row);
    }
    (width, height)
}

impl PresentationSink for TiffFrameSink {
    fn present(&mut self, frame: &RenderedFrame<'_>) -> Result<Vec<SinkEvent>> {
        if self.closed {
            return Err(PipelineError::Sink("TIFF sink already closed".to_string()));
        }
        if frame.sequence % self.config.every_nth.max(1) != 0 {
            return Ok(Vec::new());
        }

        let Some(buffer) = self.encode(frame)? else {
            return Ok(Vec::new());
        };

        let path = self.path_for(frame.sequence);
        std::fs::write(&path, &buffer)?;
        debug!(path = %path.display(), bytes = buffer.len(), "Frame written");
        self.written.push(path);
        Ok(Vec::new())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            info!(
                frames = self.written.len(),
                directory = %self.config.directory.display(),
                "TIFF sink closed"
            );
        }
        Ok(())
    }
}
