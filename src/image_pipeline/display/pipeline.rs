use std::time::Instant;

use tracing::{debug, info, info_span, instrument};

use crate::image_pipeline::{
    buffers::ScratchBuffers,
    color_bar::{render_color_bar, temperature_labels, ColorBar, TemperatureLabel},
    common::error::{PipelineError, Result},
    conversions::convert_frame,
    display::{DisplayConfig, FrameMode, FrameRateMeter, ModeSwitch, PipelineTimings, Timer},
    frame::{FrameInfo, OutputFormat, StreamFrame},
    segmentation::{segment_by_temperature, SegmentationStats, SEGMENTATION_OUTPUT},
    sink::RenderedFrame,
    transform::apply_geometry,
    vendor::{
        ColorTable, ColorspaceConverter, PlaneDims, PlaneTemperatureLookup, PseudoColorMapper,
        SoftwareIrProcessor, TemperatureExtremes, TemperatureLookup,
    },
};

/// Output of one frame before it is wrapped for the sink.
struct Processed {
    mode: FrameMode,
    width: usize,
    height: usize,
    format: OutputFormat,
    byte_size: usize,
    pseudo_color: bool,
    segmentation: Option<SegmentationStats>,
}

/// Per-frame driver: format conversion and transforms in normal mode,
/// temperature segmentation in segmentation mode.
pub struct DisplayPipeline<V, L> {
    vendor: V,
    lookup: L,
    extremes: Option<Box<dyn TemperatureExtremes + Send>>,
    config: DisplayConfig,
    buffers: ScratchBuffers,
    mode: ModeSwitch,
    fps: FrameRateMeter,
    timings: PipelineTimings,
    color_bar: Option<ColorBar>,
}

impl DisplayPipeline<SoftwareIrProcessor, PlaneTemperatureLookup> {
    pub fn new(config: DisplayConfig) -> Self {
        Self::with_custom(SoftwareIrProcessor::new(), PlaneTemperatureLookup, config)
    }
}

impl<V, L> DisplayPipeline<V, L>
where
    V: PseudoColorMapper + ColorspaceConverter,
    L: TemperatureLookup,
{
    pub fn with_custom(vendor: V, lookup: L, config: DisplayConfig) -> Self {
        let initial = if config.start_in_segmentation {
            FrameMode::Segmentation
        } else {
            FrameMode::Normal
        };
        Self {
            vendor,
            lookup,
            extremes: None,
            fps: FrameRateMeter::new(config.fps_smoothing),
            mode: ModeSwitch::new(initial),
            config,
            buffers: ScratchBuffers::new(),
            timings: PipelineTimings::new(),
            color_bar: None,
        }
    }

    /// Attaches a whole-frame max/min temperature source for the readout
    /// and the color bar labels.
    pub fn with_extremes(mut self, extremes: Box<dyn TemperatureExtremes + Send>) -> Self {
        self.extremes = Some(extremes);
        self
    }

    /// Allocates the scratch buffers for the larger of the stream's visual
    /// and temperature planes, so either mode fits.
    pub fn init(&mut self, frame: &StreamFrame) -> Result<()> {
        let sizing = match frame.temp_frame {
            Some(_) if frame.temp_info.pixel_count() > frame.image_info.pixel_count() => &frame.temp_info,
            _ => &frame.image_info,
        };
        self.buffers.initialize(sizing.width, sizing.height)?;
        self.fps.reset();
        info!(
            width = sizing.width,
            height = sizing.height,
            mode = ?self.mode.current(),
            "Display pipeline initialized"
        );
        Ok(())
    }

    /// Frees the scratch buffers. Safe to call more than once.
    pub fn release(&mut self) {
        self.buffers.release();
        self.color_bar = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.buffers.is_initialized()
    }

    /// Handle for switching modes from other threads or from sink input.
    pub fn mode_switch(&self) -> ModeSwitch {
        self.mode.clone()
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn take_timings(&mut self) -> PipelineTimings {
        std::mem::take(&mut self.timings)
    }

    fn validate_dimensions(&self, info: &FrameInfo, plane_len: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if info.width == 0 || info.height == 0 {
            return Err(PipelineError::InvalidDimensions(info.width, info.height));
        }

        if let Some((width, height)) = self.buffers.dimensions() {
            if info.pixel_count() > width * height {
                return Err(PipelineError::ResolutionMismatch {
                    allocated_width: width,
                    allocated_height: height,
                    width: info.width,
                    height: info.height,
                });
            }
        }

        if plane_len < info.pixel_count() {
            return Err(PipelineError::BufferTooSmall {
                needed: info.pixel_count() * 2,
                available: plane_len * 2,
            });
        }
        Ok(())
    }

    fn process_normal(&mut self, frame: &mut StreamFrame) -> Result<Processed> {
        self.validate_dimensions(&frame.image_info, frame.image_frame.len())?;

        {
            let _span = info_span!("convert", format = ?frame.image_info.output_format).entered();
            let timer = Timer::start("convert");
            convert_frame(&self.vendor, &frame.image_frame, &mut frame.image_info, &mut self.buffers)?;
            self.timings.record(timer);
        }

        let (width, height) = {
            let _span = info_span!("transform").entered();
            let timer = Timer::start("transform");
            let dims = apply_geometry(&frame.image_info, &mut self.buffers)?;
            self.timings.record(timer);
            dims
        };

        Ok(Processed {
            mode: FrameMode::Normal,
            width,
            height,
            format: frame.image_info.output_format,
            byte_size: frame.image_info.byte_size,
            pseudo_color: frame.image_info.pseudo_color,
            segmentation: None,
        })
    }

    fn process_segmentation(&mut self, frame: &mut StreamFrame, plane: &[u16]) -> Result<Processed> {
        let info = &frame.temp_info;
        self.validate_dimensions(info, plane.len())?;
        let dims = PlaneDims {
            width: info.width,
            height: info.height,
        };

        let stats = {
            let _span = info_span!("segment", width = dims.width, height = dims.height).entered();
            let timer = Timer::start("segment");
            let stats = segment_by_temperature(
                &self.vendor,
                &self.lookup,
                plane,
                dims,
                self.config.segmentation_band,
                &mut self.buffers,
            )?;
            self.timings.record(timer);
            stats
        };
        frame.temp_info.byte_size = stats.byte_size();

        Ok(Processed {
            mode: FrameMode::Segmentation,
            width: dims.width,
            height: dims.height,
            format: SEGMENTATION_OUTPUT,
            byte_size: stats.byte_size(),
            pseudo_color: frame.image_info.pseudo_color,
            segmentation: Some(stats),
        })
    }

    /// Re-renders the cached color bar when the frame needs a different
    /// table than the one it was drawn with.
    fn refresh_color_bar(&mut self, format: OutputFormat) -> Result<()> {
        let Some(config) = self.config.color_bar else {
            return Ok(());
        };
        let table = ColorTable::for_output(format);
        if self.color_bar.as_ref().is_some_and(|bar| bar.table == table) {
            return Ok(());
        }

        let timer = Timer::start("color_bar");
        self.color_bar = Some(render_color_bar(&self.vendor, &config, format)?);
        self.timings.record(timer);
        Ok(())
    }

    /// Runs one frame through the pipeline.
    ///
    /// The mode is sampled once up front. Segmentation without a
    /// temperature plane falls back to normal mode. On error the frame's
    /// byte size is left at whatever the failing stage set (0 for an
    /// unsupported conversion) and nothing should be presented.
    #[instrument(skip_all, fields(sequence = frame.sequence))]
    pub fn process_frame(&mut self, frame: &mut StreamFrame, now: Instant) -> Result<RenderedFrame<'_>> {
        if !self.buffers.is_initialized() {
            return Err(PipelineError::NotInitialized);
        }

        let requested = self.mode.current();
        let fps = self.fps.tick(now);

        // The plane is moved out so the frame's descriptions stay writable.
        let temp_plane = match requested {
            FrameMode::Segmentation => frame.temp_frame.take(),
            FrameMode::Normal => None,
        };
        let processed = match temp_plane.as_deref() {
            Some(plane) => self.process_segmentation(frame, plane),
            None => {
                if requested == FrameMode::Segmentation {
                    debug!("No temperature plane, rendering normally");
                }
                self.process_normal(frame)
            }
        };
        if temp_plane.is_some() {
            frame.temp_frame = temp_plane;
        }
        let processed = processed?;

        let extremes = self
            .extremes
            .as_ref()
            .and_then(|source| source.frame_extremes())
            .map(|e| (e.max.celsius(), e.min.celsius()));

        let show_bar = processed.pseudo_color && self.config.color_bar.is_some();
        if show_bar {
            self.refresh_color_bar(processed.format)?;
        }
        let labels: Vec<TemperatureLabel> = match (show_bar, self.config.color_bar, extremes) {
            (true, Some(config), Some((max, min))) => temperature_labels(&config, max, min),
            _ => Vec::new(),
        };

        debug!(
            mode = ?processed.mode,
            width = processed.width,
            height = processed.height,
            byte_size = processed.byte_size,
            fps,
            "Frame processed"
        );

        let data = self.buffers.output()?.bytes_prefix(processed.byte_size)?;
        Ok(RenderedFrame {
            data,
            width: processed.width,
            height: processed.height,
            byte_size: processed.byte_size,
            format: processed.format,
            mode: processed.mode,
            sequence: frame.sequence,
            fps,
            extremes_celsius: extremes,
            color_bar: if show_bar { self.color_bar.as_ref() } else { None },
            labels,
            segmentation: processed.segmentation,
        })
    }
}
