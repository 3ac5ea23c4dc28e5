use tracing::{debug, warn};

use crate::image_pipeline::buffers::ScratchBuffers;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::conversions::enhance::{enhance, Enhancement};
use crate::image_pipeline::conversions::route::{
    ConversionRoute, IntensitySource, IntensityTarget, PackedTarget, PseudoTarget,
};
use crate::image_pipeline::frame::FrameInfo;
use crate::image_pipeline::vendor::{ColorTable, ColorspaceConverter, PseudoColorMapper};

/// Summary of one successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub route: ConversionRoute,
    pub enhancement: Option<Enhancement>,
    pub byte_size: usize,
}

/// Converts a raw visual plane into the output buffer of `buffers`.
///
/// `info.byte_size` is reset on every call and only set to
/// `width * height * bpp(output)` once the whole route has succeeded; an
/// unsupported combination leaves it at 0.
pub fn convert_frame<V>(
    vendor: &V,
    raw: &[u16],
    info: &mut FrameInfo,
    buffers: &mut ScratchBuffers,
) -> Result<ConversionReport>
where
    V: PseudoColorMapper + ColorspaceConverter,
{
    info.byte_size = 0;

    let route = ConversionRoute::resolve(info).inspect_err(|e| warn!("{}", e))?;

    let pixels = info.pixel_count();
    if raw.len() < pixels {
        return Err(PipelineError::BufferTooSmall {
            needed: pixels * 2,
            available: raw.len() * 2,
        });
    }
    let raw = &raw[..pixels];

    let enhancement = match route {
        ConversionRoute::Intensity { source, target } => {
            let enhancement = prepare_intensity(vendor, raw, source, info.enhance, buffers)?;
            run_intensity(vendor, target, pixels, buffers)?;
            Some(enhancement)
        }
        ConversionRoute::PseudoColor { source, target } => {
            let enhancement = prepare_intensity(vendor, raw, source, info.enhance, buffers)?;
            run_pseudo_color(vendor, target, pixels, buffers)?;
            Some(enhancement)
        }
        ConversionRoute::Packed(target) => {
            run_packed(vendor, target, bytemuck::cast_slice(raw), buffers)?;
            None
        }
    };

    let byte_size = pixels * route.output_format().bytes_per_pixel();
    info.byte_size = byte_size;
    debug!(?route, ?enhancement, byte_size, "Frame converted");

    Ok(ConversionReport {
        route,
        enhancement,
        byte_size,
    })
}

/// Leaves the (possibly enhanced) Y14 plane in the scratch buffer.
fn prepare_intensity<V: ColorspaceConverter>(
    vendor: &V,
    raw: &[u16],
    source: IntensitySource,
    enabled: bool,
    buffers: &mut ScratchBuffers,
) -> Result<Enhancement> {
    let pixels = raw.len();
    let (output, scratch) = buffers.roles_mut()?;
    match source {
        IntensitySource::Y14 => enhance(raw, scratch.words_prefix_mut(pixels)?, enabled),
        IntensitySource::Y16 => {
            let y14 = output.words_prefix_mut(pixels)?;
            vendor.y16_to_y14(raw, y14)?;
            enhance(y14, scratch.words_prefix_mut(pixels)?, enabled)
        }
    }
}

fn run_intensity<V: ColorspaceConverter>(
    vendor: &V,
    target: IntensityTarget,
    pixels: usize,
    buffers: &mut ScratchBuffers,
) -> Result<()> {
    let (output, scratch) = buffers.roles_mut()?;
    let y14 = scratch.words_prefix(pixels)?;

    let result_in_scratch = match target {
        IntensityTarget::Y14 => true,
        IntensityTarget::Yuv444 => {
            vendor.y14_to_yuv444(y14, output.bytes_prefix_mut(pixels * 3)?)?;
            false
        }
        IntensityTarget::Yuv422 => {
            vendor.y14_to_yuv444(y14, output.bytes_prefix_mut(pixels * 3)?)?;
            vendor.yuv444_to_yuv422(
                output.bytes_prefix(pixels * 3)?,
                scratch.bytes_prefix_mut(pixels * 2)?,
            )?;
            true
        }
        IntensityTarget::Rgb888 => {
            vendor.y14_to_rgb(y14, output.bytes_prefix_mut(pixels * 3)?)?;
            false
        }
        IntensityTarget::Bgr888 => {
            vendor.y14_to_rgb(y14, output.bytes_prefix_mut(pixels * 3)?)?;
            vendor.rgb_to_bgr(
                output.bytes_prefix(pixels * 3)?,
                scratch.bytes_prefix_mut(pixels * 3)?,
            )?;
            true
        }
    };

    if result_in_scratch {
        buffers.swap_roles()?;
    }
    Ok(())
}

fn run_pseudo_color<V>(
    vendor: &V,
    target: PseudoTarget,
    pixels: usize,
    buffers: &mut ScratchBuffers,
) -> Result<()>
where
    V: PseudoColorMapper + ColorspaceConverter,
{
    let table = match target {
        PseudoTarget::Bgr888 => ColorTable::BgrOrdered,
        PseudoTarget::Yuv422 | PseudoTarget::Yuv444 | PseudoTarget::Rgb888 => ColorTable::RgbOrdered,
    };

    let (output, scratch) = buffers.roles_mut()?;
    vendor.map_to_yuyv(
        scratch.words_prefix(pixels)?,
        table,
        output.bytes_prefix_mut(pixels * 2)?,
    )?;
    let yuyv_len = pixels * 2;

    let result_in_scratch = match target {
        PseudoTarget::Yuv422 => false,
        PseudoTarget::Yuv444 => {
            vendor.yuv422_to_yuv444(output.bytes_prefix(yuyv_len)?, scratch.bytes_prefix_mut(pixels * 3)?)?;
            true
        }
        PseudoTarget::Rgb888 => {
            vendor.yuv422_to_rgb(output.bytes_prefix(yuyv_len)?, scratch.bytes_prefix_mut(pixels * 3)?)?;
            true
        }
        PseudoTarget::Bgr888 => {
            vendor.yuv422_to_rgb(output.bytes_prefix(yuyv_len)?, scratch.bytes_prefix_mut(pixels * 3)?)?;
            vendor.rgb_to_bgr(scratch.bytes_prefix(pixels * 3)?, output.bytes_prefix_mut(pixels * 3)?)?;
            false
        }
    };

    if result_in_scratch {
        buffers.swap_roles()?;
    }
    Ok(())
}

fn run_packed<V: ColorspaceConverter>(
    vendor: &V,
    target: PackedTarget,
    yuyv: &[u8],
    buffers: &mut ScratchBuffers,
) -> Result<()> {
    let pixels = yuyv.len() / 2;
    let (output, scratch) = buffers.roles_mut()?;
    match target {
        PackedTarget::Yuv422 => output.bytes_prefix_mut(yuyv.len())?.copy_from_slice(yuyv),
        PackedTarget::Rgb888 => vendor.yuv422_to_rgb(yuyv, output.bytes_prefix_mut(pixels * 3)?)?,
        PackedTarget::Bgr888 => {
            vendor.yuv422_to_rgb(yuyv, scratch.bytes_prefix_mut(pixels * 3)?)?;
            vendor.rgb_to_bgr(scratch.bytes_prefix(pixels * 3)?, output.bytes_prefix_mut(pixels * 3)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::image_pipeline::frame::{InputFormat, OutputFormat, Y14_MAX};
    use crate::image_pipeline::vendor::SoftwareIrProcessor;

    const W: usize = 6;
    const H: usize = 4;

    struct RecordingVendor {
        inner: SoftwareIrProcessor,
        tables: RefCell<Vec<ColorTable>>,
    }

    impl RecordingVendor {
        fn new() -> Self {
            Self {
                inner: SoftwareIrProcessor::new(),
                tables: RefCell::new(Vec::new()),
            }
        }
    }

    impl PseudoColorMapper for RecordingVendor {
        fn map_to_yuyv(&self, src: &[u16], table: ColorTable, dst: &mut [u8]) -> Result<()> {
            self.tables.borrow_mut().push(table);
            self.inner.map_to_yuyv(src, table, dst)
        }
    }

    impl ColorspaceConverter for RecordingVendor {
        fn y16_to_y14(&self, src: &[u16], dst: &mut [u16]) -> Result<()> {
            self.inner.y16_to_y14(src, dst)
        }
        fn y14_to_yuv444(&self, src: &[u16], dst: &mut [u8]) -> Result<()> {
            self.inner.y14_to_yuv444(src, dst)
        }
        fn y14_to_rgb(&self, src: &[u16], dst: &mut [u8]) -> Result<()> {
            self.inner.y14_to_rgb(src, dst)
        }
        fn yuv444_to_yuv422(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
            self.inner.yuv444_to_yuv422(src, dst)
        }
        fn yuv422_to_yuv444(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
            self.inner.yuv422_to_yuv444(src, dst)
        }
        fn yuv422_to_rgb(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
            self.inner.yuv422_to_rgb(src, dst)
        }
        fn rgb_to_bgr(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
            self.inner.rgb_to_bgr(src, dst)
        }
    }

    fn gradient() -> Vec<u16> {
        (0..(W * H) as u16).map(|i| 2000 + i * 300).collect()
    }

    fn buffers() -> ScratchBuffers {
        let mut buffers = ScratchBuffers::new();
        buffers.initialize(W, H).unwrap();
        buffers
    }

    fn output_bytes(buffers: &ScratchBuffers, len: usize) -> Vec<u8> {
        buffers.output().unwrap().bytes()[..len].to_vec()
    }

    #[test]
    fn test_byte_size_matches_output_format_for_every_supported_route() {
        let vendor = SoftwareIrProcessor::new();
        let raw = gradient();
        let outputs = [
            OutputFormat::Y14,
            OutputFormat::Yuv444,
            OutputFormat::Yuv422,
            OutputFormat::Rgb888,
            OutputFormat::Bgr888,
        ];

        for input in [InputFormat::Y14, InputFormat::Y16, InputFormat::Yuv422] {
            for output in outputs {
                for pseudo in [false, true] {
                    let mut info = FrameInfo::new(W, H)
                        .with_input(input)
                        .with_output(output)
                        .with_pseudo_color(pseudo);
                    let mut buffers = buffers();
                    match convert_frame(&vendor, &raw, &mut info, &mut buffers) {
                        Ok(report) => {
                            assert_eq!(info.byte_size, W * H * output.bytes_per_pixel());
                            assert_eq!(report.byte_size, info.byte_size);
                        }
                        Err(PipelineError::UnsupportedConversion { .. }) => {
                            assert_eq!(info.byte_size, 0, "{input:?} {output:?} {pseudo}");
                        }
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_packed_input_to_intensity_reports_zero_size() {
        let vendor = SoftwareIrProcessor::new();
        let mut buffers = buffers();
        for output in [OutputFormat::Y14, OutputFormat::Yuv444] {
            let mut info = FrameInfo::new(W, H)
                .with_input(InputFormat::Yuv422)
                .with_output(output);
            info.byte_size = 123;

            let result = convert_frame(&vendor, &gradient(), &mut info, &mut buffers);
            assert!(matches!(result, Err(PipelineError::UnsupportedConversion { .. })));
            assert_eq!(info.byte_size, 0);
        }
    }

    #[test]
    fn test_y14_passthrough_without_enhancement_copies_plane() {
        let vendor = SoftwareIrProcessor::new();
        let raw = gradient();
        let mut buffers = buffers();
        let mut info = FrameInfo::new(W, H).with_output(OutputFormat::Y14).with_pseudo_color(false);

        let report = convert_frame(&vendor, &raw, &mut info, &mut buffers).unwrap();

        assert_eq!(report.enhancement, Some(Enhancement::Disabled));
        assert_eq!(&buffers.output().unwrap().words()[..W * H], raw.as_slice());
    }

    #[test]
    fn test_enhanced_y14_spans_full_range() {
        let vendor = SoftwareIrProcessor::new();
        let raw = gradient();
        let mut buffers = buffers();
        let mut info = FrameInfo::new(W, H)
            .with_output(OutputFormat::Y14)
            .with_pseudo_color(false)
            .with_enhance(true);

        convert_frame(&vendor, &raw, &mut info, &mut buffers).unwrap();

        let plane = &buffers.output().unwrap().words()[..W * H];
        assert_eq!(plane[0], 0);
        assert_eq!(plane[W * H - 1], Y14_MAX);
    }

    #[test]
    fn test_y16_input_is_down_converted() {
        let vendor = SoftwareIrProcessor::new();
        let raw: Vec<u16> = gradient().iter().map(|v| v << 2).collect();
        let mut buffers = buffers();
        let mut info = FrameInfo::new(W, H)
            .with_input(InputFormat::Y16)
            .with_output(OutputFormat::Y14)
            .with_pseudo_color(false);

        convert_frame(&vendor, &raw, &mut info, &mut buffers).unwrap();

        assert_eq!(&buffers.output().unwrap().words()[..W * H], gradient().as_slice());
    }

    #[test]
    fn test_grayscale_bgr_is_swapped_rgb() {
        let vendor = SoftwareIrProcessor::new();
        let raw = gradient();
        let len = W * H * 3;

        let mut rgb_buffers = buffers();
        let mut info = FrameInfo::new(W, H).with_output(OutputFormat::Rgb888).with_pseudo_color(false);
        convert_frame(&vendor, &raw, &mut info, &mut rgb_buffers).unwrap();

        let mut bgr_buffers = buffers();
        let mut info = FrameInfo::new(W, H).with_output(OutputFormat::Bgr888).with_pseudo_color(false);
        convert_frame(&vendor, &raw, &mut info, &mut bgr_buffers).unwrap();

        let rgb = output_bytes(&rgb_buffers, len);
        let bgr = output_bytes(&bgr_buffers, len);
        for (a, b) in rgb.chunks_exact(3).zip(bgr.chunks_exact(3)) {
            assert_eq!([a[2], a[1], a[0]], [b[0], b[1], b[2]]);
        }
    }

    #[test]
    fn test_pseudo_color_table_follows_output_order() {
        let raw = gradient();
        let cases = [
            (OutputFormat::Rgb888, ColorTable::RgbOrdered),
            (OutputFormat::Yuv422, ColorTable::RgbOrdered),
            (OutputFormat::Yuv444, ColorTable::RgbOrdered),
            (OutputFormat::Bgr888, ColorTable::BgrOrdered),
        ];
        for (output, table) in cases {
            let vendor = RecordingVendor::new();
            let mut buffers = buffers();
            let mut info = FrameInfo::new(W, H).with_output(output);
            convert_frame(&vendor, &raw, &mut info, &mut buffers).unwrap();
            assert_eq!(vendor.tables.borrow().as_slice(), &[table]);
        }
    }

    #[test]
    fn test_packed_yuv422_passthrough() {
        let vendor = SoftwareIrProcessor::new();
        let raw: Vec<u16> = (0..(W * H) as u16).map(|i| 0x8000 | i).collect();
        let mut buffers = buffers();
        let mut info = FrameInfo::new(W, H)
            .with_input(InputFormat::Yuv422)
            .with_output(OutputFormat::Yuv422);

        convert_frame(&vendor, &raw, &mut info, &mut buffers).unwrap();

        let expected: &[u8] = bytemuck::cast_slice(&raw);
        assert_eq!(output_bytes(&buffers, W * H * 2), expected);
    }

    #[test]
    fn test_uninitialized_buffers_are_reported() {
        let vendor = SoftwareIrProcessor::new();
        let mut buffers = ScratchBuffers::new();
        let mut info = FrameInfo::new(W, H);
        let result = convert_frame(&vendor, &gradient(), &mut info, &mut buffers);
        assert!(matches!(result, Err(PipelineError::NotInitialized)));
        assert_eq!(info.byte_size, 0);
    }

    #[test]
    fn test_short_raw_plane_is_rejected() {
        let vendor = SoftwareIrProcessor::new();
        let mut buffers = buffers();
        let mut info = FrameInfo::new(W, H);
        let result = convert_frame(&vendor, &[0u16; 3], &mut info, &mut buffers);
        assert!(matches!(result, Err(PipelineError::BufferTooSmall { .. })));
    }
}
