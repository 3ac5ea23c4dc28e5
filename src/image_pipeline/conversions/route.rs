//! Conversion routing
//!
//! Every reachable combination of input format, output format and
//! pseudo-color flag resolves to exactly one [`ConversionRoute`]. The
//! target enums only list formats their path can produce, so an
//! unsupported combination cannot be represented past [`ConversionRoute::resolve`].

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::{FrameInfo, InputFormat, OutputFormat};

/// Intensity encodings the converter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensitySource {
    Y14,
    /// Needs a down-convert to Y14 before enhancement
    Y16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityTarget {
    Y14,
    Yuv444,
    Yuv422,
    Rgb888,
    Bgr888,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoTarget {
    Yuv422,
    Yuv444,
    Rgb888,
    Bgr888,
}

/// Outputs reachable from a packed YUYV input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedTarget {
    Yuv422,
    Rgb888,
    Bgr888,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionRoute {
    /// Grayscale rendering of the intensity plane
    Intensity {
        source: IntensitySource,
        target: IntensityTarget,
    },
    /// Intensity plane colorized through a pseudo-color table
    PseudoColor {
        source: IntensitySource,
        target: PseudoTarget,
    },
    /// Camera already delivered YUYV; pseudo-color does not apply
    Packed(PackedTarget),
}

impl ConversionRoute {
    pub fn resolve(info: &FrameInfo) -> Result<Self> {
        use OutputFormat as Out;

        let source = match info.input_format {
            InputFormat::Y14 => Some(IntensitySource::Y14),
            InputFormat::Y16 => Some(IntensitySource::Y16),
            InputFormat::Yuv422 => None,
        };

        let route = match (source, info.output_format, info.pseudo_color) {
            (Some(source), output, false) => ConversionRoute::Intensity {
                source,
                target: match output {
                    Out::Y14 => IntensityTarget::Y14,
                    Out::Yuv444 => IntensityTarget::Yuv444,
                    Out::Yuv422 => IntensityTarget::Yuv422,
                    Out::Rgb888 => IntensityTarget::Rgb888,
                    Out::Bgr888 => IntensityTarget::Bgr888,
                },
            },
            (Some(_), Out::Y14, true) => return Err(unsupported(info)),
            (Some(source), Out::Yuv422, true) => ConversionRoute::PseudoColor {
                source,
                target: PseudoTarget::Yuv422,
            },
            (Some(source), Out::Yuv444, true) => ConversionRoute::PseudoColor {
                source,
                target: PseudoTarget::Yuv444,
            },
            (Some(source), Out::Rgb888, true) => ConversionRoute::PseudoColor {
                source,
                target: PseudoTarget::Rgb888,
            },
            (Some(source), Out::Bgr888, true) => ConversionRoute::PseudoColor {
                source,
                target: PseudoTarget::Bgr888,
            },
            (None, Out::Y14 | Out::Yuv444, _) => return Err(unsupported(info)),
            (None, Out::Yuv422, _) => ConversionRoute::Packed(PackedTarget::Yuv422),
            (None, Out::Rgb888, _) => ConversionRoute::Packed(PackedTarget::Rgb888),
            (None, Out::Bgr888, _) => ConversionRoute::Packed(PackedTarget::Bgr888),
        };
        Ok(route)
    }

    pub fn output_format(&self) -> OutputFormat {
        match *self {
            ConversionRoute::Intensity { target, .. } => match target {
                IntensityTarget::Y14 => OutputFormat::Y14,
                IntensityTarget::Yuv444 => OutputFormat::Yuv444,
                IntensityTarget::Yuv422 => OutputFormat::Yuv422,
                IntensityTarget::Rgb888 => OutputFormat::Rgb888,
                IntensityTarget::Bgr888 => OutputFormat::Bgr888,
            },
            ConversionRoute::PseudoColor { target, .. } => match target {
                PseudoTarget::Yuv422 => OutputFormat::Yuv422,
                PseudoTarget::Yuv444 => OutputFormat::Yuv444,
                PseudoTarget::Rgb888 => OutputFormat::Rgb888,
                PseudoTarget::Bgr888 => OutputFormat::Bgr888,
            },
            ConversionRoute::Packed(target) => match target {
                PackedTarget::Yuv422 => OutputFormat::Yuv422,
                PackedTarget::Rgb888 => OutputFormat::Rgb888,
                PackedTarget::Bgr888 => OutputFormat::Bgr888,
            },
        }
    }
}

fn unsupported(info: &FrameInfo) -> PipelineError {
    PipelineError::UnsupportedConversion {
        input: info.input_format,
        output: info.output_format,
        pseudo_color: info.pseudo_color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUTS: [OutputFormat; 5] = [
        OutputFormat::Y14,
        OutputFormat::Yuv444,
        OutputFormat::Yuv422,
        OutputFormat::Rgb888,
        OutputFormat::Bgr888,
    ];

    #[test]
    fn test_resolved_route_preserves_output_format() {
        for input in [InputFormat::Y14, InputFormat::Y16, InputFormat::Yuv422] {
            for output in OUTPUTS {
                for pseudo in [false, true] {
                    let info = FrameInfo::new(4, 4)
                        .with_input(input)
                        .with_output(output)
                        .with_pseudo_color(pseudo);
                    if let Ok(route) = ConversionRoute::resolve(&info) {
                        assert_eq!(route.output_format(), output, "{input:?} {output:?} {pseudo}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_packed_input_cannot_produce_intensity() {
        for output in [OutputFormat::Y14, OutputFormat::Yuv444] {
            let info = FrameInfo::new(4, 4).with_input(InputFormat::Yuv422).with_output(output);
            assert!(matches!(
                ConversionRoute::resolve(&info),
                Err(PipelineError::UnsupportedConversion { .. })
            ));
        }
    }

    #[test]
    fn test_pseudo_color_y14_is_unsupported() {
        let info = FrameInfo::new(4, 4).with_output(OutputFormat::Y14).with_pseudo_color(true);
        assert!(ConversionRoute::resolve(&info).is_err());
    }

    #[test]
    fn test_y16_routes_keep_source() {
        let info = FrameInfo::new(4, 4)
            .with_input(InputFormat::Y16)
            .with_output(OutputFormat::Rgb888)
            .with_pseudo_color(false);
        assert_eq!(
            ConversionRoute::resolve(&info).unwrap(),
            ConversionRoute::Intensity {
                source: IntensitySource::Y16,
                target: IntensityTarget::Rgb888,
            }
        );
    }
}
