//! Temperature segmentation
//!
//! Renders only the pixels whose true temperature falls inside the
//! configured band. The intensity stretch needs the min/max over in-band
//! pixels only, so the stage runs in two passes: classify every pixel,
//! then build and colorize the masked plane. The result is a BGR888 frame
//! at the temperature plane's resolution with every pixel whose masked
//! intensity is 0 set to literal black. That covers every out-of-band
//! pixel and the coldest in-band one.

use tracing::debug;

use crate::image_pipeline::buffers::ScratchBuffers;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::{OutputFormat, Y14_MAX, Y14_MID};
use crate::image_pipeline::temperature::{TempCode64, TemperatureBand};
use crate::image_pipeline::vendor::{
    ColorTable, ColorspaceConverter, PlaneDims, Point, PseudoColorMapper, TemperatureLookup,
};

/// Output format of a segmented frame.
pub const SEGMENTATION_OUTPUT: OutputFormat = OutputFormat::Bgr888;

/// Diagnostics of one segmentation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationStats {
    pub band: TemperatureBand,
    pub total_pixels: usize,
    pub in_band_pixels: usize,
    /// Coldest and hottest in-band reading.
    pub temperature_range: Option<(TempCode64, TempCode64)>,
    /// Raw intensity range that was stretched onto the full Y14 range.
    pub intensity_range: Option<(u16, u16)>,
}

impl SegmentationStats {
    pub fn in_band_percent(&self) -> f32 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        self.in_band_pixels as f32 * 100.0 / self.total_pixels as f32
    }

    /// Byte size of the segmented frame.
    pub fn byte_size(&self) -> usize {
        self.total_pixels * SEGMENTATION_OUTPUT.bytes_per_pixel()
    }
}

/// Pass 1 result. `in_band[i]` is true when pixel `i` resolved to a
/// temperature inside the band.
struct Classification {
    in_band: Vec<bool>,
    count: usize,
    temperature_range: Option<(TempCode64, TempCode64)>,
    intensity_range: Option<(u16, u16)>,
}

fn widen<T: Copy + Ord>(range: Option<(T, T)>, value: T) -> Option<(T, T)> {
    Some(match range {
        None => (value, value),
        Some((min, max)) => (min.min(value), max.max(value)),
    })
}

fn classify<L: TemperatureLookup>(
    lookup: &L,
    plane: &[u16],
    dims: PlaneDims,
    band: TemperatureBand,
) -> Classification {
    let mut classification = Classification {
        in_band: Vec::with_capacity(plane.len()),
        count: 0,
        temperature_range: None,
        intensity_range: None,
    };

    for y in 0..dims.height {
        for x in 0..dims.width {
            let intensity = plane[y * dims.width + x];
            // A failed lookup counts as background.
            let code = lookup
                .point_temperature(plane, dims, Point { x, y })
                .filter(|code| band.contains(code.celsius()));

            classification.in_band.push(code.is_some());
            if let Some(code) = code {
                classification.count += 1;
                classification.temperature_range = widen(classification.temperature_range, code);
                classification.intensity_range = widen(classification.intensity_range, intensity);
            }
        }
    }
    classification
}

/// Linear stretch of `value` from `[min, max]` onto `[0, 16383]` in single
/// precision, truncated. Can land one above the integer stretch used by
/// enhancement.
fn stretch_in_band(value: u16, min: u16, max: u16) -> u16 {
    let span = (max - min) as f32;
    ((value.saturating_sub(min)) as f32 / span * Y14_MAX as f32).min(Y14_MAX as f32) as u16
}

/// Pass 2: in-band pixels stretched onto `[0, 16383]` (or the mid-point
/// when they all share one value), everything else 0.
fn build_masked_plane(plane: &[u16], classification: &Classification, dst: &mut [u16]) {
    let stretch = |value: u16| match classification.intensity_range {
        Some((min, max)) if min < max => stretch_in_band(value, min, max),
        _ => Y14_MID,
    };
    for ((out, &value), &in_band) in dst.iter_mut().zip(plane).zip(&classification.in_band) {
        *out = if in_band { stretch(value) } else { 0 };
    }
}

/// Segments `plane` and leaves the BGR888 result in the output buffer.
///
/// `plane` is both the intensity source and the input of the per-point
/// temperature lookup. The buffers must be large enough for the plane's
/// resolution at three bytes per pixel.
pub fn segment_by_temperature<V, L>(
    vendor: &V,
    lookup: &L,
    plane: &[u16],
    dims: PlaneDims,
    band: TemperatureBand,
    buffers: &mut ScratchBuffers,
) -> Result<SegmentationStats>
where
    V: PseudoColorMapper + ColorspaceConverter,
    L: TemperatureLookup,
{
    let pixels = dims.width * dims.height;
    if dims.width == 0 || dims.height == 0 {
        return Err(PipelineError::InvalidDimensions(dims.width, dims.height));
    }
    if plane.len() < pixels {
        return Err(PipelineError::BufferTooSmall {
            needed: pixels * 2,
            available: plane.len() * 2,
        });
    }
    let plane = &plane[..pixels];

    let classification = classify(lookup, plane, dims, band);

    let (output, scratch) = buffers.roles_mut()?;
    let rgb_len = pixels * 3;

    let masked = scratch.words_prefix_mut(pixels)?;
    build_masked_plane(plane, &classification, masked);
    // The masked plane is overwritten by the RGB stage below.
    let background: Vec<bool> = masked.iter().map(|&value| value == 0).collect();

    vendor.map_to_yuyv(masked, ColorTable::BgrOrdered, output.bytes_prefix_mut(pixels * 2)?)?;
    vendor.yuv422_to_rgb(output.bytes_prefix(pixels * 2)?, scratch.bytes_prefix_mut(rgb_len)?)?;
    let bgr = output.bytes_prefix_mut(rgb_len)?;
    vendor.rgb_to_bgr(scratch.bytes_prefix(rgb_len)?, bgr)?;

    for (pixel, &black) in bgr.chunks_exact_mut(3).zip(&background) {
        if black {
            pixel.fill(0);
        }
    }

    let stats = SegmentationStats {
        band,
        total_pixels: pixels,
        in_band_pixels: classification.count,
        temperature_range: classification.temperature_range,
        intensity_range: classification.intensity_range,
    };
    debug!(
        in_band = stats.in_band_pixels,
        total = stats.total_pixels,
        percent = stats.in_band_percent(),
        min_celsius = stats.temperature_range.map(|(min, _)| min.celsius()),
        max_celsius = stats.temperature_range.map(|(_, max)| max.celsius()),
        intensity_range = ?stats.intensity_range,
        "Segmentation complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::vendor::{PlaneTemperatureLookup, SoftwareIrProcessor};

    const DIMS: PlaneDims = PlaneDims { width: 4, height: 3 };

    fn code(celsius: f32) -> u16 {
        TempCode64::from_celsius(celsius).0
    }

    fn buffers() -> ScratchBuffers {
        let mut buffers = ScratchBuffers::new();
        buffers.initialize(DIMS.width, DIMS.height).unwrap();
        buffers
    }

    fn output_pixels(buffers: &ScratchBuffers) -> Vec<[u8; 3]> {
        buffers.output().unwrap().bytes()[..DIMS.width * DIMS.height * 3]
            .chunks_exact(3)
            .map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    fn scene() -> (Vec<u16>, Vec<bool>) {
        let celsius = [
            20.0, 29.0, 31.5, 45.0, //
            -5.0, 36.6, 39.9, 41.0, //
            27.9, 28.05, 39.95, 100.0,
        ];
        let plane = celsius.iter().map(|&c| code(c)).collect();
        let expected = celsius.iter().map(|&c| (28.0..=40.0).contains(&c)).collect();
        (plane, expected)
    }

    #[test]
    fn test_only_in_band_pixels_are_colored() {
        let (plane, mut expected) = scene();
        let in_band = expected.iter().filter(|&&b| b).count();
        // 28.05 °C is the coldest in-band reading, it stretches to 0.
        expected[9] = false;
        let mut buffers = buffers();

        let stats = segment_by_temperature(
            &SoftwareIrProcessor::new(),
            &PlaneTemperatureLookup,
            &plane,
            DIMS,
            TemperatureBand::HUMAN,
            &mut buffers,
        )
        .unwrap();

        assert_eq!(stats.in_band_pixels, in_band);
        assert_eq!(stats.total_pixels, 12);
        assert_eq!(stats.byte_size(), 36);
        for (i, (pixel, in_band)) in output_pixels(&buffers).iter().zip(&expected).enumerate() {
            if *in_band {
                assert_ne!(pixel, &[0, 0, 0], "pixel {i} rendered black");
            } else {
                assert_eq!(pixel, &[0, 0, 0], "pixel {i} not black");
            }
        }
    }

    #[test]
    fn test_in_band_range_is_stretched_to_full_scale() {
        let (plane, _) = scene();
        let classification = classify(&PlaneTemperatureLookup, &plane, DIMS, TemperatureBand::HUMAN);
        let mut masked = vec![0u16; plane.len()];
        build_masked_plane(&plane, &classification, &mut masked);

        assert_eq!(classification.intensity_range, Some((code(28.05), code(39.95))));
        assert_eq!(masked[9], 0);
        assert_eq!(masked[10], Y14_MAX);
        // Out-of-band pixels
        assert_eq!(masked[0], 0);
        assert_eq!(masked[11], 0);
        assert!(masked[5] > 0 && masked[5] < Y14_MAX);
    }

    #[test]
    fn test_coldest_in_band_pixel_is_black() {
        let plane: Vec<u16> = [10.0, 30.0, 35.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0]
            .iter()
            .map(|&c| code(c))
            .collect();
        let mut buffers = buffers();

        let stats = segment_by_temperature(
            &SoftwareIrProcessor::new(),
            &PlaneTemperatureLookup,
            &plane,
            DIMS,
            TemperatureBand::HUMAN,
            &mut buffers,
        )
        .unwrap();

        assert_eq!(stats.in_band_pixels, 2);
        let pixels = output_pixels(&buffers);
        assert_eq!(pixels[0], [0, 0, 0]);
        assert_eq!(pixels[1], [0, 0, 0]);
        assert_ne!(pixels[2], [0, 0, 0]);
    }

    #[test]
    fn test_stretch_uses_single_precision() {
        assert_eq!(stretch_in_band(14406, 11000, 14500), 15943);
        assert_eq!(stretch_in_band(11000, 11000, 14500), 0);
        assert_eq!(stretch_in_band(14500, 11000, 14500), Y14_MAX);
    }

    #[test]
    fn test_single_valued_band_maps_to_mid_point() {
        let plane = vec![code(33.0); 12];
        let classification = classify(&PlaneTemperatureLookup, &plane, DIMS, TemperatureBand::HUMAN);
        let mut masked = vec![0u16; 12];
        build_masked_plane(&plane, &classification, &mut masked);
        assert!(masked.iter().all(|&v| v == Y14_MID));
    }

    #[test]
    fn test_failed_lookup_is_background() {
        let plane = vec![code(36.0); 12];
        let lookup = |plane: &[u16], dims: PlaneDims, point: Point| {
            if point.x == 0 {
                None
            } else {
                PlaneTemperatureLookup.point_temperature(plane, dims, point)
            }
        };
        let mut buffers = buffers();

        let stats = segment_by_temperature(
            &SoftwareIrProcessor::new(),
            &lookup,
            &plane,
            DIMS,
            TemperatureBand::HUMAN,
            &mut buffers,
        )
        .unwrap();

        assert_eq!(stats.in_band_pixels, 9);
        let pixels = output_pixels(&buffers);
        for (i, pixel) in pixels.iter().enumerate() {
            assert_eq!(*pixel == [0, 0, 0], i % DIMS.width == 0, "pixel {i}");
        }
    }

    #[test]
    fn test_nothing_in_band_renders_black_frame() {
        let plane = vec![code(10.0); 12];
        let mut buffers = buffers();
        let stats = segment_by_temperature(
            &SoftwareIrProcessor::new(),
            &PlaneTemperatureLookup,
            &plane,
            DIMS,
            TemperatureBand::HUMAN,
            &mut buffers,
        )
        .unwrap();

        assert_eq!(stats.in_band_pixels, 0);
        assert_eq!(stats.temperature_range, None);
        assert_eq!(stats.in_band_percent(), 0.0);
        assert!(output_pixels(&buffers).iter().all(|px| px == &[0, 0, 0]));
    }

    #[test]
    fn test_plane_larger_than_buffers_is_rejected() {
        let dims = PlaneDims { width: 8, height: 8 };
        let plane = vec![code(30.0); 64];
        let mut buffers = buffers();
        let result = segment_by_temperature(
            &SoftwareIrProcessor::new(),
            &PlaneTemperatureLookup,
            &plane,
            dims,
            TemperatureBand::HUMAN,
            &mut buffers,
        );
        assert!(matches!(result, Err(PipelineError::BufferTooSmall { .. })));
    }
}
