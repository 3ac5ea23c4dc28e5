//! Linear contrast stretch of a Y14 plane.

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::Y14_MAX;

/// What the enhancement stage did to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enhancement {
    /// Straight copy; the default while the camera is not calibrated.
    Disabled,
    /// `[min, max]` was stretched onto `[0, 16383]`.
    Stretched { min: u16, max: u16 },
    /// Every pixel had the same value; copied unchanged.
    Flat { value: u16 },
    Empty,
}

/// Smallest and largest value of a plane, `None` when it is empty.
pub fn intensity_range(plane: &[u16]) -> Option<(u16, u16)> {
    plane.iter().fold(None, |range, &value| match range {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

/// Maps `value` from `[min, max]` onto `[0, 16383]` with truncating
/// integer division. Requires `min <= value <= max` and `min < max`.
pub fn stretch_to_y14(value: u16, min: u16, max: u16) -> u16 {
    debug_assert!(min < max && (min..=max).contains(&value));
    ((value - min) as u32 * Y14_MAX as u32 / (max - min) as u32) as u16
}

/// Writes the enhanced plane into `dst`.
///
/// When enabled, the plane's actual min/max is stretched onto the full Y14
/// range; a flat plane passes through unchanged.
pub fn enhance(src: &[u16], dst: &mut [u16], enabled: bool) -> Result<Enhancement> {
    if dst.len() < src.len() {
        return Err(PipelineError::BufferTooSmall {
            needed: src.len() * 2,
            available: dst.len() * 2,
        });
    }
    let dst = &mut dst[..src.len()];

    if !enabled {
        dst.copy_from_slice(src);
        return Ok(Enhancement::Disabled);
    }

    match intensity_range(src) {
        None => Ok(Enhancement::Empty),
        Some((min, max)) if min == max => {
            dst.copy_from_slice(src);
            Ok(Enhancement::Flat { value: min })
        }
        Some((min, max)) => {
            for (out, &value) in dst.iter_mut().zip(src) {
                *out = stretch_to_y14(value, min, max);
            }
            Ok(Enhancement::Stretched { min, max })
        }
    }
}
