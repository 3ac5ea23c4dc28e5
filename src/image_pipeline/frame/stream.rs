use std::time::Instant;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::types::FrameInfo;

/// Stream parameters reported by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraParams {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
}

/// One acquisition slot: the visual plane, the optional temperature plane
/// and their descriptions.
///
/// A single `StreamFrame` circulates between the acquisition and render
/// roles; whoever holds it by value is the only side allowed to touch it.
#[derive(Debug, Clone)]
pub struct StreamFrame {
    pub image_info: FrameInfo,
    pub temp_info: FrameInfo,
    /// Visual plane, one 16-bit word per pixel (Y14, Y16 or a YUYV pair).
    pub image_frame: Vec<u16>,
    /// Temperature plane in 1/64 K codes, when the camera provides one.
    pub temp_frame: Option<Vec<u16>>,
    pub camera_params: Option<CameraParams>,
    pub sequence: u64,
    pub captured_at: Option<Instant>,
}

impl StreamFrame {
    /// Allocates zeroed planes for the given descriptions.
    pub fn new(image_info: FrameInfo, temp_info: Option<FrameInfo>) -> Result<Self> {
        let image_frame = zeroed_plane(image_info.width, image_info.height)?;
        let (temp_info, temp_frame) = match temp_info {
            Some(info) => {
                let plane = zeroed_plane(info.width, info.height)?;
                (info, Some(plane))
            }
            None => (FrameInfo::new(0, 0), None),
        };

        Ok(Self {
            image_info,
            temp_info,
            image_frame,
            temp_frame,
            camera_params: None,
            sequence: 0,
            captured_at: None,
        })
    }

    pub fn image_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.image_frame)
    }

    pub fn image_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.image_frame)
    }
}

fn zeroed_plane(width: usize, height: usize) -> Result<Vec<u16>> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions(width, height));
    }
    let pixels = width
        .checked_mul(height)
        .ok_or(PipelineError::InvalidDimensions(width, height))?;

    let mut plane = Vec::new();
    plane
        .try_reserve_exact(pixels)
        .map_err(|_| PipelineError::OutOfMemory { bytes: pixels.saturating_mul(2) })?;
    plane.resize(pixels, 0);
    Ok(plane)
}
