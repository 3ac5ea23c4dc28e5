//! Geometric transforms on packed frames.
//!
//! Every transform copies from `output` into `scratch` and then swaps the
//! two roles, so the transformed frame is always in `output` afterwards.
//! Pixels are moved as opaque `bpp`-byte groups, which makes the same code
//! valid for Y14, RGB and YUV444 frames. Packed YUV422 is moved in
//! two-byte groups, so reordering pixels within a row exchanges the U and
//! V samples of each pair.

use tracing::trace;

use crate::image_pipeline::buffers::ScratchBuffers;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::{FrameInfo, MirrorFlip, Rotation};

/// Geometry of a packed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
}

impl Layout {
    pub fn byte_len(&self) -> usize {
        self.width * self.height * self.bytes_per_pixel
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.bytes_per_pixel
    }

    fn rotated(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
            ..*self
        }
    }
}

/// Horizontal mirror: column `x` becomes column `width - 1 - x`.
pub fn mirror(src: &[u8], dst: &mut [u8], layout: Layout) -> Result<()> {
    check(src, dst, layout)?;
    let bpp = layout.bytes_per_pixel;
    let (len, row_len) = (layout.byte_len(), layout.width * bpp);
    for (src_row, dst_row) in src[..len]
        .chunks_exact(row_len)
        .zip(dst[..len].chunks_exact_mut(row_len))
    {
        for (src_px, dst_px) in src_row.chunks_exact(bpp).zip(dst_row.chunks_exact_mut(bpp).rev()) {
            dst_px.copy_from_slice(src_px);
        }
    }
    Ok(())
}

/// Vertical flip: row `y` becomes row `height - 1 - y`.
pub fn flip(src: &[u8], dst: &mut [u8], layout: Layout) -> Result<()> {
    check(src, dst, layout)?;
    let (len, row_len) = (layout.byte_len(), layout.width * layout.bytes_per_pixel);
    for (src_row, dst_row) in src[..len]
        .chunks_exact(row_len)
        .zip(dst[..len].chunks_exact_mut(row_len).rev())
    {
        dst_row.copy_from_slice(src_row);
    }
    Ok(())
}

/// Quarter turn clockwise. `layout` describes the source; the result is
/// `height` wide and `width` tall.
pub fn rotate_right(src: &[u8], dst: &mut [u8], layout: Layout) -> Result<()> {
    check(src, dst, layout)?;
    let out = layout.rotated();
    let bpp = layout.bytes_per_pixel;
    for y in 0..out.height {
        for x in 0..out.width {
            let from = layout.offset(y, layout.height - 1 - x);
            let to = out.offset(x, y);
            dst[to..to + bpp].copy_from_slice(&src[from..from + bpp]);
        }
    }
    Ok(())
}

/// Quarter turn counter-clockwise.
pub fn rotate_left(src: &[u8], dst: &mut [u8], layout: Layout) -> Result<()> {
    check(src, dst, layout)?;
    let out = layout.rotated();
    let bpp = layout.bytes_per_pixel;
    for y in 0..out.height {
        for x in 0..out.width {
            let from = layout.offset(layout.width - 1 - y, x);
            let to = out.offset(x, y);
            dst[to..to + bpp].copy_from_slice(&src[from..from + bpp]);
        }
    }
    Ok(())
}

pub fn rotate_180(src: &[u8], dst: &mut [u8], layout: Layout) -> Result<()> {
    check(src, dst, layout)?;
    let bpp = layout.bytes_per_pixel;
    let len = layout.byte_len();
    for (src_px, dst_px) in src[..len]
        .chunks_exact(bpp)
        .zip(dst[..len].chunks_exact_mut(bpp).rev())
    {
        dst_px.copy_from_slice(src_px);
    }
    Ok(())
}

fn check(src: &[u8], dst: &[u8], layout: Layout) -> Result<()> {
    let needed = layout.byte_len();
    for available in [src.len(), dst.len()] {
        if available < needed {
            return Err(PipelineError::BufferTooSmall { needed, available });
        }
    }
    Ok(())
}

type Transform = fn(&[u8], &mut [u8], Layout) -> Result<()>;

fn run(buffers: &mut ScratchBuffers, transform: Transform, layout: Layout) -> Result<()> {
    let len = layout.byte_len();
    let (output, scratch) = buffers.roles_mut()?;
    transform(output.bytes_prefix(len)?, scratch.bytes_prefix_mut(len)?, layout)?;
    buffers.swap_roles()
}

/// Applies the frame's mirror/flip and then its rotation to the converted
/// frame in `output`. Returns the displayed `(width, height)`.
pub fn apply_geometry(info: &FrameInfo, buffers: &mut ScratchBuffers) -> Result<(usize, usize)> {
    let layout = Layout {
        width: info.width,
        height: info.height,
        bytes_per_pixel: info.output_format.bytes_per_pixel(),
    };

    match info.mirror_flip {
        MirrorFlip::None => {}
        MirrorFlip::Mirror => run(buffers, mirror, layout)?,
        MirrorFlip::Flip => run(buffers, flip, layout)?,
        MirrorFlip::MirrorFlip => {
            run(buffers, mirror, layout)?;
            run(buffers, flip, layout)?;
        }
    }

    let rotate: Option<Transform> = match info.rotation {
        Rotation::None => None,
        Rotation::Left90 => Some(rotate_left),
        Rotation::Right90 => Some(rotate_right),
        Rotation::Rotate180 => Some(rotate_180),
    };
    if let Some(rotate) = rotate {
        run(buffers, rotate, layout)?;
    }

    trace!(mirror_flip = ?info.mirror_flip, rotation = ?info.rotation, "Geometry applied");
    Ok(info.display_dimensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::frame::OutputFormat;

    // 3x2 single-byte pixels:
    // 1 2 3
    // 4 5 6
    const GRID: [u8; 6] = [1, 2, 3, 4, 5, 6];
    const GRID_LAYOUT: Layout = Layout {
        width: 3,
        height: 2,
        bytes_per_pixel: 1,
    };

    fn apply(transform: Transform, src: &[u8], layout: Layout) -> Vec<u8> {
        let mut dst = vec![0u8; layout.byte_len()];
        transform(src, &mut dst, layout).unwrap();
        dst
    }

    #[test]
    fn test_basic_transforms() {
        assert_eq!(apply(mirror, &GRID, GRID_LAYOUT), [3, 2, 1, 6, 5, 4]);
        assert_eq!(apply(flip, &GRID, GRID_LAYOUT), [4, 5, 6, 1, 2, 3]);
        assert_eq!(apply(rotate_180, &GRID, GRID_LAYOUT), [6, 5, 4, 3, 2, 1]);
        // 4 1
        // 5 2
        // 6 3
        assert_eq!(apply(rotate_right, &GRID, GRID_LAYOUT), [4, 1, 5, 2, 6, 3]);
        // 3 6
        // 2 5
        // 1 4
        assert_eq!(apply(rotate_left, &GRID, GRID_LAYOUT), [3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn test_quarter_turns_undo_each_other() {
        let layout = Layout {
            width: 5,
            height: 3,
            bytes_per_pixel: 3,
        };
        let src: Vec<u8> = (0..layout.byte_len() as u8).collect();
        let right = apply(rotate_right, &src, layout);
        assert_eq!(apply(rotate_left, &right, layout.rotated()), src);
    }

    #[test]
    fn test_involutions() {
        let layout = Layout {
            width: 4,
            height: 3,
            bytes_per_pixel: 2,
        };
        let src: Vec<u8> = (0..layout.byte_len() as u8).collect();
        for transform in [mirror as Transform, flip, rotate_180] {
            let once = apply(transform, &src, layout);
            assert_ne!(once, src);
            assert_eq!(apply(transform, &once, layout), src);
        }
    }

    #[test]
    fn test_pixels_move_as_whole_groups() {
        let layout = Layout {
            width: 2,
            height: 1,
            bytes_per_pixel: 3,
        };
        assert_eq!(apply(mirror, &[1, 2, 3, 4, 5, 6], layout), [4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_mirror_flip_equals_half_turn() {
        let mirrored = apply(mirror, &GRID, GRID_LAYOUT);
        assert_eq!(apply(flip, &mirrored, GRID_LAYOUT), apply(rotate_180, &GRID, GRID_LAYOUT));
    }

    #[test]
    fn test_order_of_mirror_and_rotation_matters() {
        let mirror_then_rotate = apply(rotate_right, &apply(mirror, &GRID, GRID_LAYOUT), GRID_LAYOUT);
        let rotate_then_mirror = apply(mirror, &apply(rotate_right, &GRID, GRID_LAYOUT), GRID_LAYOUT.rotated());
        assert_ne!(mirror_then_rotate, rotate_then_mirror);
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let mut dst = [0u8; 5];
        assert!(matches!(
            mirror(&GRID, &mut dst, GRID_LAYOUT),
            Err(PipelineError::BufferTooSmall { needed: 6, available: 5 })
        ));
    }

    fn load(buffers: &mut ScratchBuffers, frame: &[u8]) {
        let (output, _) = buffers.roles_mut().unwrap();
        output.bytes_prefix_mut(frame.len()).unwrap().copy_from_slice(frame);
    }

    #[test]
    fn test_apply_geometry_mirrors_before_rotating() {
        let mut buffers = ScratchBuffers::new();
        buffers.initialize(3, 2).unwrap();
        // RGB888 frame whose pixels are tagged by their index.
        let frame: Vec<u8> = (1..=6u8).flat_map(|p| [p, p, p]).collect();
        load(&mut buffers, &frame);

        let info = FrameInfo::new(3, 2)
            .with_output(OutputFormat::Rgb888)
            .with_mirror_flip(MirrorFlip::Mirror)
            .with_rotation(Rotation::Right90);

        assert_eq!(apply_geometry(&info, &mut buffers).unwrap(), (2, 3));

        // mirror: 3 2 1 / 6 5 4, then clockwise: 6 3 / 5 2 / 4 1
        let tags: Vec<u8> = buffers.output().unwrap().bytes()[..18]
            .chunks_exact(3)
            .map(|px| px[0])
            .collect();
        assert_eq!(tags, [6, 3, 5, 2, 4, 1]);
    }

    #[test]
    fn test_apply_geometry_mirror_flip_then_rotation() {
        let mut buffers = ScratchBuffers::new();
        buffers.initialize(3, 2).unwrap();
        let pixel = |p: u8| [p, p * 10, 255 - p];
        let frame: Vec<u8> = (1..=6u8).flat_map(pixel).collect();
        load(&mut buffers, &frame);

        let info = FrameInfo::new(3, 2)
            .with_output(OutputFormat::Rgb888)
            .with_mirror_flip(MirrorFlip::MirrorFlip)
            .with_rotation(Rotation::Left90);

        assert_eq!(apply_geometry(&info, &mut buffers).unwrap(), (2, 3));

        // mirror: 3 2 1 / 6 5 4, flip: 6 5 4 / 3 2 1,
        // then counter-clockwise: 4 1 / 5 2 / 6 3
        let expected: Vec<u8> = [4, 1, 5, 2, 6, 3].into_iter().flat_map(pixel).collect();
        assert_eq!(&buffers.output().unwrap().bytes()[..18], expected.as_slice());
    }

    #[test]
    fn test_identity_geometry_leaves_output_untouched() {
        let mut buffers = ScratchBuffers::new();
        buffers.initialize(3, 2).unwrap();
        load(&mut buffers, &GRID);

        let info = FrameInfo::new(3, 2).with_output(OutputFormat::Y14);
        assert_eq!(apply_geometry(&info, &mut buffers).unwrap(), (3, 2));
        assert_eq!(&buffers.output().unwrap().bytes()[..6], &GRID);
    }
}
