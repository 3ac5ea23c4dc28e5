//! Scratch buffer management
//!
//! The pipeline owns exactly two reusable frame buffers, each large enough
//! for a three-bytes-per-pixel frame at the stream resolution. They are
//! allocated once by [`ScratchBuffers::initialize`] and handed to each stage
//! by role: `output` holds the frame being built, `scratch` is the
//! intermediate a stage may write through.

use tracing::{debug, info};

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Worst-case bytes per pixel across all output formats.
pub const MAX_BYTES_PER_PIXEL: usize = 3;

/// A heap buffer addressable both as bytes and as 16-bit words.
///
/// Backed by `u16` storage so the intensity stages can use it without
/// unaligned reinterpretation.
#[derive(Debug)]
pub struct FrameBuffer {
    words: Vec<u16>,
    byte_len: usize,
}

impl FrameBuffer {
    pub fn try_alloc(byte_len: usize) -> Result<Self> {
        let word_len = byte_len.div_ceil(2);
        let mut words = Vec::new();
        words
            .try_reserve_exact(word_len)
            .map_err(|_| PipelineError::OutOfMemory { bytes: byte_len })?;
        words.resize(word_len, 0);
        Ok(Self { words, byte_len })
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u16, u8>(&self.words)[..self.byte_len]
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<u16, u8>(&mut self.words)[..self.byte_len]
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u16] {
        &mut self.words
    }

    /// First `len` bytes, or `BufferTooSmall`.
    pub fn bytes_prefix(&self, len: usize) -> Result<&[u8]> {
        self.check(len)?;
        Ok(&self.bytes()[..len])
    }

    pub fn bytes_prefix_mut(&mut self, len: usize) -> Result<&mut [u8]> {
        self.check(len)?;
        Ok(&mut self.bytes_mut()[..len])
    }

    /// First `count` words, or `BufferTooSmall`.
    pub fn words_prefix(&self, count: usize) -> Result<&[u16]> {
        self.check(count * 2)?;
        Ok(&self.words[..count])
    }

    pub fn words_prefix_mut(&mut self, count: usize) -> Result<&mut [u16]> {
        self.check(count * 2)?;
        Ok(&mut self.words[..count])
    }

    fn check(&self, needed: usize) -> Result<()> {
        if needed > self.byte_len {
            return Err(PipelineError::BufferTooSmall {
                needed,
                available: self.byte_len,
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Slots {
    width: usize,
    height: usize,
    output: FrameBuffer,
    scratch: FrameBuffer,
}

/// The pipeline's pair of process-lifetime scratch buffers.
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    slots: Option<Slots>,
}

impl ScratchBuffers {
    pub fn new() -> Self {
        Self { slots: None }
    }

    /// Allocates both buffers at `width * height * 3` bytes.
    ///
    /// Calling this again at the same resolution is a no-op. A different
    /// resolution is rejected until [`release`](Self::release) is called.
    pub fn initialize(&mut self, width: usize, height: usize) -> Result<()> {
        self.initialize_with(width, height, FrameBuffer::try_alloc)
    }

    pub(crate) fn initialize_with<F>(&mut self, width: usize, height: usize, mut alloc: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<FrameBuffer>,
    {
        if let Some(slots) = &self.slots {
            if slots.width == width && slots.height == height {
                debug!(width, height, "Scratch buffers already allocated");
                return Ok(());
            }
            return Err(PipelineError::ResolutionMismatch {
                allocated_width: slots.width,
                allocated_height: slots.height,
                width,
                height,
            });
        }

        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions(width, height));
        }
        let byte_len = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(MAX_BYTES_PER_PIXEL))
            .ok_or(PipelineError::OutOfMemory { bytes: usize::MAX })?;

        // The first buffer is dropped here if the second allocation fails.
        let output = alloc(byte_len)?;
        let scratch = alloc(byte_len)?;

        info!(width, height, bytes_each = byte_len, "Scratch buffers allocated");
        self.slots = Some(Slots {
            width,
            height,
            output,
            scratch,
        });
        Ok(())
    }

    /// Frees both buffers. Safe to call when nothing is allocated.
    pub fn release(&mut self) {
        if self.slots.take().is_some() {
            info!("Scratch buffers released");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.slots.is_some()
    }

    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.slots.as_ref().map(|s| (s.width, s.height))
    }

    /// Size of each buffer in bytes, 0 when uninitialized.
    pub fn capacity_bytes(&self) -> usize {
        self.slots.as_ref().map_or(0, |s| s.output.byte_len())
    }

    pub fn output(&self) -> Result<&FrameBuffer> {
        self.slots
            .as_ref()
            .map(|s| &s.output)
            .ok_or(PipelineError::NotInitialized)
    }

    /// Both buffers by role: `(output, scratch)`.
    pub fn roles_mut(&mut self) -> Result<(&mut FrameBuffer, &mut FrameBuffer)> {
        self.slots
            .as_mut()
            .map(|s| (&mut s.output, &mut s.scratch))
            .ok_or(PipelineError::NotInitialized)
    }

    /// Makes the scratch buffer the new output and vice versa.
    pub fn swap_roles(&mut self) -> Result<()> {
        let slots = self.slots.as_mut().ok_or(PipelineError::NotInitialized)?;
        std::mem::swap(&mut slots.output, &mut slots.scratch);
        Ok(())
    }
}
