use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::{CameraParams, FrameInfo, StreamFrame};
use crate::image_pipeline::sync::handoff::AcquisitionSide;
use crate::image_pipeline::temperature::TempCode64;

/// Anything that can fill a [`StreamFrame`] with the next camera frame.
pub trait FrameSource {
    /// Writes the next frame's planes into `frame`. Returns `false` at the
    /// end of the stream, leaving `frame` untouched.
    fn fill(&mut self, frame: &mut StreamFrame) -> Result<bool>;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn fill(&mut self, frame: &mut StreamFrame) -> Result<bool> {
        (**self).fill(frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub frames: u64,
    /// True when render closed the handoff before the source ran out.
    pub render_closed: bool,
}

/// Fills and publishes frames until the source ends or render goes away.
///
/// Sequence numbers and capture timestamps are stamped here, in
/// acquisition order. Dropping `side` on return closes the handoff.
#[instrument(skip_all)]
pub fn run_acquisition<S: FrameSource + ?Sized>(source: &mut S, side: AcquisitionSide) -> Result<AcquisitionReport> {
    let mut frames = 0u64;
    let render_closed = loop {
        let mut frame = match side.acquire() {
            Ok(frame) => frame,
            Err(PipelineError::HandoffClosed) => break true,
            Err(e) => return Err(e),
        };
        if !source.fill(&mut frame)? {
            break false;
        }

        frame.sequence = frames;
        frame.captured_at = Some(Instant::now());
        if side.publish(frame).is_err() {
            break true;
        }
        frames += 1;
    };

    info!(frames, render_closed, "Acquisition finished");
    Ok(AcquisitionReport { frames, render_closed })
}

/// Runs [`run_acquisition`] on a named thread that owns `source`.
pub fn spawn_acquisition<S>(mut source: S, side: AcquisitionSide) -> Result<JoinHandle<Result<AcquisitionReport>>>
where
    S: FrameSource + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("acquisition".to_string())
        .spawn(move || run_acquisition(&mut source, side))?;
    Ok(handle)
}

/// Synthetic camera: a cool scene with a warm blob drifting across it.
///
/// The visual plane is Y14 intensity, the temperature plane holds 1/64 K
/// codes. Inside the blob both planes peak, so segmentation with the
/// default band isolates the blob.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: usize,
    height: usize,
    fps: u32,
    frame_limit: Option<u64>,
    produced: u64,
    background_celsius: f32,
    blob_celsius: f32,
    paced: bool,
    last_fill: Option<Instant>,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(256, 192)
    }
}

impl SyntheticSource {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            fps: 25,
            frame_limit: None,
            produced: 0,
            background_celsius: 22.0,
            blob_celsius: 36.5,
            paced: false,
            last_fill: None,
        }
    }

    /// Ends the stream after `frames` frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Sleeps between frames so they arrive at the camera's frame rate.
    pub fn with_pacing(mut self, enable: bool) -> Self {
        self.paced = enable;
        self
    }

    pub fn with_temperatures(mut self, background_celsius: f32, blob_celsius: f32) -> Self {
        self.background_celsius = background_celsius;
        self.blob_celsius = blob_celsius;
        self
    }

    pub fn camera_params(&self) -> CameraParams {
        CameraParams {
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }

    /// An empty frame sized for this source, with the visual plane
    /// described by `image_info`'s formats and transforms.
    pub fn frame_template(&self, image_info: FrameInfo) -> Result<StreamFrame> {
        let image_info = FrameInfo {
            width: self.width,
            height: self.height,
            ..image_info
        };
        let mut frame = StreamFrame::new(image_info, Some(FrameInfo::new(self.width, self.height)))?;
        frame.camera_params = Some(self.camera_params());
        Ok(frame)
    }

    fn blob_center(&self) -> (usize, usize) {
        ((self.produced as usize * 4) % self.width, self.height / 2)
    }

    fn in_blob(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = self.blob_center();
        let radius = (self.height / 6).max(1);
        let (dx, dy) = (x.abs_diff(cx), y.abs_diff(cy));
        dx * dx + dy * dy <= radius * radius
    }
}

impl FrameSource for SyntheticSource {
    fn fill(&mut self, frame: &mut StreamFrame) -> Result<bool> {
        if self.frame_limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(false);
        }

        let pixels = self.width * self.height;
        if frame.image_frame.len() < pixels {
            return Err(PipelineError::Source(format!(
                "visual plane holds {} pixels, source produces {}",
                frame.image_frame.len(),
                pixels
            )));
        }

        if self.paced {
            let period = Duration::from_secs(1) / self.fps.max(1);
            if let Some(last) = self.last_fill {
                thread::sleep(period.saturating_sub(last.elapsed()));
            }
            self.last_fill = Some(Instant::now());
        }

        let background = TempCode64::from_celsius(self.background_celsius).0;
        let blob = TempCode64::from_celsius(self.blob_celsius).0;

        for y in 0..self.height {
            for x in 0..self.width {
                let warm = self.in_blob(x, y);
                // Gentle horizontal ramp so enhancement has something to stretch.
                let ramp = (x * 1024 / self.width) as u16;
                frame.image_frame[y * self.width + x] = if warm { 9000 + ramp } else { 3000 + ramp };
                if let Some(plane) = frame.temp_frame.as_mut() {
                    if let Some(code) = plane.get_mut(y * self.width + x) {
                        *code = if warm { blob } else { background };
                    }
                }
            }
        }

        debug!(frame = self.produced, center = ?self.blob_center(), "Synthetic frame generated");
        self.produced += 1;
        Ok(true)
    }
}
