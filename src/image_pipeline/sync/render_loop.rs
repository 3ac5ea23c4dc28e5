use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::display::{DisplayPipeline, PipelineTimings};
use crate::image_pipeline::frame::StreamFrame;
use crate::image_pipeline::sink::{PresentationSink, SinkEvent};
use crate::image_pipeline::sync::handoff::{Received, RenderSide};
use crate::image_pipeline::vendor::{ColorspaceConverter, PseudoColorMapper, TemperatureLookup};

/// When the render loop stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderBudget {
    /// Until the source closes or the sink asks to stop
    #[default]
    Unbounded,
    /// After this many presented frames
    Frames(u64),
    /// After this much wall-clock time
    Time(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderLoopConfig {
    pub budget: RenderBudget,
    /// Longest wait for a single frame; `None` blocks indefinitely.
    pub wait_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    BudgetReached,
    SourceClosed,
    StopRequested,
    WaitTimedOut,
}

#[derive(Debug, Clone)]
pub struct RenderReport {
    pub exit: ExitReason,
    pub frames_presented: u64,
    /// Frames whose format combination has no conversion
    pub frames_skipped: u64,
    pub last_sequence: Option<u64>,
    pub last_fps: Option<f32>,
    pub elapsed: Duration,
    pub timings: PipelineTimings,
}

struct LoopState {
    started: Instant,
    presented: u64,
    skipped: u64,
    last_sequence: Option<u64>,
    last_fps: Option<f32>,
}

impl LoopState {
    fn report(self, exit: ExitReason, timings: PipelineTimings) -> RenderReport {
        RenderReport {
            exit,
            frames_presented: self.presented,
            frames_skipped: self.skipped,
            last_sequence: self.last_sequence,
            last_fps: self.last_fps,
            elapsed: self.started.elapsed(),
            timings,
        }
    }
}

enum FrameOutcome {
    Presented { events: Vec<SinkEvent>, fps: Option<f32> },
    Skipped,
}

/// Consumes frames from `side` until the budget is spent, the source
/// closes, the sink asks to stop or a wait times out.
///
/// Whatever the exit path, including errors, the pipeline's buffers are
/// released and the sink is closed before this returns. Dropping `side`
/// on return closes the handoff for acquisition.
#[instrument(skip_all, fields(budget = ?config.budget))]
pub fn run_render_loop<V, L, S>(
    pipeline: &mut DisplayPipeline<V, L>,
    sink: &mut S,
    side: RenderSide,
    config: &RenderLoopConfig,
) -> Result<RenderReport>
where
    V: PseudoColorMapper + ColorspaceConverter,
    L: TemperatureLookup,
    S: PresentationSink + ?Sized,
{
    info!("Render loop started");
    let mut state = LoopState {
        started: Instant::now(),
        presented: 0,
        skipped: 0,
        last_sequence: None,
        last_fps: None,
    };

    let outcome = render_frames(pipeline, sink, &side, config, &mut state);
    drop(side);

    pipeline.release();
    let closed = sink.close();

    let exit = outcome?;
    closed?;

    let report = state.report(exit, pipeline.take_timings());
    info!(
        exit = ?report.exit,
        presented = report.frames_presented,
        skipped = report.frames_skipped,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Render loop finished"
    );
    Ok(report)
}

/// Runs [`run_render_loop`] on a named thread owning the pipeline and sink.
///
/// The pipeline and sink come back with the report so callers can inspect
/// or reuse them.
pub fn spawn_render<V, L, S>(
    mut pipeline: DisplayPipeline<V, L>,
    mut sink: S,
    side: RenderSide,
    config: RenderLoopConfig,
) -> Result<JoinHandle<Result<(RenderReport, DisplayPipeline<V, L>, S)>>>
where
    V: PseudoColorMapper + ColorspaceConverter + Send + 'static,
    L: TemperatureLookup + Send + 'static,
    S: PresentationSink + Send + 'static,
{
    let handle = thread::Builder::new().name("render".to_string()).spawn(move || {
        let report = run_render_loop(&mut pipeline, &mut sink, side, &config)?;
        Ok((report, pipeline, sink))
    })?;
    Ok(handle)
}

fn render_frames<V, L, S>(
    pipeline: &mut DisplayPipeline<V, L>,
    sink: &mut S,
    side: &RenderSide,
    config: &RenderLoopConfig,
    state: &mut LoopState,
) -> Result<ExitReason>
where
    V: PseudoColorMapper + ColorspaceConverter,
    L: TemperatureLookup,
    S: PresentationSink + ?Sized,
{
    let switch = pipeline.mode_switch();

    loop {
        // A time budget also caps the wait so an idle source cannot
        // hold the loop past it.
        let (budget_left, timeout) = match config.budget {
            RenderBudget::Unbounded => (true, config.wait_timeout),
            RenderBudget::Frames(limit) => (state.presented < limit, config.wait_timeout),
            RenderBudget::Time(limit) => {
                let remaining = limit.saturating_sub(state.started.elapsed());
                let timeout = config.wait_timeout.map_or(remaining, |wait| wait.min(remaining));
                (!remaining.is_zero(), Some(timeout))
            }
        };
        if !budget_left {
            return Ok(ExitReason::BudgetReached);
        }

        let mut frame = match side.next_frame(timeout) {
            Received::Frame(frame) => frame,
            Received::Closed => return Ok(ExitReason::SourceClosed),
            Received::TimedOut => {
                if let RenderBudget::Time(limit) = config.budget {
                    if state.started.elapsed() >= limit {
                        return Ok(ExitReason::BudgetReached);
                    }
                }
                warn!(timeout = ?timeout, "No frame within wait timeout");
                return Ok(ExitReason::WaitTimedOut);
            }
        };

        let outcome = present_frame(pipeline, sink, &mut frame);
        let sequence = frame.sequence;
        if side.release(*frame).is_err() {
            debug!("Acquisition gone, frame not handed back");
        }

        match outcome? {
            FrameOutcome::Presented { events, fps } => {
                state.presented += 1;
                state.last_sequence = Some(sequence);
                state.last_fps = fps.or(state.last_fps);

                let mut stop = false;
                for event in events {
                    match event {
                        SinkEvent::ToggleSegmentation => {
                            let mode = switch.toggle();
                            info!(?mode, "Display mode switched");
                        }
                        SinkEvent::Stop => stop = true,
                    }
                }
                if stop {
                    info!(sequence, "Stop requested by sink");
                    return Ok(ExitReason::StopRequested);
                }
            }
            FrameOutcome::Skipped => state.skipped += 1,
        }
    }
}

fn present_frame<V, L, S>(
    pipeline: &mut DisplayPipeline<V, L>,
    sink: &mut S,
    frame: &mut StreamFrame,
) -> Result<FrameOutcome>
where
    V: PseudoColorMapper + ColorspaceConverter,
    L: TemperatureLookup,
    S: PresentationSink + ?Sized,
{
    if !pipeline.is_initialized() {
        pipeline.init(frame)?;
    }

    match pipeline.process_frame(frame, Instant::now()) {
        Ok(rendered) => {
            let fps = rendered.fps;
            let events = sink.present(&rendered)?;
            Ok(FrameOutcome::Presented { events, fps })
        }
        Err(e @ PipelineError::UnsupportedConversion { .. }) => {
            warn!(sequence = frame.sequence, error = %e, "Frame skipped");
            Ok(FrameOutcome::Skipped)
        }
        Err(e) => Err(e),
    }
}
