use std::fmt;
use std::time::{Duration, Instant};

/// Accumulated time spent in one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: &'static str,
    pub total: Duration,
    pub count: u32,
}

impl StageTiming {
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total / self.count
    }
}

/// Per-stage totals in first-seen order. Bounded by the number of stage
/// names, not by the number of frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineTimings {
    stages: Vec<StageTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_step(&mut self, name: &'static str, duration: Duration) {
        match self.stages.iter_mut().find(|s| s.name == name) {
            Some(stage) => {
                stage.total += duration;
                stage.count += 1;
            }
            None => self.stages.push(StageTiming {
                name,
                total: duration,
                count: 1,
            }),
        }
    }

    pub fn record(&mut self, timer: Timer) {
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
    }

    pub fn merge(&mut self, other: &PipelineTimings) {
        for stage in &other.stages {
            match self.stages.iter_mut().find(|s| s.name == stage.name) {
                Some(existing) => {
                    existing.total += stage.total;
                    existing.count += stage.count;
                }
                None => self.stages.push(stage.clone()),
            }
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.total).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<&StageTiming> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn steps(&self) -> &[StageTiming] {
        &self.stages
    }
}

impl fmt::Display for PipelineTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_duration();
        writeln!(f, "Pipeline Timing Summary:")?;
        writeln!(f, "{:-<72}", "")?;
        for stage in &self.stages {
            let percentage = if total.as_secs_f64() > 0.0 {
                (stage.total.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            writeln!(
                f,
                "{:<20} {:>8} calls {:>12.3}ms {:>9.3}ms avg ({:>5.1}%)",
                stage.name,
                stage.count,
                stage.total.as_secs_f64() * 1000.0,
                stage.mean().as_secs_f64() * 1000.0,
                percentage
            )?;
        }
        writeln!(f, "{:-<72}", "")?;
        write!(f, "{:<20} {:>27.3}ms", "Total", total.as_secs_f64() * 1000.0)
    }
}

pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn stop(self) -> (&'static str, Duration) {
        (self.name, self.start.elapsed())
    }
}

/// Frame rate from consecutive frame timestamps, optionally smoothed with
/// an exponential moving average.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    smoothing: f32,
    last_frame: Option<Instant>,
    fps: Option<f32>,
}

impl FrameRateMeter {
    /// `smoothing` is the weight of the newest sample; 1.0 disables
    /// averaging.
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            last_frame: None,
            fps: None,
        }
    }

    /// Records a frame at `now` and returns the current rate.
    ///
    /// Returns `None` for the first frame and whenever no time (or
    /// negative time) elapsed since the previous one.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let previous = self.last_frame.replace(now)?;
        let micros = now.checked_duration_since(previous)?.as_micros();
        if micros == 0 {
            return None;
        }

        let instant = 1_000_000.0 / micros as f32;
        let fps = match self.fps {
            Some(average) => average + self.smoothing * (instant - average),
            None => instant,
        };
        self.fps = Some(fps);
        Some(fps)
    }

    pub fn current(&self) -> Option<f32> {
        self.fps
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
        self.fps = None;
    }
}
