//! Single-slot frame handoff between the acquisition and render roles.
//!
//! One [`StreamFrame`] circulates through two capacity-1 channels:
//! acquisition fills it and sends it as "ready", render processes it and
//! sends it back as "consumed". Holding the frame by value is what gives a
//! side the right to touch it, so the two roles strictly alternate and a
//! slow render throttles acquisition. Dropping either side closes the
//! handoff for the other.

use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::trace;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::frame::StreamFrame;

/// Outcome of waiting for the next frame.
#[derive(Debug)]
pub enum Received {
    Frame(Box<StreamFrame>),
    /// Acquisition dropped its side; no more frames will arrive.
    Closed,
    TimedOut,
}

/// The acquisition role's end of the handoff.
#[derive(Debug)]
pub struct AcquisitionSide {
    free: Receiver<StreamFrame>,
    ready: Sender<StreamFrame>,
}

/// The render role's end of the handoff.
#[derive(Debug)]
pub struct RenderSide {
    ready: Receiver<StreamFrame>,
    free: Sender<StreamFrame>,
}

/// Creates a handoff around `frame`, which starts on the acquisition side.
pub fn frame_handoff(frame: StreamFrame) -> (AcquisitionSide, RenderSide) {
    let (ready_tx, ready_rx) = bounded(1);
    let (free_tx, free_rx) = bounded(1);
    // Capacity 1 and a fresh channel: the first send cannot block or fail.
    let _ = free_tx.send(frame);

    (
        AcquisitionSide {
            free: free_rx,
            ready: ready_tx,
        },
        RenderSide {
            ready: ready_rx,
            free: free_tx,
        },
    )
}

impl AcquisitionSide {
    /// Blocks until render has handed the frame back.
    pub fn acquire(&self) -> Result<StreamFrame> {
        self.free.recv().map_err(|_| PipelineError::HandoffClosed)
    }

    /// Signals "frame ready" and gives up the frame until it comes back.
    pub fn publish(&self, frame: StreamFrame) -> Result<()> {
        trace!(sequence = frame.sequence, "Frame ready");
        self.ready.send(frame).map_err(|_| PipelineError::HandoffClosed)
    }
}

impl RenderSide {
    /// Waits for the next ready frame; `None` waits without a bound.
    pub fn next_frame(&self, timeout: Option<Duration>) -> Received {
        let frame = match timeout {
            None => self.ready.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(timeout) => self.ready.recv_timeout(timeout),
        };
        match frame {
            Ok(frame) => Received::Frame(Box::new(frame)),
            Err(RecvTimeoutError::Disconnected) => Received::Closed,
            Err(RecvTimeoutError::Timeout) => Received::TimedOut,
        }
    }

    /// Signals "frame consumed" and returns the frame to acquisition.
    pub fn release(&self, frame: StreamFrame) -> Result<()> {
        trace!(sequence = frame.sequence, "Frame consumed");
        self.free.send(frame).map_err(|_| PipelineError::HandoffClosed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::image_pipeline::frame::FrameInfo;

    fn frame() -> StreamFrame {
        StreamFrame::new(FrameInfo::new(2, 2), None).unwrap()
    }

    #[test]
    fn test_frame_alternates_between_sides() {
        let (acquisition, render) = frame_handoff(frame());

        let mut slot = acquisition.acquire().unwrap();
        slot.sequence = 1;
        acquisition.publish(slot).unwrap();

        let Received::Frame(received) = render.next_frame(None) else {
            panic!("expected a frame");
        };
        assert_eq!(received.sequence, 1);
        render.release(*received).unwrap();

        assert_eq!(acquisition.acquire().unwrap().sequence, 1);
    }

    #[test]
    fn test_render_times_out_without_frames() {
        let (_acquisition, render) = frame_handoff(frame());
        assert!(matches!(
            render.next_frame(Some(Duration::from_millis(10))),
            Received::TimedOut
        ));
    }

    #[test]
    fn test_dropping_acquisition_closes_render() {
        let (acquisition, render) = frame_handoff(frame());
        drop(acquisition);
        assert!(matches!(render.next_frame(None), Received::Closed));
    }

    #[test]
    fn test_dropping_render_closes_acquisition() {
        let (acquisition, render) = frame_handoff(frame());
        let slot = acquisition.acquire().unwrap();
        drop(render);
        assert!(matches!(acquisition.publish(slot), Err(PipelineError::HandoffClosed)));
    }

    #[test]
    fn test_order_is_preserved_across_threads() {
        const FRAMES: u64 = 200;
        let (acquisition, render) = frame_handoff(frame());

        let producer = thread::spawn(move || {
            for sequence in 0..FRAMES {
                let mut slot = acquisition.acquire().unwrap();
                slot.sequence = sequence;
                acquisition.publish(slot).unwrap();
            }
        });

        let mut seen = Vec::new();
        while let Received::Frame(frame) = render.next_frame(None) {
            seen.push(frame.sequence);
            // Acquisition may already be gone after the last frame.
            let _ = render.release(*frame);
        }
        producer.join().unwrap();

        assert_eq!(seen, (0..FRAMES).collect::<Vec<_>>());
    }
}
