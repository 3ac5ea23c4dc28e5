use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a frame is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Format conversion followed by the geometric transforms
    Normal,
    /// Temperature-band silhouette rendered from the temperature plane
    Segmentation,
}

/// Shared runtime toggle between normal and segmentation rendering.
///
/// Clones share the same flag. The pipeline samples it once at the start
/// of each frame, so a flip only takes effect on the next frame.
#[derive(Debug, Clone, Default)]
pub struct ModeSwitch {
    segmentation: Arc<AtomicBool>,
}

impl ModeSwitch {
    pub fn new(mode: FrameMode) -> Self {
        Self {
            segmentation: Arc::new(AtomicBool::new(mode == FrameMode::Segmentation)),
        }
    }

    pub fn current(&self) -> FrameMode {
        if self.segmentation.load(Ordering::Acquire) {
            FrameMode::Segmentation
        } else {
            FrameMode::Normal
        }
    }

    pub fn set(&self, mode: FrameMode) {
        self.segmentation
            .store(mode == FrameMode::Segmentation, Ordering::Release);
    }

    /// Flips the mode and returns the new one.
    pub fn toggle(&self) -> FrameMode {
        if self.segmentation.fetch_xor(true, Ordering::AcqRel) {
            FrameMode::Normal
        } else {
            FrameMode::Segmentation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let switch = ModeSwitch::new(FrameMode::Normal);
        let remote = switch.clone();

        assert_eq!(remote.toggle(), FrameMode::Segmentation);
        assert_eq!(switch.current(), FrameMode::Segmentation);
        assert_eq!(switch.toggle(), FrameMode::Normal);
        assert_eq!(remote.current(), FrameMode::Normal);

        remote.set(FrameMode::Segmentation);
        assert_eq!(switch.current(), FrameMode::Segmentation);
    }

    #[test]
    fn test_toggle_from_other_thread() {
        let switch = ModeSwitch::default();
        let remote = switch.clone();
        std::thread::spawn(move || {
            remote.toggle();
        })
        .join()
        .unwrap();
        assert_eq!(switch.current(), FrameMode::Segmentation);
    }
}
