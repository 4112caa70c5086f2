use std::collections::VecDeque;

/// Frames averaged by the performance overlay.
pub const ROLLING_WINDOW: usize = 60;

/// Rolling frame-time average backing the FPS / frame-time overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTimeWindow {
    samples_ms: VecDeque<f64>,
    window: usize,
    sum_ms: f64,
}

/// Snapshot shown to the user.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    pub fps: u32,
    /// Average frame time, rounded to 0.1 ms.
    pub frame_ms: f64,
    pub samples: usize,
}

impl Default for FrameTimeWindow {
    fn default() -> Self {
        Self::new(ROLLING_WINDOW)
    }
}

impl FrameTimeWindow {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples_ms: VecDeque::with_capacity(window),
            window,
            sum_ms: 0.0,
        }
    }

    /// Record one frame duration. Non-finite or non-positive samples are ignored.
    pub fn record(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.samples_ms.push_back(dt_ms);
        self.sum_ms += dt_ms;
        if self.samples_ms.len() > self.window
            && let Some(old) = self.samples_ms.pop_front()
        {
            self.sum_ms -= old;
        }
    }

    pub fn clear(&mut self) {
        self.samples_ms.clear();
        self.sum_ms = 0.0;
    }

    pub fn len(&self) -> usize {
        self.samples_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples_ms.is_empty()
    }

    pub fn stats(&self) -> Option<FrameStats> {
        if self.samples_ms.is_empty() {
            return None;
        }
        let avg = self.sum_ms / self.samples_ms.len() as f64;
        Some(FrameStats {
            fps: (1000.0 / avg).round() as u32,
            frame_ms: (avg * 10.0).round() / 10.0,
            samples: self.samples_ms.len(),
        })
    }
}
