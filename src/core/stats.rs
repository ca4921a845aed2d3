//! Frame statistics for periodic debug logging

/// Rolling FPS over the last 60 frames
#[derive(Debug)]
pub struct FpsCounter {
    frames: Vec<f64>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(61),
        }
    }

    pub fn tick(&mut self, now_ms: f64) {
        self.frames.push(now_ms);
        if self.frames.len() > 60 {
            self.frames.remove(0);
        }
    }

    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) else {
            return 0.0;
        };
        let elapsed = last - first;
        if self.frames.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (self.frames.len() as f64 - 1.0) / (elapsed / 1000.0)
    }
}

/// Snapshot of renderer state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub fps: f64,
    pub points: usize,
    pub lines: usize,
    pub markers: usize,
    pub line_vertices: usize,
    pub frames: u64,
    pub skipped_frames: u64,
}
