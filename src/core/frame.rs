/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the loop started
    pub time: f32,
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Rolling frame-rate counter, reported once per interval
#[derive(Debug, Clone)]
pub struct FrameStats {
    interval: f32,
    frames: u32,
    elapsed: f32,
    fps: f32,
}

impl FrameStats {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            frames: 0,
            elapsed: 0.0,
            fps: 0.0,
        }
    }

    /// Record one frame; returns the new rate when an interval completes
    pub fn record(&mut self, delta: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += delta;

        if self.elapsed >= self.interval && self.elapsed > 0.0 {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
            Some(self.fps)
        } else {
            None
        }
    }

    /// Last reported frames per second
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(1.0)
    }
}
