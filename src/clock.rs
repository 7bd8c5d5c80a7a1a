use std::time::Duration;

/// Simulation time driven by wall-clock deltas.
pub struct PlaybackClock {
    time: f64,
    speed: f64,
}

impl PlaybackClock {
    /// `speed` is simulation seconds per wall second and must be positive.
    pub fn new(start: f64, speed: f64) -> Self {
        Self { time: start, speed }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn advance(&mut self, wall: Duration) -> f64 {
        self.time += wall.as_secs_f64() * self.speed;
        self.time
    }
}
