use indicatif::HumanDuration;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StatsTimer {
    start_time: Instant,
    duration: Option<Duration>,
}

impl Default for StatsTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTimer {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            duration: None,
        }
    }

    pub fn finish(&mut self) {
        self.duration = Some(self.start_time.elapsed());
    }

    /// Elapsed time, frozen once `finish` has been called.
    pub fn get_duration(&self) -> Duration {
        self.duration.unwrap_or_else(|| self.start_time.elapsed())
    }

    pub fn get_duration_secs(&self) -> f64 {
        self.get_duration().as_secs_f64()
    }

    pub fn get_duration_human(&self) -> String {
        HumanDuration(self.get_duration()).to_string()
    }
}
