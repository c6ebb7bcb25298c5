use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub name: &'static str,
    pub duration: Duration,
}

/// Per-stage durations of one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleTimings {
    stages: Vec<StageTiming>,
}

impl CycleTimings {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_stage(&mut self, name: &'static str, duration: Duration) {
        self.stages.push(StageTiming { name, duration });
    }

    pub fn record(&mut self, timer: Timer) {
        let (name, duration) = timer.stop();
        self.add_stage(name, duration);
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn get_stage(&self, name: &str) -> Option<Duration> {
        self.stages.iter().find(|s| s.name == name).map(|s| s.duration)
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }
}

/// Running totals across cycles, logged when the loop stops
#[derive(Debug, Default)]
pub struct TimingSummary {
    order: Vec<&'static str>,
    totals: HashMap<&'static str, (Duration, u32)>,
}

impl TimingSummary {
    pub fn add(&mut self, timings: &CycleTimings) {
        for stage in timings.stages() {
            self.add_stage(stage.name, stage.duration);
        }
    }

    pub fn add_stage(&mut self, name: &'static str, duration: Duration) {
        let entry = self.totals.entry(name).or_insert_with(|| {
            self.order.push(name);
            (Duration::ZERO, 0)
        });
        entry.0 += duration;
        entry.1 += 1;
    }

    pub fn mean(&self, name: &str) -> Option<Duration> {
        self.totals
            .get(name)
            .filter(|(_, count)| *count > 0)
            .map(|(total, count)| *total / *count)
    }

    pub fn log(&self) {
        for name in &self.order {
            if let Some((total, count)) = self.totals.get(name) {
                info!(
                    stage = *name,
                    samples = *count,
                    mean_ms = (*total / (*count).max(1)).as_secs_f64() * 1000.0,
                    "Stage timing"
                );
            }
        }
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
